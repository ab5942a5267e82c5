// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Comments on a single post, kept live while the screen is open.

use super::{apply_change, report, ScreenScope};
use crate::db::{paths, Subscription};
use crate::error::{AppError, Result};
use crate::models::{Post, PostComment};
use crate::services::identity::{require_identity, Identity};
use crate::AppContext;
use std::sync::Arc;

/// Longest comment accepted.
const MAX_COMMENT_CHARS: usize = 500;

pub struct CommentsScreen {
    ctx: Arc<AppContext>,
    scope: ScreenScope,
    post_id: String,
    pub post: Option<Post>,
    /// Oldest first
    pub comments: Vec<PostComment>,
    pub draft: String,
    pub notice: Option<String>,
    subscription: Option<Subscription>,
}

impl CommentsScreen {
    pub fn new(ctx: Arc<AppContext>, post_id: &str) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            post_id: post_id.to_string(),
            post: None,
            comments: Vec::new(),
            draft: String::new(),
            notice: None,
            subscription: None,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    /// Load the post and its comments, then subscribe to new ones.
    pub async fn mount(&mut self) -> Result<()> {
        match self.load().await {
            Ok((post, comments, subscription)) => {
                self.post = Some(post);
                self.comments = comments;
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    async fn load(&self) -> Result<(Post, Vec<PostComment>, Subscription)> {
        let post = self
            .scope
            .run(self.ctx.records.get_post(&self.post_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {}", self.post_id)))?;
        let comments = self
            .scope
            .run(self.ctx.records.post_comments(&self.post_id))
            .await?;
        let subscription = self
            .scope
            .run(self.ctx.records.subscribe(&paths::post_comments(&self.post_id)))
            .await?;
        Ok((post, comments, subscription))
    }

    /// Apply queued live changes.
    pub async fn refresh(&mut self) -> Result<()> {
        let parent = paths::post_comments(&self.post_id);
        let mut reload = false;
        if let Some(subscription) = self.subscription.as_mut() {
            while let Some(change) = subscription.try_next() {
                reload |= !apply_change(&mut self.comments, &parent, change);
            }
        }
        if reload {
            match self
                .scope
                .run(self.ctx.records.post_comments(&self.post_id))
                .await
            {
                Ok(comments) => self.comments = comments,
                Err(e) => return Err(report(&mut self.notice, e)),
            }
        }
        self.comments
            .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(())
    }

    /// Post the current draft.
    pub async fn submit(&mut self) -> Result<PostComment> {
        match self.write_comment().await {
            Ok(comment) => {
                self.comments.retain(|c| c.id != comment.id);
                self.comments.push(comment.clone());
                self.draft.clear();
                self.notice = None;
                Ok(comment)
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    async fn write_comment(&self) -> Result<PostComment> {
        let text = self.draft.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment can't be empty.".to_string()));
        }
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::Validation("Comment is too long.".to_string()));
        }

        let me = require_identity(self.ctx.identity.as_ref())?;
        let user_name = self.author_name(&me).await?;
        let comment = PostComment {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: me.id.clone(),
            user_name,
            text: text.to_string(),
            timestamp: self.ctx.now().timestamp_millis(),
        };
        self.scope
            .run(self.ctx.records.add_post_comment(&self.post_id, &comment))
            .await?;
        tracing::info!(post_id = %self.post_id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }

    async fn author_name(&self, me: &Identity) -> Result<String> {
        let user = self.scope.run(self.ctx.records.get_user(&me.id)).await?;
        Ok(user
            .map(|u| u.username)
            .filter(|name| !name.is_empty())
            .or_else(|| me.display_name.clone())
            .unwrap_or_else(|| me.email.clone()))
    }

    pub fn unmount(&mut self) {
        self.scope.unmount();
        self.subscription = None;
    }
}
