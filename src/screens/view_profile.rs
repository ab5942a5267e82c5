// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Another user's profile: details, relationship, and profile comments.

use super::{report, ScreenScope};
use crate::error::{AppError, Result};
use crate::models::{ProfileComment, User};
use crate::services::expiry::is_expired;
use crate::services::friends::FriendState;
use crate::services::identity::require_identity;
use crate::AppContext;
use std::sync::Arc;

const MAX_COMMENT_CHARS: usize = 500;

pub struct ViewProfileScreen {
    ctx: Arc<AppContext>,
    scope: ScreenScope,
    target: String,
    me: Option<User>,
    pub user: Option<User>,
    pub relationship: FriendState,
    /// Newest first, expired ones hidden
    pub comments: Vec<ProfileComment>,
    pub draft: String,
    pub notice: Option<String>,
}

impl ViewProfileScreen {
    pub fn new(ctx: Arc<AppContext>, uid: &str) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            target: uid.to_string(),
            me: None,
            user: None,
            relationship: FriendState::None,
            comments: Vec::new(),
            draft: String::new(),
            notice: None,
        }
    }

    pub async fn mount(&mut self) -> Result<()> {
        match self.load().await {
            Ok((me, user, relationship, comments)) => {
                self.me = Some(me);
                self.user = Some(user);
                self.relationship = relationship;
                self.comments = comments;
                Ok(())
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    async fn load(&self) -> Result<(User, User, FriendState, Vec<ProfileComment>)> {
        let identity = require_identity(self.ctx.identity.as_ref())?;
        let records = &self.ctx.records;
        let me = self.scope.run(records.require_user(&identity.id)).await?;
        let user = self.scope.run(records.require_user(&self.target)).await?;

        let friends = self.ctx.friends();
        let relationship = self
            .scope
            .run(friends.relationship(&identity.id, &self.target))
            .await?;

        let now = self.ctx.now();
        let comments = self
            .scope
            .run(records.profile_comments(&self.target))
            .await?
            .into_iter()
            .filter(|c| !is_expired(c.timestamp, now))
            .collect();
        Ok((me, user, relationship, comments))
    }

    /// Leave the current draft as a comment on this profile.
    pub async fn leave_comment(&mut self) -> Result<ProfileComment> {
        match self.write_comment().await {
            Ok(comment) => {
                self.comments.insert(0, comment.clone());
                self.draft.clear();
                self.notice = None;
                Ok(comment)
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    async fn write_comment(&self) -> Result<ProfileComment> {
        let text = self.draft.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment can't be empty.".to_string()));
        }
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::Validation("Comment is too long.".to_string()));
        }
        let Some(me) = &self.me else {
            return Err(AppError::Validation("Profile not loaded.".to_string()));
        };

        let comment = ProfileComment {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            username: me.username.clone(),
            timestamp: self.ctx.now().timestamp_millis(),
        };
        self.scope
            .run(self.ctx.records.add_profile_comment(&self.target, &comment))
            .await?;
        tracing::info!(target_uid = %self.target, comment_id = %comment.id, "Profile comment added");
        Ok(comment)
    }

    /// Send a friend request, or accept theirs if they already asked.
    pub async fn send_friend_request(&mut self) -> Result<()> {
        if self.relationship == FriendState::RequestedByOther {
            return self.accept_friend_request().await;
        }
        let Some(me) = self.me.as_ref().map(|u| u.uid.clone()) else {
            return Ok(());
        };
        let friends = self.ctx.friends();
        match self.scope.run(friends.send_request(&me, &self.target)).await {
            Ok(()) => {
                self.relationship = FriendState::Requested;
                self.notice = Some("Friend request sent!".to_string());
                Ok(())
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    /// Accept the pending request this user sent.
    pub async fn accept_friend_request(&mut self) -> Result<()> {
        let Some(me) = self.me.as_ref().map(|u| u.uid.clone()) else {
            return Ok(());
        };
        let friends = self.ctx.friends();
        match self.scope.run(friends.accept_request(&me, &self.target)).await {
            Ok(()) => {
                self.relationship = FriendState::Accepted;
                self.notice = Some("Friend request accepted!".to_string());
                Ok(())
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    pub fn unmount(&mut self) {
        self.scope.unmount();
    }
}
