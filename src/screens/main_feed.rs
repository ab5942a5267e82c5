// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Main feed screen.
//!
//! Handles:
//! - Loading the user's and their friends' posts, newest first
//! - The once-per-day posting gate
//! - Creating a post (gate, pick photo, upload, resolve URL, write record)
//! - A periodic sweep purging expired posts by the feed's authors

use super::{report, ScreenScope};
use crate::error::{AppError, Result};
use crate::models::Post;
use crate::services::blob::{content_type_for, post_image_path};
use crate::services::expiry::{is_expired, SweepReport, Sweeper};
use crate::services::identity::require_identity;
use crate::services::picker::pick_photo;
use crate::db::Records;
use crate::AppContext;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct MainFeedScreen {
    ctx: Arc<AppContext>,
    scope: ScreenScope,
    uid: Option<String>,
    /// The user followed by their friends
    pub authors: Vec<String>,
    /// Newest first
    pub posts: Vec<Post>,
    /// Whether the create control is offered. `false` until checked.
    pub can_post: bool,
    pub notice: Option<String>,
    sweeper: Option<Sweeper>,
    sweep_reports: Option<mpsc::UnboundedReceiver<SweepReport>>,
}

impl MainFeedScreen {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            uid: None,
            authors: Vec::new(),
            posts: Vec::new(),
            can_post: false,
            notice: None,
            sweeper: None,
            sweep_reports: None,
        }
    }

    /// Load the feed and start the expiry sweep.
    pub async fn mount(&mut self) -> Result<()> {
        let me = match require_identity(self.ctx.identity.as_ref()) {
            Ok(me) => me,
            Err(e) => return Err(report(&mut self.notice, e)),
        };
        self.uid = Some(me.id.clone());
        self.refresh().await?;
        self.start_sweeper();
        Ok(())
    }

    /// Reload authors, posts and the posting gate.
    pub async fn refresh(&mut self) -> Result<()> {
        let Some(uid) = self.uid.clone() else {
            return Ok(());
        };

        match self.load_feed(&uid).await {
            Ok((authors, posts)) => {
                self.authors = authors;
                self.posts = posts;
            }
            Err(e) => return Err(report(&mut self.notice, e)),
        }
        self.check_can_post().await;
        Ok(())
    }

    async fn load_feed(&self, uid: &str) -> Result<(Vec<String>, Vec<Post>)> {
        let authors = self.scope.run(feed_authors(&self.ctx.records, uid)).await?;

        let now = self.ctx.now();
        let mut posts = Vec::new();
        for author in &authors {
            let theirs = self.scope.run(self.ctx.records.posts_by_user(author)).await?;
            posts.extend(theirs.into_iter().filter(|p| !is_expired(p.timestamp, now)));
        }
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
        Ok((authors, posts))
    }

    /// Re-evaluate the posting gate. A failed check denies posting.
    pub async fn check_can_post(&mut self) -> bool {
        let Some(uid) = self.uid.clone() else {
            self.can_post = false;
            return false;
        };
        let policy = self.ctx.posting_limit();
        let result = self
            .scope
            .run(policy.can_post(&self.ctx.records, &uid, self.ctx.now()))
            .await;
        self.can_post = match result {
            Ok(allowed) => allowed,
            Err(e) => {
                report(&mut self.notice, e);
                false
            }
        };
        self.can_post
    }

    /// Create today's post with `caption`.
    ///
    /// Returns `None` if the user cancelled the picker.
    pub async fn create_post(&mut self, caption: &str) -> Result<Option<Post>> {
        let Some(uid) = self.uid.clone() else {
            return Err(report(
                &mut self.notice,
                AppError::Auth(crate::error::AuthError::NotSignedIn),
            ));
        };

        match self.publish(&uid, caption.trim()).await {
            Ok(Some(post)) => {
                self.posts.insert(0, post.clone());
                self.can_post = false;
                self.notice = None;
                Ok(Some(post))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                if matches!(e, AppError::AlreadyPostedToday) {
                    self.can_post = false;
                }
                Err(report(&mut self.notice, e))
            }
        }
    }

    async fn publish(&self, uid: &str, caption: &str) -> Result<Option<Post>> {
        let policy = self.ctx.posting_limit();
        self.scope
            .run(policy.ensure_can_post(&self.ctx.records, uid, self.ctx.now()))
            .await?;

        let picked = self.scope.run(pick_photo(self.ctx.picker.as_ref())).await?;
        let Some((photo, bytes)) = picked else {
            return Ok(None);
        };

        let post_id = uuid::Uuid::new_v4().to_string();
        let image_path = post_image_path(uid, &post_id);
        self.scope
            .run(
                self.ctx
                    .blobs
                    .upload(&image_path, bytes, content_type_for(&photo.uri)),
            )
            .await?;

        let post = match self.scope.run(self.ctx.blobs.resolve_url(&image_path)).await {
            Ok(image_url) => Post {
                id: post_id,
                user_id: uid.to_string(),
                caption: caption.to_string(),
                image_path: image_path.clone(),
                image_url,
                timestamp: self.ctx.now().timestamp_millis(),
            },
            Err(e) => {
                self.discard_upload(&image_path).await;
                return Err(e);
            }
        };

        if let Err(e) = self.scope.run(self.ctx.records.create_post(&post)).await {
            self.discard_upload(&image_path).await;
            return Err(e);
        }

        tracing::info!(uid, post_id = %post.id, "Post created");
        Ok(Some(post))
    }

    /// Remove a photo whose post record was never written.
    async fn discard_upload(&self, image_path: &str) {
        if let Err(e) = self.ctx.blobs.delete(image_path).await {
            tracing::warn!(path = image_path, error = %e, "Could not discard orphaned upload");
        }
    }

    /// Sweep on an interval. Authors are re-read every run so friends added
    /// while the feed is open are covered; if that read fails the last known
    /// authors are swept.
    fn start_sweeper(&mut self) {
        let Some(uid) = self.uid.clone() else {
            return;
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = self.ctx.clone();
        let known = Arc::new(Mutex::new(self.authors.clone()));
        let sweeper = Sweeper::spawn(
            self.ctx.config.sweep_interval,
            self.scope.child_token(),
            tx,
            move || {
                let ctx = ctx.clone();
                let uid = uid.clone();
                let known = known.clone();
                async move {
                    let authors = match feed_authors(&ctx.records, &uid).await {
                        Ok(authors) => {
                            *known.lock() = authors.clone();
                            authors
                        }
                        Err(e) => {
                            tracing::warn!(uid = %uid, error = %e, "Could not reload feed authors");
                            known.lock().clone()
                        }
                    };
                    ctx.expiry().sweep_posts(&authors, ctx.now()).await
                }
            },
        );
        self.sweeper = Some(sweeper);
        self.sweep_reports = Some(rx);
    }

    /// Apply finished sweeps to the view. Returns how many arrived.
    pub async fn apply_sweeps(&mut self) -> usize {
        let mut sweeps = Vec::new();
        if let Some(reports) = self.sweep_reports.as_mut() {
            while let Ok(sweep) = reports.try_recv() {
                sweeps.push(sweep);
            }
        }
        let mut purged_any = false;
        for sweep in &sweeps {
            purged_any |= self.drop_purged(sweep);
        }
        if purged_any {
            self.check_can_post().await;
        }
        sweeps.len()
    }

    /// Wait for the next sweep and apply it.
    pub async fn wait_for_sweep(&mut self) -> Option<SweepReport> {
        let sweep = self.sweep_reports.as_mut()?.recv().await?;
        if self.drop_purged(&sweep) {
            self.check_can_post().await;
        }
        Some(sweep)
    }

    /// Remove purged and expired posts. True if the sweep purged anything,
    /// which may re-open the posting gate.
    fn drop_purged(&mut self, sweep: &SweepReport) -> bool {
        let now = self.ctx.now();
        self.posts
            .retain(|p| !sweep.purged.contains(&p.id) && !is_expired(p.timestamp, now));
        !sweep.purged.is_empty()
    }

    pub fn unmount(&mut self) {
        self.scope.unmount();
        self.sweeper = None;
    }
}

/// The user followed by their friends.
async fn feed_authors(records: &Records, uid: &str) -> Result<Vec<String>> {
    let user = records.require_user(uid).await?;
    let mut authors = vec![uid.to_string()];
    authors.extend(user.friend_ids().map(str::to_string));
    Ok(authors)
}
