// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! 24 hour content expiry.
//!
//! Handles:
//! - The age predicate shared by posts and profile comments
//! - Purging a post (blob + record) with a pending-purge queue for blob
//!   deletions that fail
//! - Purging profile comments (record only)
//! - A periodic `Sweeper` bound to the lifetime of an open screen

use crate::config::CONTENT_TTL_MS;
use crate::db::Records;
use crate::error::{AppError, Result};
use crate::models::{PendingPurge, Post, Timestamped};
use crate::services::blob::BlobStore;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Whether content created at `timestamp_ms` is old enough to purge at `now`.
///
/// Strictly older than 24 hours; an item exactly 24 hours old survives.
pub fn is_expired(timestamp_ms: i64, now: DateTime<Utc>) -> bool {
    now.timestamp_millis().saturating_sub(timestamp_ms) > CONTENT_TTL_MS
}

/// Ids of the items in `items` that are expired at `now`.
pub fn select_expired<'a, T: Timestamped + 'a>(
    items: impl IntoIterator<Item = &'a T>,
    now: DateTime<Utc>,
) -> Vec<String> {
    items
        .into_iter()
        .filter(|item| is_expired(item.timestamp_ms(), now))
        .map(|item| item.id().to_string())
        .collect()
}

/// Result of purging one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// Every part of the item is gone.
    Purged,
    /// Some part survived; a later sweep will retry.
    Partial {
        record_removed: bool,
        blob_removed: bool,
    },
}

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Ids fully purged
    pub purged: Vec<String>,
    /// Ids left partially purged
    pub partial: Vec<String>,
    /// Queued blob deletions completed during this sweep
    pub drained: u32,
    /// Authors whose posts could not be read; retried next sweep
    pub skipped: Vec<String>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.partial.is_empty() && self.skipped.is_empty()
    }
}

/// Expiry policy over the record and blob stores.
#[derive(Clone)]
pub struct ExpiryPolicy {
    records: Records,
    blobs: Arc<dyn BlobStore>,
}

impl ExpiryPolicy {
    pub fn new(records: Records, blobs: Arc<dyn BlobStore>) -> Self {
        Self { records, blobs }
    }

    /// Purge one post: its photo first, then its record.
    ///
    /// Both deletions are always attempted. When the photo cannot be deleted
    /// a pending-purge entry is queued so a later sweep can retry it; if that
    /// queue write fails too, the blob path is logged at error level.
    pub async fn purge_post(&self, post: &Post, now: DateTime<Utc>) -> PurgeOutcome {
        let blob_removed = match self.blobs.delete(&post.image_path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(post_id = %post.id, path = %post.image_path, error = %e, "Blob delete failed");
                false
            }
        };

        if !blob_removed {
            let purge = PendingPurge {
                post_id: post.id.clone(),
                image_path: post.image_path.clone(),
                queued_at: now.timestamp_millis(),
            };
            if let Err(e) = self.records.queue_purge(&purge).await {
                tracing::error!(
                    post_id = %post.id,
                    path = %post.image_path,
                    error = %e,
                    "Could not queue blob purge; blob is orphaned"
                );
            }
        }

        let record_removed = match self.records.remove_post(&post.id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(post_id = %post.id, error = %e, "Post record delete failed");
                false
            }
        };

        if record_removed && blob_removed {
            tracing::info!(post_id = %post.id, "Expired post purged");
            PurgeOutcome::Purged
        } else {
            PurgeOutcome::Partial {
                record_removed,
                blob_removed,
            }
        }
    }

    /// Purge a profile comment (record only).
    pub async fn purge_profile_comment(&self, uid: &str, comment_id: &str) -> PurgeOutcome {
        match self.records.remove_profile_comment(uid, comment_id).await {
            Ok(()) => {
                tracing::info!(uid, comment_id, "Expired profile comment purged");
                PurgeOutcome::Purged
            }
            Err(e) => {
                tracing::warn!(uid, comment_id, error = %e, "Profile comment delete failed");
                PurgeOutcome::Partial {
                    record_removed: false,
                    blob_removed: true,
                }
            }
        }
    }

    /// Retry queued blob deletions. Returns how many completed.
    pub async fn drain_pending_purges(&self) -> Result<u32> {
        let mut drained = 0;
        for purge in self.records.pending_purges().await? {
            if let Err(e) = self.blobs.delete(&purge.image_path).await {
                tracing::warn!(post_id = %purge.post_id, error = %e, "Queued blob purge failed again");
                continue;
            }
            match self.records.clear_purge(&purge.post_id).await {
                Ok(()) => drained += 1,
                Err(e) => {
                    tracing::warn!(post_id = %purge.post_id, error = %e, "Could not clear purge entry")
                }
            }
        }
        Ok(drained)
    }

    /// Purge every expired post by any of `authors`.
    ///
    /// A failed queue drain or a failed read for one author is logged and
    /// does not stop the rest of the sweep.
    pub async fn sweep_posts(&self, authors: &[String], now: DateTime<Utc>) -> Result<SweepReport> {
        let drained = match self.drain_pending_purges().await {
            Ok(drained) => drained,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read pending purges");
                0
            }
        };
        let mut report = SweepReport {
            drained,
            ..SweepReport::default()
        };

        for uid in authors {
            let posts = match self.records.posts_by_user(uid).await {
                Ok(posts) => posts,
                Err(e) => {
                    tracing::warn!(uid = %uid, error = %e, "Could not read posts for sweep");
                    report.skipped.push(uid.clone());
                    continue;
                }
            };
            for post in posts.iter().filter(|p| is_expired(p.timestamp, now)) {
                match self.purge_post(post, now).await {
                    PurgeOutcome::Purged => report.purged.push(post.id.clone()),
                    PurgeOutcome::Partial { .. } => report.partial.push(post.id.clone()),
                }
            }
        }

        if !report.is_clean() {
            tracing::warn!(
                partial = ?report.partial,
                skipped = ?report.skipped,
                "Post sweep left work for the next run"
            );
        }
        Ok(report)
    }

    /// Purge every expired comment on `uid`'s profile.
    pub async fn sweep_profile_comments(&self, uid: &str, now: DateTime<Utc>) -> Result<SweepReport> {
        let comments = self.records.profile_comments(uid).await?;
        let mut report = SweepReport::default();
        for id in select_expired(&comments, now) {
            match self.purge_profile_comment(uid, &id).await {
                PurgeOutcome::Purged => report.purged.push(id),
                PurgeOutcome::Partial { .. } => report.partial.push(id),
            }
        }
        Ok(report)
    }
}

/// Periodic sweep bound to a cancellation token.
pub struct Sweeper {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

impl Sweeper {
    /// Run `job` now and then every `interval` until `token` is cancelled.
    ///
    /// Each successful report is sent on `reports`; failures are logged and
    /// the next tick tries again.
    pub fn spawn<F, Fut>(
        interval: Duration,
        token: CancellationToken,
        reports: mpsc::UnboundedSender<SweepReport>,
        mut job: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<SweepReport>> + Send + 'static,
    {
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let result = tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    result = job() => result,
                };
                match result {
                    Ok(report) => {
                        if reports.send(report).is_err() {
                            break;
                        }
                    }
                    Err(AppError::Cancelled) => break,
                    Err(e) => tracing::warn!(error = %e, "Expiry sweep failed"),
                }
            }
            tracing::debug!("Sweeper stopped");
        });
        Self { handle, token }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
