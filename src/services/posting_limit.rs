// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Once-per-day posting gate.
//!
//! A user may create a post only if none of their posts has a timestamp in
//! the current posting day `[midnight, midnight + 24h)`, where midnight is
//! taken in the configured fixed offset.

use crate::db::Records;
use crate::error::{AppError, Result};
use crate::models::Post;
use crate::time_utils::{day_window, from_millis};
use chrono::{DateTime, FixedOffset, Utc};

/// Posting-limit policy for one day-boundary offset.
#[derive(Debug, Clone, Copy)]
pub struct PostingLimitPolicy {
    day_boundary: FixedOffset,
}

impl PostingLimitPolicy {
    pub fn new(day_boundary: FixedOffset) -> Self {
        Self { day_boundary }
    }

    pub fn day_boundary(&self) -> FixedOffset {
        self.day_boundary
    }

    /// The posting day containing `now`.
    pub fn day_window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        day_window(now, self.day_boundary)
    }

    /// Whether any of `posts` falls inside the posting day containing `now`.
    pub fn posted_today<'a>(
        &self,
        posts: impl IntoIterator<Item = &'a Post>,
        now: DateTime<Utc>,
    ) -> bool {
        let (start, end) = self.day_window(now);
        posts.into_iter().any(|post| {
            let at = from_millis(post.timestamp);
            at >= start && at < end
        })
    }

    /// Whether `uid` may create a post at `now`.
    ///
    /// Fails closed: if the user's posts cannot be read the error is returned
    /// and the caller must not offer the create control.
    pub async fn can_post(&self, records: &Records, uid: &str, now: DateTime<Utc>) -> Result<bool> {
        let posts = records.posts_by_user(uid).await.map_err(|e| {
            tracing::warn!(uid, error = %e, "Posting limit check failed; denying");
            e
        })?;
        let allowed = !self.posted_today(&posts, now);
        tracing::debug!(uid, allowed, "Posting limit evaluated");
        Ok(allowed)
    }

    /// Like `can_post`, but refusal is `AppError::AlreadyPostedToday`.
    pub async fn ensure_can_post(
        &self,
        records: &Records,
        uid: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.can_post(records, uid, now).await? {
            Ok(())
        } else {
            Err(AppError::AlreadyPostedToday)
        }
    }
}
