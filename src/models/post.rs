// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal post model stored under `posts/{postId}`.

use serde::{Deserialize, Serialize};

use super::Timestamped;

/// A meal photo post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Generated post id (also the record key)
    pub id: String,
    /// Author identity id
    pub user_id: String,
    /// Caption / meal description
    #[serde(default)]
    pub caption: String,
    /// Blob path of the photo, needed to delete it
    pub image_path: String,
    /// Resolved download URL of the photo
    pub image_url: String,
    /// Creation instant (epoch ms, client clock)
    pub timestamp: i64,
}

impl Timestamped for Post {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp_ms(&self) -> i64 {
        self.timestamp
    }
}

/// Queued blob deletion left behind by a partially purged post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPurge {
    pub post_id: String,
    pub image_path: String,
    /// When the purge was first attempted (epoch ms)
    pub queued_at: i64,
}
