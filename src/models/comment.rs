// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Comment models for posts and profiles.

use serde::{Deserialize, Serialize};

use super::Timestamped;

/// Comment on a post, stored under `postComments/{postId}/{id}`.
///
/// Post comments never expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostComment {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub timestamp: i64,
}

/// Comment left on a user's profile, stored under `profileComments/{uid}/{id}`.
///
/// Subject to the 24 hour expiry sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileComment {
    pub id: String,
    pub text: String,
    pub username: String,
    pub timestamp: i64,
}

impl Timestamped for PostComment {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp_ms(&self) -> i64 {
        self.timestamp
    }
}

impl Timestamped for ProfileComment {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp_ms(&self) -> i64 {
        self.timestamp
    }
}
