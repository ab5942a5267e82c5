// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record store layer.
//!
//! The hosted realtime database is a JSON tree addressed by slash-separated
//! paths. `RecordStore` is the seam every policy and screen talks to;
//! `RealtimeDbStore` is the REST client and `MemoryRecordStore` the
//! in-process implementation used by tests and offline runs.

pub mod memory;
pub mod realtime;
pub mod records;

pub use memory::{MemoryRecordStore, StoreOp};
pub use realtime::RealtimeDbStore;
pub use records::Records;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Record path builders, one per collection.
pub mod paths {
    pub const USERS: &str = "users";
    pub const POSTS: &str = "posts";
    pub const POST_COMMENTS: &str = "postComments";
    pub const PROFILE_COMMENTS: &str = "profileComments";
    /// Blob deletions still owed by partially purged posts
    pub const PENDING_PURGES: &str = "pendingPurges";

    pub fn user(uid: &str) -> String {
        format!("{USERS}/{uid}")
    }

    pub fn friend_edge(uid: &str, friend_id: &str) -> String {
        format!("{USERS}/{uid}/friends/{friend_id}")
    }

    pub fn friend_request(target: &str, requester: &str) -> String {
        format!("{USERS}/{target}/friendRequests/{requester}")
    }

    pub fn post(post_id: &str) -> String {
        format!("{POSTS}/{post_id}")
    }

    pub fn post_comments(post_id: &str) -> String {
        format!("{POST_COMMENTS}/{post_id}")
    }

    pub fn post_comment(post_id: &str, comment_id: &str) -> String {
        format!("{POST_COMMENTS}/{post_id}/{comment_id}")
    }

    pub fn profile_comments(uid: &str) -> String {
        format!("{PROFILE_COMMENTS}/{uid}")
    }

    pub fn profile_comment(uid: &str, comment_id: &str) -> String {
        format!("{PROFILE_COMMENTS}/{uid}/{comment_id}")
    }

    pub fn pending_purge(post_id: &str) -> String {
        format!("{PENDING_PURGES}/{post_id}")
    }

    /// Split a path into its non-empty segments.
    pub fn segments(path: &str) -> Vec<&str> {
        path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// True when one path is an ancestor of (or equal to) the other.
    pub fn related(a: &str, b: &str) -> bool {
        let a = segments(a);
        let b = segments(b);
        let n = a.len().min(b.len());
        a[..n] == b[..n]
    }

    /// Join a base path and a relative path.
    pub fn join(base: &str, rel: &str) -> String {
        let mut segs = segments(base);
        segs.extend(segments(rel));
        segs.join("/")
    }
}

/// A change observed under a subscribed path.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordChange {
    /// Absolute path of the changed node
    pub path: String,
    /// New value, `None` when the node was removed
    pub data: Option<Value>,
}

/// Live subscription handle. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    rx: mpsc::UnboundedReceiver<RecordChange>,
    token: CancellationToken,
}

impl Subscription {
    pub fn new(
        path: impl Into<String>,
        rx: mpsc::UnboundedReceiver<RecordChange>,
        token: CancellationToken,
    ) -> Self {
        Self {
            path: path.into(),
            rx,
            token,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the next change. `None` once the source has closed.
    pub async fn next(&mut self) -> Option<RecordChange> {
        self.rx.recv().await
    }

    /// Take a change if one is already queued.
    pub fn try_next(&mut self) -> Option<RecordChange> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving changes.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Key-addressed remote JSON store.
///
/// All operations may fail with a transient network error (`AppError::Database`)
/// or `AppError::PermissionDenied`. Removing an absent path succeeds.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point read; `None` when nothing is stored at `path`.
    async fn read(&self, path: &str) -> Result<Option<Value>>;

    /// Point write, replacing whatever is stored at `path`.
    async fn write(&self, path: &str, value: &Value) -> Result<()>;

    /// Write the named children of `path`, leaving its other children alone.
    async fn update(&self, path: &str, fields: &Map<String, Value>) -> Result<()> {
        for (key, value) in fields {
            self.write(&paths::join(path, key), value).await?;
        }
        Ok(())
    }

    /// Remove `path` and everything under it.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Children of `path` whose `field` equals `value`, as `(key, record)` pairs.
    async fn query_children_by_field(
        &self,
        path: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>>;

    /// Existence check.
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.read(path).await?.is_some())
    }

    /// Observe changes at or below `path` until the handle is dropped.
    async fn subscribe(&self, path: &str) -> Result<Subscription>;
}
