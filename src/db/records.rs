// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed record operations on top of a `RecordStore`.
//!
//! Provides high-level operations for:
//! - Users (profile records and friend edges)
//! - Posts and their pending blob purges
//! - Post comments and profile comments

use super::{paths, RecordStore, Subscription};
use crate::error::{AppError, Result};
use crate::models::{PendingPurge, Post, PostComment, ProfileComment, ProfileForm, User};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Typed view of the record store.
#[derive(Clone)]
pub struct Records {
    store: Arc<dyn RecordStore>,
}

impl Records {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    // ─── Generic helpers ─────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.store.read(path).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| AppError::Database(format!("Malformed record at {}: {}", path, e))),
            None => Ok(None),
        }
    }

    async fn put<T: Serialize>(&self, path: &str, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?;
        self.store.write(path, &value).await
    }

    /// Decode children, skipping (and logging) malformed ones.
    fn decode_children<T: DeserializeOwned>(parent: &str, children: Vec<(String, Value)>) -> Vec<T> {
        children
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(parent, key = %key, error = %e, "Skipping malformed record");
                    None
                }
            })
            .collect()
    }

    async fn children<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let children = match self.store.read(path).await? {
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => Vec::new(),
        };
        Ok(Self::decode_children(path, children))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, uid: &str) -> Result<Option<User>> {
        let user: Option<User> = self.get(&paths::user(uid)).await?;
        Ok(user.map(|mut u| {
            if u.uid.is_empty() {
                u.uid = uid.to_string();
            }
            u
        }))
    }

    /// Get a user or fail with `NotFound`.
    pub async fn require_user(&self, uid: &str) -> Result<User> {
        self.get_user(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", uid)))
    }

    /// Write the whole user record.
    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        self.put(&paths::user(&user.uid), user).await
    }

    /// Update the editable profile fields without touching friend edges.
    pub async fn update_profile(&self, uid: &str, form: &ProfileForm) -> Result<()> {
        let mut user = User::default();
        form.apply_to(&mut user);
        let fields: Map<String, Value> = [
            ("firstName", user.first_name),
            ("lastName", user.last_name),
            ("phoneNumber", user.phone_number),
            ("birthday", user.birthday),
            ("foodPreference", user.food_preference),
            ("location", user.location),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value)))
        .collect();
        self.store.update(&paths::user(uid), &fields).await
    }

    pub async fn set_profile_image(&self, uid: &str, url: &str) -> Result<()> {
        self.store
            .write(
                &paths::join(&paths::user(uid), "profileImage"),
                &Value::String(url.to_string()),
            )
            .await
    }

    pub async fn all_users(&self) -> Result<Vec<User>> {
        let children = match self.store.read(paths::USERS).await? {
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => Vec::new(),
        };
        let mut users = Vec::with_capacity(children.len());
        for (key, value) in children {
            match serde_json::from_value::<User>(value) {
                Ok(mut user) => {
                    if user.uid.is_empty() {
                        user.uid = key;
                    }
                    users.push(user);
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping malformed user"),
            }
        }
        Ok(users)
    }

    /// Whether any user already has `username` (exact match).
    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        let matches = self
            .store
            .query_children_by_field(
                paths::USERS,
                "username",
                &Value::String(username.to_string()),
            )
            .await?;
        Ok(!matches.is_empty())
    }

    /// Set (`true`) or remove (`false`) a flag-style edge such as a friend.
    pub async fn set_flag(&self, path: &str, on: bool) -> Result<()> {
        if on {
            self.store.write(path, &Value::Bool(true)).await
        } else {
            self.store.remove(path).await
        }
    }

    pub async fn flag(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.store.read(path).await?, Some(Value::Bool(true))))
    }

    // ─── Post Operations ─────────────────────────────────────────

    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        self.get(&paths::post(post_id)).await
    }

    pub async fn posts_by_user(&self, uid: &str) -> Result<Vec<Post>> {
        let children = self
            .store
            .query_children_by_field(paths::POSTS, "userId", &Value::String(uid.to_string()))
            .await?;
        Ok(Self::decode_children(paths::POSTS, children))
    }

    pub async fn create_post(&self, post: &Post) -> Result<()> {
        self.put(&paths::post(&post.id), post).await
    }

    pub async fn remove_post(&self, post_id: &str) -> Result<()> {
        self.store.remove(&paths::post(post_id)).await
    }

    // ─── Pending Purge Operations ────────────────────────────────

    pub async fn pending_purges(&self) -> Result<Vec<PendingPurge>> {
        self.children(paths::PENDING_PURGES).await
    }

    pub async fn queue_purge(&self, purge: &PendingPurge) -> Result<()> {
        self.put(&paths::pending_purge(&purge.post_id), purge).await
    }

    pub async fn clear_purge(&self, post_id: &str) -> Result<()> {
        self.store.remove(&paths::pending_purge(post_id)).await
    }

    // ─── Comment Operations ──────────────────────────────────────

    /// Comments on a post, oldest first.
    pub async fn post_comments(&self, post_id: &str) -> Result<Vec<PostComment>> {
        let mut comments: Vec<PostComment> =
            self.children(&paths::post_comments(post_id)).await?;
        comments.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    pub async fn add_post_comment(&self, post_id: &str, comment: &PostComment) -> Result<()> {
        self.put(&paths::post_comment(post_id, &comment.id), comment)
            .await
    }

    /// Comments on a profile, newest first.
    pub async fn profile_comments(&self, uid: &str) -> Result<Vec<ProfileComment>> {
        let mut comments: Vec<ProfileComment> =
            self.children(&paths::profile_comments(uid)).await?;
        comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    pub async fn add_profile_comment(&self, uid: &str, comment: &ProfileComment) -> Result<()> {
        self.put(&paths::profile_comment(uid, &comment.id), comment)
            .await
    }

    pub async fn remove_profile_comment(&self, uid: &str, comment_id: &str) -> Result<()> {
        self.store
            .remove(&paths::profile_comment(uid, comment_id))
            .await
    }

    // ─── Subscriptions ───────────────────────────────────────────

    pub async fn subscribe(&self, path: &str) -> Result<Subscription> {
        self.store.subscribe(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRecordStore;
    use serde_json::json;

    fn records() -> (Arc<MemoryRecordStore>, Records) {
        let store = Arc::new(MemoryRecordStore::new());
        (store.clone(), Records::new(store))
    }

    #[tokio::test]
    async fn test_get_user_fills_uid_from_key() {
        let (store, records) = records();
        store
            .write("users/u1", &json!({"username": "ada"}))
            .await
            .unwrap();
        let user = records.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.uid, "u1");
        assert_eq!(user.username, "ada");
    }

    #[tokio::test]
    async fn test_malformed_children_are_skipped() {
        let (store, records) = records();
        store
            .write(
                "profileComments/u1/c1",
                &json!({"id": "c1", "text": "hi", "username": "bob", "timestamp": 5}),
            )
            .await
            .unwrap();
        store
            .write("profileComments/u1/c2", &json!({"text": 42}))
            .await
            .unwrap();
        let comments = records.profile_comments("u1").await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, "c1");
    }

    #[tokio::test]
    async fn test_username_taken() {
        let (_, records) = records();
        let user = User {
            uid: "u1".to_string(),
            username: "munchy".to_string(),
            ..User::default()
        };
        records.upsert_user(&user).await.unwrap();
        assert!(records.username_taken("munchy").await.unwrap());
        assert!(!records.username_taken("other").await.unwrap());
    }
}
