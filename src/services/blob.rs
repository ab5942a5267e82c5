// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Blob store seam for post photos and profile images.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

/// Binary object storage addressed by path.
///
/// Deleting an absent path succeeds.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Fetchable URL for an uploaded blob.
    async fn resolve_url(&self, path: &str) -> Result<String>;

    async fn delete(&self, path: &str) -> Result<()>;
}

/// Blob path of a post photo.
pub fn post_image_path(uid: &str, post_id: &str) -> String {
    format!("posts/{}/{}.jpg", uid, post_id)
}

/// Blob path of a profile image.
pub fn profile_image_path(uid: &str) -> String {
    format!("profileImages/{}.jpg", uid)
}

/// Guess a content type from a file name.
pub fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".heic") {
        "image/heic"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

/// Blob operation, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobOp {
    Upload,
    Resolve,
    Delete,
}

/// In-process `BlobStore`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Vec<u8>>,
    failing: Mutex<Vec<(BlobOp, String)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `op` on paths starting with `prefix`.
    pub fn fail_on(&self, op: BlobOp, prefix: &str) {
        self.failing.lock().push((op, prefix.to_string()));
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    fn check_failure(&self, op: BlobOp, path: &str) -> Result<()> {
        let failing = self.failing.lock();
        if failing
            .iter()
            .any(|(fail_op, prefix)| *fail_op == op && path.starts_with(prefix.as_str()))
        {
            return Err(AppError::Storage(format!(
                "injected {:?} failure at {}",
                op, path
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        self.check_failure(BlobOp::Upload, path)?;
        self.blobs.insert(path.to_string(), bytes);
        Ok(())
    }

    async fn resolve_url(&self, path: &str) -> Result<String> {
        self.check_failure(BlobOp::Resolve, path)?;
        if !self.blobs.contains_key(path) {
            return Err(AppError::NotFound(format!("Blob {}", path)));
        }
        Ok(format!("memory://{}", path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.check_failure(BlobOp::Delete, path)?;
        self.blobs.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_resolve_delete() {
        let store = MemoryBlobStore::new();
        let path = post_image_path("u1", "p1");
        store.upload(&path, vec![1, 2, 3], "image/jpeg").await.unwrap();
        assert_eq!(
            store.resolve_url(&path).await.unwrap(),
            "memory://posts/u1/p1.jpg"
        );
        store.delete(&path).await.unwrap();
        assert!(!store.contains(&path));
        // Deleting again is a no-op.
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_missing_blob_is_not_found() {
        let store = MemoryBlobStore::new();
        assert!(matches!(
            store.resolve_url("nope.jpg").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("IMG_001.PNG"), "image/png");
        assert_eq!(content_type_for("photo"), "image/jpeg");
    }
}
