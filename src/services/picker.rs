// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Camera / photo library picker seam.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;

/// A photo chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedPhoto {
    /// Local file URI or path
    pub uri: String,
}

/// Device photo picker.
#[async_trait]
pub trait PhotoPicker: Send + Sync {
    /// Ask for camera / library access. `false` when the user refuses.
    async fn request_permission(&self) -> Result<bool>;

    /// Let the user pick a photo. `None` when they cancel.
    async fn capture(&self) -> Result<Option<PickedPhoto>>;

    /// Read the picked photo's bytes.
    async fn read(&self, photo: &PickedPhoto) -> Result<Vec<u8>> {
        let path = photo.uri.strip_prefix("file://").unwrap_or(&photo.uri);
        tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to read {}: {}", path, e)))
    }
}

/// Picks a fixed file from disk; used by the headless client.
#[derive(Debug, Clone, Default)]
pub struct FilePicker {
    path: Option<PathBuf>,
}

impl FilePicker {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PhotoPicker for FilePicker {
    async fn request_permission(&self) -> Result<bool> {
        Ok(true)
    }

    async fn capture(&self) -> Result<Option<PickedPhoto>> {
        Ok(self.path.as_ref().map(|p| PickedPhoto {
            uri: p.display().to_string(),
        }))
    }
}

/// Scripted picker returning in-memory bytes.
#[derive(Debug)]
pub struct StaticPicker {
    granted: Mutex<bool>,
    photo: Mutex<Option<(String, Vec<u8>)>>,
}

impl StaticPicker {
    /// Permission granted, picks `uri` with `bytes`.
    pub fn with_photo(uri: &str, bytes: Vec<u8>) -> Self {
        Self {
            granted: Mutex::new(true),
            photo: Mutex::new(Some((uri.to_string(), bytes))),
        }
    }

    /// Permission granted, user cancels every pick.
    pub fn cancelling() -> Self {
        Self {
            granted: Mutex::new(true),
            photo: Mutex::new(None),
        }
    }

    pub fn set_permission(&self, granted: bool) {
        *self.granted.lock() = granted;
    }
}

#[async_trait]
impl PhotoPicker for StaticPicker {
    async fn request_permission(&self) -> Result<bool> {
        Ok(*self.granted.lock())
    }

    async fn capture(&self) -> Result<Option<PickedPhoto>> {
        Ok(self
            .photo
            .lock()
            .as_ref()
            .map(|(uri, _)| PickedPhoto { uri: uri.clone() }))
    }

    async fn read(&self, photo: &PickedPhoto) -> Result<Vec<u8>> {
        match self.photo.lock().as_ref() {
            Some((uri, bytes)) if *uri == photo.uri => Ok(bytes.clone()),
            _ => Err(AppError::NotFound(format!("Photo {}", photo.uri))),
        }
    }
}

/// Ask for permission, then let the user pick and load a photo.
///
/// `Ok(None)` when the user cancels the picker.
pub async fn pick_photo(picker: &dyn PhotoPicker) -> Result<Option<(PickedPhoto, Vec<u8>)>> {
    if !picker.request_permission().await? {
        return Err(AppError::CameraPermissionDenied);
    }
    let Some(photo) = picker.capture().await? else {
        return Ok(None);
    };
    let bytes = picker.read(&photo).await?;
    Ok(Some((photo, bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pick_photo_permission_denied() {
        let picker = StaticPicker::with_photo("file:///meal.jpg", vec![1]);
        picker.set_permission(false);
        assert!(matches!(
            pick_photo(&picker).await,
            Err(AppError::CameraPermissionDenied)
        ));
    }

    #[tokio::test]
    async fn test_pick_photo_cancelled() {
        let picker = StaticPicker::cancelling();
        assert!(pick_photo(&picker).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_picker_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meal.jpg");
        std::fs::write(&path, b"jpeg-bytes").unwrap();

        let picker = FilePicker::new(Some(path));
        let (_, bytes) = pick_photo(&picker).await.unwrap().unwrap();
        assert_eq!(bytes, b"jpeg-bytes");
    }
}
