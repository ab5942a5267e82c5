// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hosted blob storage over its REST interface.

use crate::error::{AppError, Result};
use crate::services::blob::BlobStore;
use crate::services::identity::SessionToken;
use async_trait::async_trait;
use serde::Deserialize;

/// Storage REST client for one bucket.
#[derive(Clone)]
pub struct FirebaseStorage {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    session: SessionToken,
}

/// Object metadata; only the download tokens matter here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    pub fn new(base_url: &str, bucket: &str, session: SessionToken) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            session,
        }
    }

    fn objects_url(&self) -> String {
        format!("{}/b/{}/o", self.base_url, self.bucket)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.objects_url(), urlencoding::encode(path))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.get() {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("Firebase {}", token)),
            None => request,
        }
    }

    /// Check response status and return error if not successful.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(AppError::PermissionDenied(format!("HTTP {}: {}", status, body))),
            404 => Err(AppError::NotFound(format!("HTTP {}: {}", status, body))),
            _ => Err(AppError::Storage(format!("HTTP {}: {}", status, body))),
        }
    }
}

#[async_trait]
impl BlobStore for FirebaseStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let size = bytes.len();
        let request = self
            .http
            .post(self.objects_url())
            .query(&[("uploadType", "media"), ("name", path)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        Self::check_response(response).await?;

        tracing::debug!(path, size, "Uploaded blob");
        Ok(())
    }

    async fn resolve_url(&self, path: &str) -> Result<String> {
        let response = self
            .authorize(self.http.get(self.object_url(path)))
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let metadata: ObjectMetadata = Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("JSON parse error: {}", e)))?;

        let mut url = format!("{}?alt=media", self.object_url(path));
        // Several comma-separated tokens may exist; any one grants access.
        if let Some(token) = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|t| !t.is_empty())
        {
            url.push_str("&token=");
            url.push_str(token);
        }
        Ok(url)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .authorize(self.http.delete(self.object_url(path)))
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        match Self::check_response(response).await {
            Ok(_) => Ok(()),
            Err(AppError::NotFound(_)) => {
                tracing::debug!(path, "Blob already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
