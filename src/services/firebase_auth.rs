// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hosted identity provider over the identity toolkit REST API.
//!
//! Handles:
//! - Email/password sign-in and sign-up
//! - Display name updates
//! - Mapping provider error codes to `AuthError`

use crate::error::{AppError, AuthError, Result};
use crate::services::identity::{Identity, IdentityProvider, SessionToken};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;

/// Identity toolkit REST client.
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: SessionToken,
    current: Mutex<Option<Identity>>,
}

/// Successful sign-in / sign-up / update response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuth {
    pub fn new(base_url: &str, api_key: &str, session: SessionToken) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            session,
            current: Mutex::new(None),
        }
    }

    /// POST to an `accounts:*` endpoint.
    async fn call(&self, method: &str, body: serde_json::Value) -> Result<AccountResponse> {
        let url = format!("{}/accounts:{}", self.base_url, method);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => {
                    tracing::warn!(method, code = %envelope.error.message, "Identity provider rejected request");
                    AuthError::from_code(&envelope.error.message).into()
                }
                Err(_) => AuthError::Network(format!("HTTP {}: {}", status, text)).into(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Network(format!("JSON parse error: {}", e)).into())
    }

    fn establish(&self, account: AccountResponse, fallback_email: &str) -> Identity {
        let identity = Identity {
            id: account.local_id,
            display_name: account.display_name.filter(|n| !n.is_empty()),
            email: account
                .email
                .unwrap_or_else(|| fallback_email.to_string()),
        };
        if let Some(token) = account.id_token {
            self.session.set(Some(token));
        }
        *self.current.lock() = Some(identity.clone());
        identity
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.current.lock().clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let account = self
            .call(
                "signInWithPassword",
                serde_json::json!({
                    "email": email.trim(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        let identity = self.establish(account, email.trim());
        tracing::info!(uid = %identity.id, "Signed in");
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let account = self
            .call(
                "signUp",
                serde_json::json!({
                    "email": email.trim(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        let identity = self.establish(account, email.trim());
        tracing::info!(uid = %identity.id, "Account created");
        Ok(identity)
    }

    async fn update_display_name(&self, display_name: &str) -> Result<Identity> {
        let token = self
            .session
            .get()
            .ok_or(AppError::Auth(AuthError::NotSignedIn))?;
        let current = self
            .current_identity()
            .ok_or(AppError::Auth(AuthError::NotSignedIn))?;

        let account = self
            .call(
                "update",
                serde_json::json!({
                    "idToken": token,
                    "displayName": display_name,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        Ok(self.establish(account, &current.email))
    }

    fn sign_out(&self) {
        *self.current.lock() = None;
        self.session.set(None);
        tracing::info!("Signed out");
    }
}
