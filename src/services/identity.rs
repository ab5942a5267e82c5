// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider seam and the session token shared with the stores.

use crate::error::{AppError, AuthError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Minimum password length the hosted provider accepts.
const PROVIDER_MIN_PASSWORD: usize = 6;

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable unique id (also the user record key)
    pub id: String,
    pub display_name: Option<String>,
    pub email: String,
}

/// Id token of the signed-in session, shared by every remote client.
#[derive(Debug, Clone, Default)]
pub struct SessionToken(Arc<RwLock<Option<String>>>);

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().clone()
    }

    pub fn set(&self, token: Option<String>) {
        *self.0.write() = token;
    }
}

/// Issues and verifies session identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in identity, if any.
    fn current_identity(&self) -> Option<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;

    /// Set the display name of the signed-in identity.
    async fn update_display_name(&self, display_name: &str) -> Result<Identity>;

    fn sign_out(&self);
}

/// The signed-in identity or `AuthError::NotSignedIn`.
pub fn require_identity(provider: &dyn IdentityProvider) -> Result<Identity> {
    provider
        .current_identity()
        .ok_or(AppError::Auth(AuthError::NotSignedIn))
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    identity: Identity,
}

/// In-process identity provider with the hosted provider's error behaviour.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    accounts: DashMap<String, Account>,
    current: Mutex<Option<Identity>>,
    session: SessionToken,
}

impl MemoryIdentityProvider {
    pub fn new(session: SessionToken) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    fn establish(&self, identity: &Identity) {
        self.session.set(Some(format!("memory-token-{}", identity.id)));
        *self.current.lock() = Some(identity.clone());
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.current.lock().clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let key = email.trim().to_lowercase();
        let identity = match self.accounts.get(&key) {
            Some(account) if account.password == password => account.identity.clone(),
            _ => return Err(AuthError::WrongCredentials.into()),
        };
        self.establish(&identity);
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let key = email.trim().to_lowercase();
        if !crate::services::validation::is_valid_email(&key) {
            return Err(AuthError::InvalidEmail.into());
        }
        if password.chars().count() < PROVIDER_MIN_PASSWORD {
            return Err(AuthError::WeakPassword.into());
        }

        let identity = Identity {
            id: uuid::Uuid::new_v4().simple().to_string(),
            display_name: None,
            email: key.clone(),
        };
        match self.accounts.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(AuthError::EmailInUse.into());
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Account {
                    password: password.to_string(),
                    identity: identity.clone(),
                });
            }
        }
        self.establish(&identity);
        Ok(identity)
    }

    async fn update_display_name(&self, display_name: &str) -> Result<Identity> {
        let mut current = self.current.lock();
        let identity = current
            .as_mut()
            .ok_or(AppError::Auth(AuthError::NotSignedIn))?;
        identity.display_name = Some(display_name.to_string());
        if let Some(mut account) = self.accounts.get_mut(&identity.email) {
            account.identity.display_name = identity.display_name.clone();
        }
        Ok(identity.clone())
    }

    fn sign_out(&self) {
        *self.current.lock() = None;
        self.session.set(None);
    }
}
