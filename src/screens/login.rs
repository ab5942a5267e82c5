// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login screen.

use super::{report, ScreenScope};
use crate::error::{AppError, Result};
use crate::services::Identity;
use crate::AppContext;
use std::sync::Arc;

pub struct LoginScreen {
    ctx: Arc<AppContext>,
    scope: ScreenScope,
    pub email: String,
    pub password: String,
    pub notice: Option<String>,
    pub signed_in: Option<Identity>,
}

impl LoginScreen {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            email: String::new(),
            password: String::new(),
            notice: None,
            signed_in: None,
        }
    }

    /// Sign in with the entered credentials.
    pub async fn submit(&mut self) -> Result<Identity> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            let err = AppError::Validation("Please enter your email and password.".to_string());
            return Err(report(&mut self.notice, err));
        }

        let identity = self.ctx.identity.clone();
        let result = self
            .scope
            .run(identity.sign_in(self.email.trim(), &self.password))
            .await;

        match result {
            Ok(identity) => {
                tracing::info!(uid = %identity.id, "Login succeeded");
                self.notice = None;
                self.password.clear();
                self.signed_in = Some(identity.clone());
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                Err(report(&mut self.notice, e))
            }
        }
    }

    pub fn unmount(&mut self) {
        self.scope.unmount();
    }
}
