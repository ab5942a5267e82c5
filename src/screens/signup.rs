// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup screen.
//!
//! Validates the form locally, checks the username is free, creates the
//! account and writes the user record.

use super::{report, ScreenScope};
use crate::error::{AppError, Result};
use crate::models::{SignupForm, User};
use crate::services::Identity;
use crate::AppContext;
use std::sync::Arc;
use validator::Validate;

pub struct SignupScreen {
    ctx: Arc<AppContext>,
    scope: ScreenScope,
    pub form: SignupForm,
    pub notice: Option<String>,
}

impl SignupScreen {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            form: SignupForm::default(),
            notice: None,
        }
    }

    pub async fn submit(&mut self) -> Result<Identity> {
        match self.create_account().await {
            Ok(identity) => {
                self.notice = None;
                Ok(identity)
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    async fn create_account(&self) -> Result<Identity> {
        self.form.validate()?;
        let form = &self.form;
        let username = form.username.trim();

        let taken = self
            .scope
            .run(self.ctx.records.username_taken(username))
            .await?;
        if taken {
            return Err(AppError::Validation(
                "That username is already taken.".to_string(),
            ));
        }

        let identity = self
            .scope
            .run(self.ctx.identity.sign_up(form.email.trim(), &form.password))
            .await?;
        let identity = self
            .scope
            .run(self.ctx.identity.update_display_name(username))
            .await?;

        let user = User {
            uid: identity.id.clone(),
            username: username.to_string(),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email: identity.email.clone(),
            phone_number: form.phone_number.trim().to_string(),
            ..User::default()
        };
        self.scope.run(self.ctx.records.upsert_user(&user)).await?;

        tracing::info!(uid = %identity.id, username, "User signed up");
        Ok(identity)
    }

    pub fn unmount(&mut self) {
        self.scope.unmount();
    }
}
