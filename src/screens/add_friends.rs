// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Add-friends screen: search users by username and send requests.

use super::{report, ScreenScope};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::identity::require_identity;
use crate::AppContext;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct AddFriendsScreen {
    ctx: Arc<AppContext>,
    scope: ScreenScope,
    uid: Option<String>,
    directory: Vec<User>,
    pub query: String,
    pub results: Vec<User>,
    /// Users a request was sent to from this screen
    pub sent: BTreeSet<String>,
    pub notice: Option<String>,
}

impl AddFriendsScreen {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            uid: None,
            directory: Vec::new(),
            query: String::new(),
            results: Vec::new(),
            sent: BTreeSet::new(),
            notice: None,
        }
    }

    /// Load the user directory.
    pub async fn mount(&mut self) -> Result<()> {
        let loaded = async {
            let me = require_identity(self.ctx.identity.as_ref())?;
            let users = self.scope.run(self.ctx.records.all_users()).await?;
            Ok::<_, AppError>((me.id, users))
        }
        .await;

        match loaded {
            Ok((uid, users)) => {
                self.uid = Some(uid);
                self.directory = users;
                Ok(())
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    /// Case-insensitive username prefix search, excluding the user themself.
    pub fn search(&mut self, query: &str) -> &[User] {
        self.query = query.to_string();
        let needle = query.trim().to_lowercase();
        self.results = if needle.is_empty() {
            Vec::new()
        } else {
            let mut found: Vec<User> = self
                .directory
                .iter()
                .filter(|u| Some(&u.uid) != self.uid.as_ref())
                .filter(|u| u.username.to_lowercase().starts_with(&needle))
                .cloned()
                .collect();
            found.sort_by(|a, b| a.username.cmp(&b.username));
            found
        };
        &self.results
    }

    pub async fn send_request(&mut self, target: &str) -> Result<()> {
        let Some(uid) = self.uid.clone() else {
            return Ok(());
        };
        let friends = self.ctx.friends();
        match self.scope.run(friends.send_request(&uid, target)).await {
            Ok(()) => {
                self.sent.insert(target.to_string());
                self.notice = Some("Friend request sent!".to_string());
                Ok(())
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    pub fn unmount(&mut self) {
        self.scope.unmount();
    }
}
