// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pending friend requests screen.

use super::{report, ScreenScope};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::identity::require_identity;
use crate::AppContext;
use std::sync::Arc;

pub struct PendingRequestsScreen {
    ctx: Arc<AppContext>,
    scope: ScreenScope,
    uid: Option<String>,
    /// Users who have asked to be friends
    pub requesters: Vec<User>,
    pub notice: Option<String>,
}

impl PendingRequestsScreen {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            uid: None,
            requesters: Vec::new(),
            notice: None,
        }
    }

    pub async fn mount(&mut self) -> Result<()> {
        match self.load().await {
            Ok((uid, requesters)) => {
                self.uid = Some(uid);
                self.requesters = requesters;
                Ok(())
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    async fn load(&self) -> Result<(String, Vec<User>)> {
        let me = require_identity(self.ctx.identity.as_ref())?;
        let user = self.scope.run(self.ctx.records.require_user(&me.id)).await?;

        let mut requesters = Vec::new();
        for id in user.requester_ids() {
            match self.scope.run(self.ctx.records.get_user(id)).await? {
                Some(requester) => requesters.push(requester),
                None => tracing::warn!(uid = %me.id, requester = id, "Request from unknown user"),
            }
        }
        Ok((me.id, requesters))
    }

    /// Accept the request from `requester`.
    ///
    /// On `PartialFailure` the friendship exists but the request stays listed
    /// so accepting again can clear it.
    pub async fn accept(&mut self, requester: &str) -> Result<()> {
        let Some(uid) = self.uid.clone() else {
            return Ok(());
        };
        let friends = self.ctx.friends();
        match self.scope.run(friends.accept_request(&uid, requester)).await {
            Ok(()) => {
                self.requesters.retain(|u| u.uid != requester);
                self.notice = None;
                Ok(())
            }
            Err(e @ AppError::NotFound(_)) => {
                // Withdrawn or accepted elsewhere.
                self.requesters.retain(|u| u.uid != requester);
                Err(report(&mut self.notice, e))
            }
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    pub fn unmount(&mut self) {
        self.scope.unmount();
    }
}
