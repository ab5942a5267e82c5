// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MunchFeed: share one meal photo a day with your friends
//!
//! This crate provides the client for the MunchFeed social feed: screens,
//! the daily posting limit, 24 hour content expiry and the friend graph,
//! all talking to a hosted record store, blob store and identity provider.

pub mod cancel;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod screens;
pub mod services;
pub mod time_utils;

use chrono::{DateTime, Utc};
use config::Config;
use db::Records;
use services::{
    BlobStore, ExpiryPolicy, FriendService, IdentityProvider, PhotoPicker, PostingLimitPolicy,
};
use std::sync::Arc;
use time_utils::Clock;

/// Shared application context handed to every screen.
pub struct AppContext {
    pub config: Config,
    pub records: Records,
    pub blobs: Arc<dyn BlobStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub picker: Arc<dyn PhotoPicker>,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn posting_limit(&self) -> PostingLimitPolicy {
        PostingLimitPolicy::new(self.config.day_boundary)
    }

    pub fn expiry(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(self.records.clone(), self.blobs.clone())
    }

    pub fn friends(&self) -> FriendService {
        FriendService::new(self.records.clone())
    }
}
