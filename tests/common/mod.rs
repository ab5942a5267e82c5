// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Utc};
use munchfeed::config::Config;
use munchfeed::db::{MemoryRecordStore, Records};
use munchfeed::models::User;
use munchfeed::services::{
    Identity, IdentityProvider, MemoryBlobStore, MemoryIdentityProvider, SessionToken,
    StaticPicker,
};
use munchfeed::time_utils::ManualClock;
use munchfeed::AppContext;
use std::sync::Arc;

/// Password every test account uses.
#[allow(dead_code)]
pub const PASSWORD: &str = "Pass123!";

/// Bytes standing in for a JPEG.
#[allow(dead_code)]
pub const PHOTO: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

/// An in-memory app with handles on every fake.
#[allow(dead_code)]
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub store: Arc<MemoryRecordStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub identity: Arc<MemoryIdentityProvider>,
    pub picker: Arc<StaticPicker>,
    pub clock: Arc<ManualClock>,
}

/// Parse an RFC3339 instant.
#[allow(dead_code)]
pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// Create a test app with offline in-memory dependencies, UTC day boundary.
#[allow(dead_code)]
pub fn create_test_app(start: DateTime<Utc>) -> TestApp {
    create_test_app_with(Config::test_default(), start)
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config, start: DateTime<Utc>) -> TestApp {
    let store = Arc::new(MemoryRecordStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let identity = Arc::new(MemoryIdentityProvider::new(SessionToken::new()));
    let picker = Arc::new(StaticPicker::with_photo("file:///tmp/meal.jpg", PHOTO.to_vec()));
    let clock = Arc::new(ManualClock::new(start));

    let ctx = Arc::new(AppContext {
        config,
        records: Records::new(store.clone()),
        blobs: blobs.clone(),
        identity: identity.clone(),
        picker: picker.clone(),
        clock: clock.clone(),
    });

    TestApp {
        ctx,
        store,
        blobs,
        identity,
        picker,
        clock,
    }
}

impl TestApp {
    /// Create an account and its user record; leaves it signed in.
    #[allow(dead_code)]
    pub async fn add_user(&self, username: &str) -> Identity {
        let email = format!("{}@example.com", username);
        let identity = self.identity.sign_up(&email, PASSWORD).await.unwrap();
        let user = User {
            uid: identity.id.clone(),
            username: username.to_string(),
            first_name: username.to_string(),
            email,
            ..User::default()
        };
        self.ctx.records.upsert_user(&user).await.unwrap();
        identity
    }

    /// Switch the signed-in account.
    #[allow(dead_code)]
    pub async fn sign_in_as(&self, username: &str) -> Identity {
        self.identity
            .sign_in(&format!("{}@example.com", username), PASSWORD)
            .await
            .unwrap()
    }
}
