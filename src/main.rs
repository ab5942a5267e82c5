// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MunchFeed headless client
//!
//! Signs in with credentials from the environment, opens the main feed,
//! optionally posts today's meal photo, then keeps the feed's expiry sweep
//! running until interrupted.

use munchfeed::{
    config::Config,
    db::{RealtimeDbStore, Records},
    screens::{LoginScreen, MainFeedScreen},
    services::{FilePicker, FirebaseAuth, FirebaseStorage, SessionToken},
    time_utils::{format_utc_rfc3339, from_millis, SystemClock},
    AppContext,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        day_boundary = %config.day_boundary,
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Starting MunchFeed client"
    );

    // One session token shared by every remote client
    let session = SessionToken::new();
    let identity = Arc::new(FirebaseAuth::new(
        &config.auth_base_url,
        &config.firebase_api_key,
        session.clone(),
    ));
    let store = Arc::new(RealtimeDbStore::new(&config.database_url, session.clone()));
    let blobs = Arc::new(FirebaseStorage::new(
        &config.storage_base_url,
        &config.storage_bucket,
        session,
    ));
    let picker = Arc::new(FilePicker::new(
        std::env::var("MUNCHFEED_PHOTO").ok().map(PathBuf::from),
    ));

    let ctx = Arc::new(AppContext {
        config,
        records: Records::new(store),
        blobs,
        identity,
        picker,
        clock: Arc::new(SystemClock),
    });

    // Sign in
    let mut login = LoginScreen::new(ctx.clone());
    login.email = std::env::var("MUNCHFEED_EMAIL").unwrap_or_default();
    login.password = std::env::var("MUNCHFEED_PASSWORD").unwrap_or_default();
    if let Err(e) = login.submit().await {
        tracing::error!(error = %e, notice = ?login.notice, "Sign-in failed");
        return Err(e.into());
    }
    login.unmount();

    // Open the feed
    let mut feed = MainFeedScreen::new(ctx.clone());
    feed.mount().await?;
    for post in &feed.posts {
        tracing::info!(
            post_id = %post.id,
            author = %post.user_id,
            at = %format_utc_rfc3339(from_millis(post.timestamp)),
            caption = %post.caption,
            "Feed post"
        );
    }
    tracing::info!(
        posts = feed.posts.len(),
        authors = feed.authors.len(),
        can_post = feed.can_post,
        "Feed loaded"
    );

    if feed.can_post && std::env::var("MUNCHFEED_PHOTO").is_ok() {
        let caption = std::env::var("MUNCHFEED_CAPTION").unwrap_or_default();
        match feed.create_post(&caption).await {
            Ok(Some(post)) => tracing::info!(post_id = %post.id, "Posted today's meal"),
            Ok(None) => tracing::info!("No photo picked"),
            Err(e) => tracing::warn!(error = %e, notice = ?feed.notice, "Could not post"),
        }
    }

    // Keep sweeping until interrupted
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            sweep = feed.wait_for_sweep() => match sweep {
                Some(report) => tracing::info!(
                    purged = report.purged.len(),
                    partial = report.partial.len(),
                    drained = report.drained,
                    skipped = report.skipped.len(),
                    "Expiry sweep finished"
                ),
                None => break,
            },
        }
    }

    feed.unmount();
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,munchfeed=debug")),
        )
        .with(format)
        .init();
}
