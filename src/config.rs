// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! The hosted backend endpoints and the posting-day timezone are read once at
//! startup. The day boundary has no implicit default: it must be configured.

use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::time::Duration;

/// Age after which posts and profile comments are purged (24 hours).
pub const CONTENT_TTL_MS: i64 = 86_400_000;

/// Default interval between expiry sweeps of an open screen (hourly).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

const DEFAULT_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Web API key of the hosted project
    pub firebase_api_key: String,
    /// Realtime database root URL (no trailing slash)
    pub database_url: String,
    /// Blob storage bucket name
    pub storage_bucket: String,
    /// Identity toolkit REST base URL
    pub auth_base_url: String,
    /// Blob storage REST base URL
    pub storage_base_url: String,
    /// Offset whose local midnight starts a posting day
    pub day_boundary: FixedOffset,
    /// How often an open screen re-runs its expiry sweep
    pub sweep_interval: Duration,
}

impl Config {
    /// Config for tests: UTC day boundary and local endpoints.
    pub fn test_default() -> Self {
        Self {
            firebase_api_key: "test-api-key".to_string(),
            database_url: "http://localhost:9000".to_string(),
            storage_bucket: "test-bucket".to_string(),
            auth_base_url: "http://localhost:9099/v1".to_string(),
            storage_base_url: "http://localhost:9199/v0".to_string(),
            day_boundary: utc_offset(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let day_boundary = env::var("DAY_BOUNDARY_UTC_OFFSET")
            .map_err(|_| ConfigError::Missing("DAY_BOUNDARY_UTC_OFFSET"))
            .and_then(|raw| parse_utc_offset(&raw))?;

        let sweep_interval = match env::var("PURGE_SWEEP_INTERVAL_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ConfigError::Invalid("PURGE_SWEEP_INTERVAL_SECS", raw.clone())
                })?,
            Err(_) => Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        };

        Ok(Self {
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            database_url: env::var("FIREBASE_DATABASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_DATABASE_URL"))?,
            storage_bucket: env::var("FIREBASE_STORAGE_BUCKET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_STORAGE_BUCKET"))?,
            auth_base_url: env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_AUTH_BASE_URL.to_string()),
            storage_base_url: env::var("STORAGE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_STORAGE_BASE_URL.to_string()),
            day_boundary,
            sweep_interval,
        })
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse an offset of the form `+HH:MM`, `-HH:MM` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(utc_offset());
    }
    trimmed
        .parse::<FixedOffset>()
        .map_err(|_| ConfigError::Invalid("DAY_BOUNDARY_UTC_OFFSET", raw.to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
