// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use munchfeed::error::{AppError, AuthError, GENERIC_FAILURE_MESSAGE};

#[test]
fn test_remote_failures_share_generic_message() {
    for err in [
        AppError::Database("timeout".to_string()),
        AppError::Storage("HTTP 500".to_string()),
        AppError::PermissionDenied("rules".to_string()),
        AppError::PartialFailure("second edge".to_string()),
    ] {
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }
}

#[test]
fn test_is_retryable() {
    assert!(AppError::Database("timeout".to_string()).is_retryable());
    assert!(AppError::Storage("HTTP 503".to_string()).is_retryable());
    assert!(AppError::PermissionDenied("rules".to_string()).is_retryable());
    assert!(AppError::Auth(AuthError::Network("reset".to_string())).is_retryable());

    assert!(!AppError::Validation("bad".to_string()).is_retryable());
    assert!(!AppError::AlreadyPostedToday.is_retryable());
    assert!(!AppError::Auth(AuthError::WrongCredentials).is_retryable());
}

#[test]
fn test_auth_codes_map_to_messages() {
    let err: AppError = AuthError::from_code("EMAIL_EXISTS").into();
    assert_eq!(err.user_message(), "That email address is already in use!");

    let err: AppError =
        AuthError::from_code("WEAK_PASSWORD : Password should be at least 6 characters").into();
    assert_eq!(err.user_message(), "Password is too weak.");

    let err: AppError = AuthError::from_code("SOMETHING_NEW").into();
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}

#[test]
fn test_cancelled_has_no_message() {
    assert!(AppError::Cancelled.user_message().is_empty());
}
