// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent user-facing messages.

/// Message shown for any remote read/write/upload/delete failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application error type surfaced by policies and screens.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid form: {0}")]
    InvalidForm(#[from] validator::ValidationErrors),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Already posted today")]
    AlreadyPostedToday,

    #[error("Camera or photo library permission denied")]
    CameraPermissionDenied,

    #[error("Operation only partially completed: {0}")]
    PartialFailure(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Text to show the user for this error.
    ///
    /// Remote I/O failures collapse to a generic retry message; their detail
    /// goes to the log instead.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::InvalidForm(errors) => first_field_message(errors)
                .unwrap_or_else(|| "Please check the highlighted fields.".to_string()),
            AppError::Auth(err) => err.user_message().to_string(),
            AppError::NotFound(_) => "That item no longer exists.".to_string(),
            AppError::AlreadyPostedToday => {
                "You've already posted today. Come back tomorrow!".to_string()
            }
            AppError::CameraPermissionDenied => {
                "Permission to access your photos is required.".to_string()
            }
            AppError::Cancelled => String::new(),
            AppError::PermissionDenied(msg) => {
                tracing::warn!(error = %msg, "Permission denied by remote store");
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            AppError::Database(msg) | AppError::Storage(msg) | AppError::PartialFailure(msg) => {
                tracing::error!(error = %msg, "Remote operation failed");
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }

    /// Whether the user can reasonably try the same action again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Storage(_)
                | AppError::PermissionDenied(_)
                | AppError::PartialFailure(_)
        ) || matches!(self, AppError::Auth(AuthError::Network(_)))
    }
}

fn first_field_message(errors: &validator::ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields.into_iter().find_map(|(_, errs)| {
        errs.iter()
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
    })
}

/// Errors reported by the identity provider, keyed by its error codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("email already in use")]
    EmailInUse,

    #[error("invalid email")]
    InvalidEmail,

    #[error("wrong email or password")]
    WrongCredentials,

    #[error("user disabled")]
    UserDisabled,

    #[error("too many attempts")]
    TooManyAttempts,

    #[error("weak password")]
    WeakPassword,

    #[error("not signed in")]
    NotSignedIn,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider error: {0}")]
    Other(String),
}

impl AuthError {
    /// Map a provider error code (e.g. `EMAIL_EXISTS`) to an `AuthError`.
    ///
    /// Codes may carry a trailing explanation (`WEAK_PASSWORD : Password should be...`).
    pub fn from_code(code: &str) -> Self {
        let head = code.split(':').next().unwrap_or(code).trim();
        match head {
            "EMAIL_EXISTS" => AuthError::EmailInUse,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "MISSING_PASSWORD" => AuthError::WrongCredentials,
            "USER_DISABLED" => AuthError::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyAttempts,
            "WEAK_PASSWORD" => AuthError::WeakPassword,
            "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => AuthError::NotSignedIn,
            _ => AuthError::Other(code.to_string()),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::EmailInUse => "That email address is already in use!",
            AuthError::InvalidEmail => "That email address is invalid!",
            AuthError::WrongCredentials => "Incorrect email or password.",
            AuthError::UserDisabled => "This account has been disabled.",
            AuthError::TooManyAttempts => "Too many attempts. Please try again later.",
            AuthError::WeakPassword => "Password is too weak.",
            AuthError::NotSignedIn => "Please log in again.",
            AuthError::Network(_) | AuthError::Other(_) => GENERIC_FAILURE_MESSAGE,
        }
    }
}

/// Result type alias for policies and screens
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_known_codes() {
        assert_eq!(AuthError::from_code("EMAIL_EXISTS"), AuthError::EmailInUse);
        assert_eq!(
            AuthError::from_code("INVALID_LOGIN_CREDENTIALS"),
            AuthError::WrongCredentials
        );
        assert_eq!(
            AuthError::from_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthError::WeakPassword
        );
    }

    #[test]
    fn test_from_code_unknown_code_keeps_text() {
        assert_eq!(
            AuthError::from_code("OPERATION_NOT_ALLOWED"),
            AuthError::Other("OPERATION_NOT_ALLOWED".to_string())
        );
    }

    #[test]
    fn test_remote_errors_are_retryable_with_generic_message() {
        let err = AppError::Database("connection reset".to_string());
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert!(AppError::PermissionDenied("rules".to_string()).is_retryable());

        assert!(!AppError::AlreadyPostedToday.is_retryable());
        assert!(!AppError::Auth(AuthError::WrongCredentials).is_retryable());
    }
}
