// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup and login screens.

mod common;

use common::{create_test_app, utc, PASSWORD};
use munchfeed::error::{AppError, AuthError};
use munchfeed::models::SignupForm;
use munchfeed::screens::{LoginScreen, SignupScreen};
use munchfeed::services::validation::{is_valid_password, is_valid_username};
use munchfeed::services::IdentityProvider;
use pretty_assertions::assert_eq;

fn form(username: &str, email: &str, password: &str) -> SignupForm {
    SignupForm {
        username: username.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        password: password.to_string(),
        phone_number: "+1 (415) 555-0123".to_string(),
    }
}

#[test]
fn test_field_patterns() {
    assert!(!is_valid_username("ab"));
    assert!(is_valid_username("valid_user1"));
    assert!(!is_valid_password("password"));
    assert!(is_valid_password("Pass123!"));
}

#[tokio::test]
async fn test_signup_creates_account_and_record() {
    let app = create_test_app(utc("2026-05-01T09:00:00Z"));
    let mut signup = SignupScreen::new(app.ctx.clone());
    signup.form = form("valid_user1", "ada@example.com", "Pass123!");

    let identity = signup.submit().await.unwrap();
    assert_eq!(identity.display_name.as_deref(), Some("valid_user1"));
    assert!(signup.notice.is_none());

    let user = app.ctx.records.require_user(&identity.id).await.unwrap();
    assert_eq!(user.username, "valid_user1");
    assert_eq!(user.first_name, "Ada");
    assert_eq!(user.email, "ada@example.com");
    assert!(user.friends.is_empty());
}

#[tokio::test]
async fn test_signup_invalid_username_blocks_submission() {
    let app = create_test_app(utc("2026-05-01T09:00:00Z"));
    let mut signup = SignupScreen::new(app.ctx.clone());
    signup.form = form("ab", "ada@example.com", "Pass123!");

    let err = signup.submit().await.unwrap_err();
    let AppError::InvalidForm(errors) = &err else {
        panic!("expected form errors, got {err:?}");
    };
    assert!(errors.field_errors().contains_key("username"));
    assert_eq!(
        signup.notice.as_deref(),
        Some("Username must be 3-20 characters: letters, numbers or underscores.")
    );
    assert!(app.identity.current_identity().is_none(), "no account created");
}

#[tokio::test]
async fn test_signup_weak_password_blocks_submission() {
    let app = create_test_app(utc("2026-05-01T09:00:00Z"));
    let mut signup = SignupScreen::new(app.ctx.clone());
    signup.form = form("valid_user1", "ada@example.com", "password");

    let err = signup.submit().await.unwrap_err();
    let AppError::InvalidForm(errors) = &err else {
        panic!("expected form errors, got {err:?}");
    };
    assert!(errors.field_errors().contains_key("password"));
}

#[tokio::test]
async fn test_signup_rejects_taken_username_and_email() {
    let app = create_test_app(utc("2026-05-01T09:00:00Z"));
    app.add_user("munchy").await;

    let mut signup = SignupScreen::new(app.ctx.clone());
    signup.form = form("munchy", "other@example.com", "Pass123!");
    assert!(matches!(
        signup.submit().await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(
        signup.notice.as_deref(),
        Some("That username is already taken.")
    );

    signup.form = form("new_name", "munchy@example.com", "Pass123!");
    assert!(matches!(
        signup.submit().await,
        Err(AppError::Auth(AuthError::EmailInUse))
    ));
    assert_eq!(
        signup.notice.as_deref(),
        Some("That email address is already in use!")
    );
}

#[tokio::test]
async fn test_login_success_and_failures() {
    let app = create_test_app(utc("2026-05-01T09:00:00Z"));
    let created = app.add_user("munchy").await;
    app.identity.sign_out();

    let mut login = LoginScreen::new(app.ctx.clone());
    assert!(matches!(login.submit().await, Err(AppError::Validation(_))));
    assert_eq!(
        login.notice.as_deref(),
        Some("Please enter your email and password.")
    );

    login.email = "munchy@example.com".to_string();
    login.password = "wrong-password".to_string();
    assert!(matches!(
        login.submit().await,
        Err(AppError::Auth(AuthError::WrongCredentials))
    ));
    assert_eq!(login.notice.as_deref(), Some("Incorrect email or password."));
    assert!(login.signed_in.is_none());

    login.email = " Munchy@Example.com ".to_string();
    login.password = PASSWORD.to_string();
    let identity = login.submit().await.unwrap();
    assert_eq!(identity.id, created.id);
    assert!(login.notice.is_none());
    assert!(login.password.is_empty());
    assert_eq!(app.identity.current_identity(), Some(identity));
}

#[tokio::test]
async fn test_login_after_unmount_is_cancelled() {
    let app = create_test_app(utc("2026-05-01T09:00:00Z"));
    app.add_user("munchy").await;
    app.identity.sign_out();

    let mut login = LoginScreen::new(app.ctx.clone());
    login.email = "munchy@example.com".to_string();
    login.password = PASSWORD.to_string();
    login.unmount();

    assert!(matches!(login.submit().await, Err(AppError::Cancelled)));
    assert!(login.notice.is_none());
    assert!(app.identity.current_identity().is_none());
}
