// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup and profile field predicates.
//!
//! Pure string checks with no state. The `check_*` wrappers adapt them to
//! `validator` custom validators with user-facing messages.

use std::borrow::Cow;
use validator::{ValidateEmail, ValidationError};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 8;
const PHONE_MIN_DIGITS: usize = 10;
const PHONE_MAX_DIGITS: usize = 15;

/// 3-20 characters of ASCII letters, digits or underscore.
pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (USERNAME_MIN..=USERNAME_MAX).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// At least 8 characters with a letter, a digit and a special character.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN
        && password.chars().any(|c| c.is_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}

/// 10-15 digits, optional leading `+`, with spaces, dashes, dots and
/// parentheses ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut digits = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return false,
        }
    }
    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn check_username(username: &str) -> Result<(), ValidationError> {
    if is_valid_username(username) {
        Ok(())
    } else {
        Err(field_error(
            "username",
            "Username must be 3-20 characters: letters, numbers or underscores.",
        ))
    }
}

pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if is_valid_password(password) {
        Ok(())
    } else {
        Err(field_error(
            "password",
            "Password must be at least 8 characters and include a number and a special character.",
        ))
    }
}

pub fn check_phone(phone: &str) -> Result<(), ValidationError> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(field_error("phone", "Please enter a valid phone number."))
    }
}

/// Like `check_phone`, but an empty value is accepted.
pub fn check_optional_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.trim().is_empty() {
        Ok(())
    } else {
        check_phone(phone)
    }
}
