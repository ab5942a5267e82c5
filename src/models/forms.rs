// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Form state validated locally before any remote write.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::validation::{check_optional_phone, check_password, check_phone, check_username};

/// Signup screen fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    #[validate(custom(function = "check_username"))]
    pub username: String,
    #[validate(length(min = 1, max = 50, message = "First name is required."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required."))]
    pub last_name: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(custom(function = "check_password"))]
    pub password: String,
    #[validate(custom(function = "check_phone"))]
    pub phone_number: String,
}

/// Editable fields of the profile screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    #[validate(length(max = 50, message = "First name is too long."))]
    pub first_name: String,
    #[validate(length(max = 50, message = "Last name is too long."))]
    pub last_name: String,
    #[validate(custom(function = "check_optional_phone"))]
    pub phone_number: String,
    #[validate(length(max = 30, message = "Birthday is too long."))]
    pub birthday: String,
    #[validate(length(max = 100, message = "Food preference is too long."))]
    pub food_preference: String,
    #[validate(length(max = 100, message = "Location is too long."))]
    pub location: String,
}

impl ProfileForm {
    pub fn from_user(user: &crate::models::User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            birthday: user.birthday.clone(),
            food_preference: user.food_preference.clone(),
            location: user.location.clone(),
        }
    }

    /// Copy the form fields onto a user record.
    pub fn apply_to(&self, user: &mut crate::models::User) {
        user.first_name = self.first_name.trim().to_string();
        user.last_name = self.last_name.trim().to_string();
        user.phone_number = self.phone_number.trim().to_string();
        user.birthday = self.birthday.trim().to_string();
        user.food_preference = self.food_preference.trim().to_string();
        user.location = self.location.trim().to_string();
    }
}
