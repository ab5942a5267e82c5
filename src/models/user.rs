// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model stored under `users/{uid}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User profile record, keyed by identity id.
///
/// `friends` and `friend_requests` are stored as `{ uid: true }` maps so each
/// edge can be written and removed on its own path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity id (also the record key)
    #[serde(default)]
    pub uid: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    /// Free-form birthday as entered (e.g. "1994-07-21")
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub food_preference: String,
    #[serde(default)]
    pub location: String,
    /// Resolved download URL of the profile image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub friends: BTreeMap<String, bool>,
    /// Pending incoming requests, keyed by requester id
    #[serde(default)]
    pub friend_requests: BTreeMap<String, bool>,
}

impl User {
    pub fn is_friend(&self, uid: &str) -> bool {
        self.friends.get(uid).copied().unwrap_or(false)
    }

    pub fn has_request_from(&self, uid: &str) -> bool {
        self.friend_requests.get(uid).copied().unwrap_or(false)
    }

    pub fn friend_ids(&self) -> impl Iterator<Item = &str> {
        self.friends
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| id.as_str())
    }

    pub fn requester_ids(&self) -> impl Iterator<Item = &str> {
        self.friend_requests
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| id.as_str())
    }

    /// Name shown next to comments and in search results.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case_with_missing_sets() {
        let json = serde_json::json!({
            "uid": "u1",
            "username": "munchy",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "foodPreference": "vegan"
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.food_preference, "vegan");
        assert!(user.friends.is_empty());
        assert!(user.friend_requests.is_empty());
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_friend_edges_ignore_false_entries() {
        let mut user = User::default();
        user.friends.insert("a".to_string(), true);
        user.friends.insert("b".to_string(), false);
        assert!(user.is_friend("a"));
        assert!(!user.is_friend("b"));
        assert_eq!(user.friend_ids().collect::<Vec<_>>(), vec!["a"]);
    }
}
