// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screen modules.
//!
//! Every screen follows the same shape: `mount()` issues its reads and fills
//! view state, user actions validate locally and then write. A failed action
//! sets `notice` to a user-facing message and leaves earlier view state as it
//! was. Remote calls run inside the screen's `ScreenScope`, so nothing is
//! applied once the screen has been unmounted.

pub mod add_friends;
pub mod comments;
pub mod login;
pub mod main_feed;
pub mod pending_requests;
pub mod profile;
pub mod signup;
pub mod view_profile;

pub use add_friends::AddFriendsScreen;
pub use comments::CommentsScreen;
pub use login::LoginScreen;
pub use main_feed::MainFeedScreen;
pub use pending_requests::PendingRequestsScreen;
pub use profile::ProfileScreen;
pub use signup::SignupScreen;
pub use view_profile::ViewProfileScreen;

use crate::cancel::OrCancelExt;
use crate::db::{paths, RecordChange};
use crate::error::{AppError, Result};
use crate::models::Timestamped;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Lifetime of a mounted screen.
///
/// Cancelled on `unmount()` or drop; every remote call and periodic sweep the
/// screen starts is bound to it.
#[derive(Debug, Default)]
pub struct ScreenScope {
    token: CancellationToken,
}

impl ScreenScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for work owned by this screen (sweepers, streams).
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn unmount(&self) {
        self.token.cancel();
    }

    pub fn is_unmounted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run a remote call, failing with `AppError::Cancelled` after unmount.
    pub async fn run<F, T>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
        T: Send,
    {
        if self.is_unmounted() {
            return Err(AppError::Cancelled);
        }
        call.or_cancel(&self.token).await?
    }
}

impl Drop for ScreenScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Record `err` in a screen's notice slot and hand it back.
///
/// Cancellation is silent: an unmounted screen has nothing to show.
pub(crate) fn report(notice: &mut Option<String>, err: AppError) -> AppError {
    if !matches!(err, AppError::Cancelled) {
        *notice = Some(err.user_message());
    }
    err
}

/// Apply a change under `parent` to a list of child records keyed by id.
///
/// Returns `false` when the change touched a field inside a child, in which
/// case the caller must reload the list.
pub(crate) fn apply_change<T>(items: &mut Vec<T>, parent: &str, change: RecordChange) -> bool
where
    T: DeserializeOwned + Timestamped,
{
    let parent_segs = paths::segments(parent);
    let segs = paths::segments(&change.path);
    if !segs.starts_with(&parent_segs) {
        // A change above the parent replaced it wholesale.
        return false;
    }

    match &segs[parent_segs.len()..] {
        [] => {
            items.clear();
            if let Some(Value::Object(children)) = change.data {
                for (key, value) in children {
                    match serde_json::from_value(value) {
                        Ok(item) => items.push(item),
                        Err(e) => tracing::warn!(parent, key = %key, error = %e, "Skipping malformed change"),
                    }
                }
            }
            true
        }
        [id] => {
            items.retain(|item| item.id() != *id);
            if let Some(value) = change.data {
                match serde_json::from_value(value) {
                    Ok(item) => items.push(item),
                    Err(e) => tracing::warn!(parent, id = %id, error = %e, "Skipping malformed change"),
                }
            }
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileComment;
    use serde_json::json;

    fn comment(id: &str, ts: i64) -> ProfileComment {
        ProfileComment {
            id: id.to_string(),
            text: "nice".to_string(),
            username: "bob".to_string(),
            timestamp: ts,
        }
    }

    #[tokio::test]
    async fn test_scope_run_after_unmount_is_cancelled() {
        let scope = ScreenScope::new();
        assert_eq!(scope.run(async { Ok(1) }).await.unwrap(), 1);
        scope.unmount();
        assert!(matches!(
            scope.run(async { Ok(2) }).await,
            Err(AppError::Cancelled)
        ));
    }

    #[test]
    fn test_report_skips_cancellation() {
        let mut notice = None;
        report(&mut notice, AppError::Cancelled);
        assert!(notice.is_none());
        report(&mut notice, AppError::AlreadyPostedToday);
        assert!(notice.is_some());
    }

    #[test]
    fn test_apply_change_child_upsert_and_remove() {
        let mut items = vec![comment("c1", 1)];
        let added = RecordChange {
            path: "profileComments/u1/c2".to_string(),
            data: Some(serde_json::to_value(comment("c2", 2)).unwrap()),
        };
        assert!(apply_change(&mut items, "profileComments/u1", added));
        assert_eq!(items.len(), 2);

        let removed = RecordChange {
            path: "profileComments/u1/c1".to_string(),
            data: None,
        };
        assert!(apply_change(&mut items, "profileComments/u1", removed));
        assert_eq!(items, vec![comment("c2", 2)]);
    }

    #[test]
    fn test_apply_change_whole_parent_and_nested_field() {
        let mut items = vec![comment("old", 1)];
        let replaced = RecordChange {
            path: "profileComments/u1".to_string(),
            data: Some(json!({"c3": comment("c3", 3)})),
        };
        assert!(apply_change(&mut items, "profileComments/u1", replaced));
        assert_eq!(items, vec![comment("c3", 3)]);

        let nested = RecordChange {
            path: "profileComments/u1/c3/text".to_string(),
            data: Some(json!("edited")),
        };
        assert!(!apply_change(&mut items, "profileComments/u1", nested));
    }
}
