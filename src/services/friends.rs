// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend requests and the symmetric friendship relation.
//!
//! Per ordered (requester, target) pair the states are
//! `None -> Requested -> Accepted`. A request lives at
//! `users/{target}/friendRequests/{requester}`; a friendship is the pair of
//! edges `users/{a}/friends/{b}` and `users/{b}/friends/{a}`.

use crate::db::{paths, Records};
use crate::error::{AppError, Result};

/// Relationship of `a` towards `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendState {
    None,
    /// `a` has asked `b` and `b` has not accepted yet
    Requested,
    /// `b` has asked `a`
    RequestedByOther,
    Accepted,
}

/// Friend-request operations.
#[derive(Clone)]
pub struct FriendService {
    records: Records,
}

impl FriendService {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    /// Current relationship of `a` towards `b`, from `a`'s point of view.
    pub async fn relationship(&self, a: &str, b: &str) -> Result<FriendState> {
        if self.records.flag(&paths::friend_edge(a, b)).await? {
            return Ok(FriendState::Accepted);
        }
        if self.records.flag(&paths::friend_request(b, a)).await? {
            return Ok(FriendState::Requested);
        }
        if self.records.flag(&paths::friend_request(a, b)).await? {
            return Ok(FriendState::RequestedByOther);
        }
        Ok(FriendState::None)
    }

    /// `None -> Requested`: record `requester` in `target`'s pending set.
    ///
    /// Re-sending an outstanding request is a no-op write.
    pub async fn send_request(&self, requester: &str, target: &str) -> Result<()> {
        if requester == target {
            return Err(AppError::Validation(
                "You can't add yourself as a friend.".to_string(),
            ));
        }
        if self.records.flag(&paths::friend_edge(requester, target)).await? {
            return Err(AppError::Validation(
                "You're already friends.".to_string(),
            ));
        }

        self.records
            .set_flag(&paths::friend_request(target, requester), true)
            .await?;
        tracing::info!(requester, target_uid = target, "Friend request sent");
        Ok(())
    }

    /// `Requested -> Accepted`: `target` accepts `requester`'s request.
    ///
    /// Writes both edges, then clears the request. If the second edge fails
    /// the first is rolled back. If clearing the request fails the friendship
    /// stands and `PartialFailure` is returned; accepting again finishes it.
    pub async fn accept_request(&self, target: &str, requester: &str) -> Result<()> {
        let pending = self
            .records
            .flag(&paths::friend_request(target, requester))
            .await?;
        let already = self
            .records
            .flag(&paths::friend_edge(target, requester))
            .await?;
        if !pending && !already {
            return Err(AppError::NotFound(format!(
                "Friend request from {}",
                requester
            )));
        }

        self.records
            .set_flag(&paths::friend_edge(target, requester), true)
            .await?;

        if let Err(e) = self
            .records
            .set_flag(&paths::friend_edge(requester, target), true)
            .await
        {
            tracing::warn!(target_uid = target, requester, error = %e, "Second friend edge failed; rolling back");
            if !already {
                if let Err(rollback) = self
                    .records
                    .set_flag(&paths::friend_edge(target, requester), false)
                    .await
                {
                    tracing::error!(
                        target_uid = target,
                        requester,
                        error = %rollback,
                        "Rollback failed; friendship left one-directional"
                    );
                    return Err(AppError::PartialFailure(format!(
                        "one-directional friendship {} -> {}",
                        target, requester
                    )));
                }
            }
            return Err(e);
        }

        if let Err(e) = self
            .records
            .set_flag(&paths::friend_request(target, requester), false)
            .await
        {
            tracing::warn!(target_uid = target, requester, error = %e, "Friendship saved but request not cleared");
            return Err(AppError::PartialFailure(format!(
                "request from {} not cleared",
                requester
            )));
        }

        tracing::info!(target_uid = target, requester, "Friend request accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryRecordStore, StoreOp};
    use std::sync::Arc;

    fn service() -> (Arc<MemoryRecordStore>, FriendService) {
        let store = Arc::new(MemoryRecordStore::new());
        (store.clone(), FriendService::new(Records::new(store)))
    }

    #[tokio::test]
    async fn test_request_then_accept() {
        let (_, friends) = service();
        assert_eq!(friends.relationship("a", "b").await.unwrap(), FriendState::None);

        friends.send_request("a", "b").await.unwrap();
        assert_eq!(
            friends.relationship("a", "b").await.unwrap(),
            FriendState::Requested
        );
        assert_eq!(
            friends.relationship("b", "a").await.unwrap(),
            FriendState::RequestedByOther
        );

        friends.accept_request("b", "a").await.unwrap();
        assert_eq!(
            friends.relationship("a", "b").await.unwrap(),
            FriendState::Accepted
        );
        assert_eq!(
            friends.relationship("b", "a").await.unwrap(),
            FriendState::Accepted
        );
    }

    #[tokio::test]
    async fn test_send_request_to_self_rejected() {
        let (_, friends) = service();
        assert!(matches!(
            friends.send_request("a", "a").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_accept_without_request_is_not_found() {
        let (_, friends) = service();
        assert!(matches!(
            friends.accept_request("b", "a").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_second_edge_failure_rolls_back() {
        let (store, friends) = service();
        friends.send_request("a", "b").await.unwrap();
        store.fail_on(StoreOp::Write, "users/a/friends");

        assert!(friends.accept_request("b", "a").await.is_err());
        store.clear_failures();

        // No one-directional edge, request still pending.
        assert_eq!(
            friends.relationship("b", "a").await.unwrap(),
            FriendState::RequestedByOther
        );
    }

    #[tokio::test]
    async fn test_request_clear_failure_is_partial_and_retryable() {
        let (store, friends) = service();
        friends.send_request("a", "b").await.unwrap();
        store.fail_once(StoreOp::Remove, "users/b/friendRequests");

        assert!(matches!(
            friends.accept_request("b", "a").await,
            Err(AppError::PartialFailure(_))
        ));
        assert_eq!(
            friends.relationship("a", "b").await.unwrap(),
            FriendState::Accepted
        );

        friends.accept_request("b", "a").await.unwrap();
        let records = Records::new(store);
        assert!(!records
            .flag(&paths::friend_request("b", "a"))
            .await
            .unwrap());
    }
}
