// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cancellation-aware futures for screen-scoped remote calls.

use crate::error::AppError;
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Extension trait racing a future against a `CancellationToken`.
#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    /// Returns `Err(AppError::Cancelled)` if the token fires first.
    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, AppError>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, AppError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(AppError::Cancelled),
            res = self => Ok(res),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn returns_ok_when_future_completes_first() {
        let token = CancellationToken::new();
        let value = async { 42 }.or_cancel(&token).await;
        assert_eq!(value.unwrap(), 42);
    }

    #[tokio::test]
    async fn returns_cancelled_when_token_already_fired() {
        let token = CancellationToken::new();
        token.cancel();
        let result = tokio::time::sleep(Duration::from_secs(5))
            .or_cancel(&token)
            .await;
        assert!(matches!(result, Err(AppError::Cancelled)));
    }
}
