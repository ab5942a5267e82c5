// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record models shared by the stores, policies and screens.

pub mod comment;
pub mod forms;
pub mod post;
pub mod user;

pub use comment::{PostComment, ProfileComment};
pub use forms::{ProfileForm, SignupForm};
pub use post::{PendingPurge, Post};
pub use user::User;

/// Content that carries a client-written creation timestamp.
pub trait Timestamped {
    /// Record id within its parent path
    fn id(&self) -> &str;
    /// Creation instant in epoch milliseconds
    fn timestamp_ms(&self) -> i64;
}
