// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - policies and remote collaborators.

pub mod blob;
pub mod expiry;
pub mod firebase_auth;
pub mod firebase_storage;
pub mod friends;
pub mod identity;
pub mod picker;
pub mod posting_limit;
pub mod validation;

pub use blob::{BlobStore, MemoryBlobStore};
pub use expiry::{ExpiryPolicy, PurgeOutcome, SweepReport, Sweeper};
pub use firebase_auth::FirebaseAuth;
pub use firebase_storage::FirebaseStorage;
pub use friends::{FriendService, FriendState};
pub use identity::{Identity, IdentityProvider, MemoryIdentityProvider, SessionToken};
pub use picker::{FilePicker, PhotoPicker, PickedPhoto, StaticPicker};
pub use posting_limit::PostingLimitPolicy;
