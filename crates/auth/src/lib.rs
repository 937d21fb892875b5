// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Identity extraction for Relay.
//!
//! Every HTTP request and every channel connection carries an optional bearer
//! credential. [`IdentityExtractor`] turns that credential into an
//! [`Identity`]. Verification failures never reject a request: they degrade to
//! the anonymous identity and the database's row security decides what that
//! identity may see.

pub mod error;
pub mod extractor;
pub mod identity;

pub use error::AuthError;
pub use extractor::{AuthConfig, Claims, IdentityExtractor, bearer_token};
pub use identity::{ANON_ROLE, AUTHENTICATED_ROLE, Identity, SERVICE_ROLE};
