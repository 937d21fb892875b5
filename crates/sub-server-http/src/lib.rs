// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! HTTP subsystem: a PostgREST-style table and RPC dialect over axum.
//!
//! # Endpoints
//!
//! - `GET /health`
//! - `GET | HEAD | POST | PATCH | DELETE {prefix}/{table}`
//! - `GET | POST {prefix}/rpc/{function}`
//!
//! Errors are JSON bodies of the shape `{message, error, code, details, hint}`.

pub mod error;
pub mod handlers;
pub mod prefer;
pub mod routes;
pub mod subsystem;

pub use error::{AppError, ErrorResponse};
pub use prefer::{Preferences, ReturnPreference};
pub use routes::router;
pub use subsystem::HttpSubsystem;
