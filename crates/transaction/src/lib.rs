// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Transactional execution of compiled statements.
//!
//! Each request checks out one pooled connection, opens a transaction, projects
//! the caller's [`Identity`](relay_auth::Identity) into transaction-local
//! settings, runs the compiled statements and commits, or rolls back on any
//! failure before the connection goes back to the pool.

mod bind;
mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod rpc;
pub mod session;

pub use config::{DatabaseConfig, QueryConfig, SessionConfig};
pub use error::TxnError;
pub use executor::{Executor, Operation, Outcome};
pub use rpc::unwrap_scalar;
