// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Server context shared by the HTTP and WebSocket subsystems.
//!
//! One [`AppState`] is built at startup and cloned into every handler; there
//! are no process-wide singletons, so tests can run independent contexts side
//! by side.

pub mod config;
pub mod state;

pub use config::{LogConfig, ServerConfig, WsConfig};
pub use state::AppState;
