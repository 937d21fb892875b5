// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! WebSocket endpoint for the channel protocol.
//!
//! The socket layer only moves text frames between tokio-tungstenite and the
//! [`ChannelServer`](relay_subscription::ChannelServer), and keeps the socket
//! alive with server pings. Joins, presence and change delivery all live in
//! `relay-subscription`.
//!
//! Credentials are read once, during the upgrade: `Authorization: Bearer`,
//! then the `access_token` or `apikey` query parameter, then the `apikey`
//! header. A client may replace its identity later with an `access_token`
//! frame.

pub mod handler;
pub mod subsystem;

pub use handler::{credential_from_request, handle_connection};
pub use subsystem::WsSubsystem;
