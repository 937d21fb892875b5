// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Multiplexed pub/sub over one socket: topic joins with change filters,
//! per-topic presence and fan-out of change events.
//!
//! Everything here is transport agnostic and lives in one process. Running
//! several instances without an external fan-out splits presence and
//! subscription visibility between them.

pub mod error;
pub mod filter;
pub mod presence;
pub mod protocol;
pub mod registry;
pub mod server;

pub use error::ChannelError;
pub use filter::{ChangeFilter, ColumnFilter, ColumnOperator};
pub use presence::{PresenceDiff, PresenceTable};
pub use protocol::{ClientEvent, Frame, ReplyStatus, event};
pub use registry::{ConnectionId, ConnectionRegistry, Subscription};
pub use server::{ChannelConfig, ChannelServer, TopicState};
