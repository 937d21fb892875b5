// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Change feed: one LISTEN session on a notification channel, decoded into
//! [`ChangeEvent`]s and handed to a [`ChangeSink`].
//!
//! Delivery is best effort. Nothing is buffered while the session is down.

pub mod error;
pub mod event;
pub mod listener;
pub mod sink;
pub mod source;
pub mod subsystem;

pub use error::CdcError;
pub use event::{ChangeEvent, ChangeOperation};
pub use listener::{CdcListener, ListenerConfig, ListenerState};
pub use sink::ChangeSink;
pub use source::{NotificationSource, NotificationStream, PgNotificationSource};
pub use subsystem::CdcSubsystem;
