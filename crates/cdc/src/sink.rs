// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::event::ChangeEvent;

/// Receives every decoded change event, in notification order.
///
/// Called from the listener task, so implementations must not block.
pub trait ChangeSink: Send + Sync + 'static {
	fn dispatch(&self, event: ChangeEvent);
}
