// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use parking_lot::Mutex;
use relay_cdc::{ChangeEvent, ChangeSink};

/// Keeps every dispatched event.
#[derive(Debug, Default)]
pub struct RecordingSink {
	events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<ChangeEvent> {
		self.events.lock().clone()
	}

	pub fn len(&self) -> usize {
		self.events.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.lock().is_empty()
	}
}

impl ChangeSink for RecordingSink {
	fn dispatch(&self, event: ChangeEvent) {
		self.events.lock().push(event);
	}
}
