// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Per-topic presence, kept apart from the subscription registry.
//!
//! A topic maps presence keys to the metas tracked under them. Several
//! connections may track the same key; each contributes its own meta.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::registry::ConnectionId;

#[derive(Debug, Clone, PartialEq)]
struct Meta {
	connection: ConnectionId,
	phx_ref: String,
	fields: Map<String, Value>,
}

impl Meta {
	fn to_json(&self) -> Value {
		let mut fields = self.fields.clone();
		fields.insert("phx_ref".to_string(), Value::String(self.phx_ref.clone()));
		Value::Object(fields)
	}
}

/// `{"joins": {key: {"metas": [...]}}, "leaves": {...}}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresenceDiff {
	pub joins: Map<String, Value>,
	pub leaves: Map<String, Value>,
}

impl PresenceDiff {
	pub fn is_empty(&self) -> bool {
		self.joins.is_empty() && self.leaves.is_empty()
	}

	pub fn to_json(&self) -> Value {
		json!({
			"joins": self.joins,
			"leaves": self.leaves,
		})
	}
}

fn metas(entries: &[&Meta]) -> Value {
	json!({
		"metas": entries.iter().map(|m| m.to_json()).collect::<Vec<_>>(),
	})
}

#[derive(Debug, Default)]
pub struct PresenceTable {
	topics: Mutex<HashMap<String, HashMap<String, Vec<Meta>>>>,
}

impl PresenceTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert or replace the connection's meta under `key`.
	///
	/// Replacing yields both a leave of the previous meta and a join of the
	/// new one.
	pub fn track(&self, topic: &str, key: &str, connection: ConnectionId, fields: Map<String, Value>) -> PresenceDiff {
		let mut topics = self.topics.lock();
		let entries = topics.entry(topic.to_string()).or_default().entry(key.to_string()).or_default();

		let mut diff = PresenceDiff::default();
		if let Some(position) = entries.iter().position(|m| m.connection == connection) {
			let previous = entries.remove(position);
			diff.leaves.insert(key.to_string(), metas(&[&previous]));
		}

		let meta = Meta {
			connection,
			phx_ref: Uuid::now_v7().simple().to_string(),
			fields,
		};
		diff.joins.insert(key.to_string(), metas(&[&meta]));
		entries.push(meta);
		diff
	}

	/// Remove the connection's meta under `key`; `None` when it was not tracked.
	pub fn untrack(&self, topic: &str, key: &str, connection: ConnectionId) -> Option<PresenceDiff> {
		let mut topics = self.topics.lock();
		let keys = topics.get_mut(topic)?;
		let entries = keys.get_mut(key)?;
		let position = entries.iter().position(|m| m.connection == connection)?;
		let removed = entries.remove(position);

		if entries.is_empty() {
			keys.remove(key);
		}
		if keys.is_empty() {
			topics.remove(topic);
		}

		let mut diff = PresenceDiff::default();
		diff.leaves.insert(key.to_string(), metas(&[&removed]));
		Some(diff)
	}

	pub fn is_tracked(&self, topic: &str, key: &str, connection: ConnectionId) -> bool {
		self.topics
			.lock()
			.get(topic)
			.and_then(|keys| keys.get(key))
			.is_some_and(|entries| entries.iter().any(|m| m.connection == connection))
	}

	/// Full state of a topic, as sent in `presence_state`.
	pub fn snapshot(&self, topic: &str) -> Value {
		let topics = self.topics.lock();
		let mut state = Map::new();
		if let Some(keys) = topics.get(topic) {
			for (key, entries) in keys {
				let entries: Vec<&Meta> = entries.iter().collect();
				state.insert(key.clone(), metas(&entries));
			}
		}
		Value::Object(state)
	}

	pub fn topic_count(&self) -> usize {
		self.topics.lock().len()
	}
}
