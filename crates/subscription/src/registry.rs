// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Live connections and the topics each one has joined.

use std::collections::HashMap;

use dashmap::DashMap;
use relay_auth::Identity;
use relay_cdc::ChangeEvent;
use serde_json::json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
	filter::ChangeFilter,
	protocol::{Frame, event},
};

pub type ConnectionId = Uuid;

/// A joined topic.
#[derive(Debug, Clone)]
pub struct Subscription {
	pub topic: String,
	pub filters: Vec<ChangeFilter>,
	pub presence_key: String,
}

impl Subscription {
	fn matching_filter(&self, event: &ChangeEvent) -> Option<u64> {
		self.filters.iter().find(|f| f.matches(event)).map(|f| f.id)
	}
}

pub struct ConnectionState {
	outbound: mpsc::Sender<Frame>,
	pub identity: Identity,
	pub channels: HashMap<String, Subscription>,
}

impl ConnectionState {
	fn send(&self, connection: ConnectionId, frame: Frame) -> bool {
		match self.outbound.try_send(frame) {
			Ok(()) => true,
			Err(TrySendError::Full(frame)) => {
				warn!(%connection, topic = %frame.topic, event = %frame.event, "push channel full, dropping frame");
				false
			}
			Err(TrySendError::Closed(_)) => {
				debug!(%connection, "push channel closed");
				false
			}
		}
	}
}

/// Every open connection, keyed by id.
///
/// Each connection's entry is only mutated from its own handler; fan-out
/// paths take read access.
#[derive(Default)]
pub struct ConnectionRegistry {
	connections: DashMap<ConnectionId, ConnectionState>,
}

impl ConnectionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, identity: Identity, outbound: mpsc::Sender<Frame>) -> ConnectionId {
		let connection = Uuid::now_v7();
		self.connections.insert(
			connection,
			ConnectionState {
				outbound,
				identity,
				channels: HashMap::new(),
			},
		);
		debug!(%connection, "registered channel connection");
		connection
	}

	pub fn remove(&self, connection: ConnectionId) -> Option<ConnectionState> {
		self.connections.remove(&connection).map(|(_, state)| state)
	}

	/// Run `f` against the connection's state. `None` if it is gone.
	///
	/// Do not call back into the registry from `f`.
	pub fn with_connection<R>(&self, connection: ConnectionId, f: impl FnOnce(&mut ConnectionState) -> R) -> Option<R> {
		self.connections.get_mut(&connection).map(|mut state| f(&mut state))
	}

	pub fn send(&self, connection: ConnectionId, frame: Frame) -> bool {
		match self.connections.get(&connection) {
			Some(state) => state.send(connection, frame),
			None => false,
		}
	}

	/// Send `frame` to every connection joined to `topic` other than
	/// `except`. Returns the number of connections it was queued for.
	pub fn broadcast(&self, topic: &str, frame: &Frame, except: Option<ConnectionId>) -> usize {
		let mut delivered = 0;
		for entry in self.connections.iter() {
			if Some(*entry.key()) == except {
				continue;
			}
			if entry.channels.contains_key(topic) && entry.send(*entry.key(), frame.clone()) {
				delivered += 1;
			}
		}
		delivered
	}

	/// Deliver a change event at most once per connection: the first
	/// subscription with a matching filter wins.
	pub fn dispatch(&self, change: &ChangeEvent) -> usize {
		let mut delivered = 0;
		for entry in self.connections.iter() {
			let matched = entry
				.channels
				.values()
				.find_map(|subscription| subscription.matching_filter(change).map(|id| (subscription, id)));

			if let Some((subscription, id)) = matched {
				let frame = Frame::push(
					subscription.topic.clone(),
					event::POSTGRES_CHANGES,
					json!({
						"ids": [id],
						"data": change,
					}),
				);
				if entry.send(*entry.key(), frame) {
					delivered += 1;
				}
			}
		}
		delivered
	}

	pub fn len(&self) -> usize {
		self.connections.len()
	}

	pub fn is_empty(&self) -> bool {
		self.connections.is_empty()
	}
}
