// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc, OnceLock,
	atomic::{AtomicU64, Ordering},
};

use relay_auth::{Identity, IdentityExtractor};
use relay_cdc::{ChangeEvent, ChangeSink, ListenerState};
use serde_json::{Map, Value, json};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::{
	error::ChannelError,
	filter::ChangeFilter,
	presence::{PresenceDiff, PresenceTable},
	protocol::{ClientEvent, Frame, JoinPayload, event},
	registry::{ConnectionId, ConnectionRegistry, Subscription},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
	/// Frames queued per connection before new ones are dropped.
	pub push_capacity: usize,
}

impl Default for ChannelConfig {
	fn default() -> Self {
		Self {
			push_capacity: 256,
		}
	}
}

/// Lifecycle of one topic on one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicState {
	Joined,
	Left,
}

/// Channel protocol state machine shared by every socket of the process.
///
/// Transports feed it client text with [`ChannelServer::handle_text`] and
/// drain the receiver returned by [`ChannelServer::connect`]. Replies,
/// presence frames and change events all arrive on that receiver.
pub struct ChannelServer {
	config: ChannelConfig,
	registry: ConnectionRegistry,
	presence: PresenceTable,
	extractor: Arc<IdentityExtractor>,
	feed: OnceLock<watch::Receiver<ListenerState>>,
	next_filter: AtomicU64,
}

impl ChannelServer {
	pub fn new(config: ChannelConfig, extractor: Arc<IdentityExtractor>) -> Self {
		Self {
			config,
			registry: ConnectionRegistry::new(),
			presence: PresenceTable::new(),
			extractor,
			feed: OnceLock::new(),
			next_filter: AtomicU64::new(1),
		}
	}

	/// Report change feed liveness in the `system` frame sent on join.
	/// Without a feed every join with change filters is told it is down.
	pub fn attach_feed(&self, feed: watch::Receiver<ListenerState>) {
		if self.feed.set(feed).is_err() {
			warn!("change feed state already attached");
		}
	}

	pub fn connect(&self, identity: Identity) -> (ConnectionId, mpsc::Receiver<Frame>) {
		let (tx, rx) = mpsc::channel(self.config.push_capacity);
		(self.registry.register(identity, tx), rx)
	}

	/// Drop the connection with all of its subscriptions and presence.
	pub fn disconnect(&self, connection: ConnectionId) {
		let Some(state) = self.registry.remove(connection) else {
			return;
		};
		for subscription in state.channels.values() {
			self.release(connection, subscription);
		}
		debug!(%connection, topics = state.channels.len(), "channel connection closed");
	}

	/// Handle one text frame. Malformed frames and unknown events are
	/// logged and dropped without a reply.
	pub fn handle_text(&self, connection: ConnectionId, text: &str) {
		let frame = match Frame::parse(text) {
			Ok(frame) => frame,
			Err(err) => {
				warn!(%connection, error = %err, "dropping malformed frame");
				return;
			}
		};

		if let Err(err) = self.handle_frame(connection, &frame) {
			if err.is_protocol() {
				warn!(%connection, error = %err, "dropping frame");
			} else {
				debug!(%connection, topic = %frame.topic, error = %err, "rejecting frame");
				self.registry.send(connection, Frame::reply_error(&frame, &err));
			}
		}
	}

	pub fn handle_frame(&self, connection: ConnectionId, frame: &Frame) -> Result<(), ChannelError> {
		match ClientEvent::from_frame(frame)? {
			ClientEvent::Heartbeat => {
				self.reply(connection, frame, json!({}));
			}
			ClientEvent::AccessToken(token) => {
				self.attach(connection, token.as_deref());
				self.reply(connection, frame, json!({}));
			}
			ClientEvent::Join(payload) => self.join(connection, frame, payload)?,
			ClientEvent::Leave => {
				let subscription = self
					.registry
					.with_connection(connection, |state| state.channels.remove(&frame.topic))
					.ok_or(ChannelError::Closed)?
					.ok_or_else(|| ChannelError::NotJoined(frame.topic.clone()))?;
				self.reply(connection, frame, json!({}));
				self.release(connection, &subscription);
			}
			ClientEvent::Track(meta) => {
				let key = self.presence_key(connection, &frame.topic)?;
				let diff = self.presence.track(&frame.topic, &key, connection, meta);
				self.reply(connection, frame, json!({}));
				self.broadcast_diff(connection, &frame.topic, &diff);
			}
			ClientEvent::Untrack => {
				let key = self.presence_key(connection, &frame.topic)?;
				let diff = self
					.presence
					.untrack(&frame.topic, &key, connection)
					.ok_or_else(|| ChannelError::NotTracked(frame.topic.clone()))?;
				self.reply(connection, frame, json!({}));
				self.broadcast_diff(connection, &frame.topic, &diff);
			}
		}
		Ok(())
	}

	fn join(&self, connection: ConnectionId, frame: &Frame, payload: JoinPayload) -> Result<(), ChannelError> {
		let topic = frame.topic.clone();

		let filters = payload
			.config
			.postgres_changes
			.iter()
			.map(|spec| ChangeFilter::from_spec(self.next_filter.fetch_add(1, Ordering::Relaxed), spec))
			.collect::<Result<Vec<_>, _>>()?;

		let presence_key = match payload.config.presence.key.trim() {
			"" => connection.to_string(),
			key => key.to_string(),
		};

		let response = json!({
			"postgres_changes": filters.iter().map(ChangeFilter::describe).collect::<Vec<_>>(),
		});
		let wants_changes = !filters.is_empty();

		let subscription = Subscription {
			topic: topic.clone(),
			filters,
			presence_key,
		};
		self.registry
			.with_connection(connection, |state| {
				if state.channels.contains_key(&topic) {
					return Err(ChannelError::AlreadyJoined(topic.clone()));
				}
				state.channels.insert(topic.clone(), subscription);
				Ok(())
			})
			.ok_or(ChannelError::Closed)??;

		if let Some(token) = payload.access_token.as_deref() {
			self.attach(connection, Some(token));
		}

		debug!(%connection, %topic, "joined");
		self.reply(connection, frame, response);
		self.registry.send(connection, Frame::push(topic.clone(), event::PRESENCE_STATE, self.presence.snapshot(&topic)));

		if wants_changes {
			self.registry.send(connection, Frame::push(topic, event::SYSTEM, self.feed_status()));
		}
		Ok(())
	}

	fn feed_status(&self) -> Value {
		let live = self.feed.get().is_some_and(|feed| *feed.borrow() == ListenerState::Listening);
		if live {
			json!({
				"extension": "postgres_changes",
				"status": "ok",
				"message": "Subscribed to PostgreSQL",
			})
		} else {
			json!({
				"extension": "postgres_changes",
				"status": "error",
				"message": "Change feed is not connected; events will resume once it reconnects",
			})
		}
	}

	/// Best effort: a rejected credential leaves the current identity.
	fn attach(&self, connection: ConnectionId, token: Option<&str>) {
		let Some(token) = token else {
			return;
		};
		match self.extractor.verify(token) {
			Ok(identity) => {
				debug!(%connection, role = %identity.role, "identity attached");
				self.registry.with_connection(connection, |state| state.identity = identity);
			}
			Err(err) => warn!(%connection, error = %err, "ignoring rejected access token"),
		}
	}

	fn presence_key(&self, connection: ConnectionId, topic: &str) -> Result<String, ChannelError> {
		self.registry
			.with_connection(connection, |state| state.channels.get(topic).map(|s| s.presence_key.clone()))
			.ok_or(ChannelError::Closed)?
			.ok_or_else(|| ChannelError::NotJoined(topic.to_string()))
	}

	fn release(&self, connection: ConnectionId, subscription: &Subscription) {
		if let Some(diff) = self.presence.untrack(&subscription.topic, &subscription.presence_key, connection) {
			self.broadcast_diff(connection, &subscription.topic, &diff);
		}
	}

	/// Diffs go to the other subscribers of the topic, never back to `origin`.
	fn broadcast_diff(&self, origin: ConnectionId, topic: &str, diff: &PresenceDiff) {
		if diff.is_empty() {
			return;
		}
		self.registry.broadcast(topic, &Frame::push(topic, event::PRESENCE_DIFF, diff.to_json()), Some(origin));
	}

	fn reply(&self, connection: ConnectionId, request: &Frame, response: Value) {
		self.registry.send(connection, Frame::reply_ok(request, response));
	}

	pub fn topic_state(&self, connection: ConnectionId, topic: &str) -> TopicState {
		let joined = self.registry.with_connection(connection, |state| state.channels.contains_key(topic));
		if joined == Some(true) {
			TopicState::Joined
		} else {
			TopicState::Left
		}
	}

	pub fn identity(&self, connection: ConnectionId) -> Option<Identity> {
		self.registry.with_connection(connection, |state| state.identity.clone())
	}

	/// Current presence of a topic.
	pub fn presence(&self, topic: &str) -> Map<String, Value> {
		match self.presence.snapshot(topic) {
			Value::Object(map) => map,
			_ => Map::new(),
		}
	}

	pub fn connection_count(&self) -> usize {
		self.registry.len()
	}

	/// Fan a change event out to matching subscriptions. Returns the
	/// number of connections it was delivered to.
	pub fn publish(&self, change: &ChangeEvent) -> usize {
		let delivered = self.registry.dispatch(change);
		debug!(table = %change.table, operation = %change.operation, delivered, "change dispatched");
		delivered
	}
}

impl ChangeSink for ChannelServer {
	fn dispatch(&self, event: ChangeEvent) {
		self.publish(&event);
	}
}
