// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	time::Duration,
};

use futures_util::StreamExt;
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{event::ChangeEvent, sink::ChangeSink, source::NotificationSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
	/// Notification channel passed to `LISTEN`.
	pub channel: String,
	/// Fixed wait between a lost connection and the next attempt.
	pub reconnect_delay: Duration,
}

impl Default for ListenerConfig {
	fn default() -> Self {
		Self {
			channel: "relay_changes".to_string(),
			reconnect_delay: Duration::from_millis(5000),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
	Disconnected,
	Connecting,
	Listening,
}

impl Display for ListenerState {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			ListenerState::Disconnected => "disconnected",
			ListenerState::Connecting => "connecting",
			ListenerState::Listening => "listening",
		})
	}
}

/// Holds one LISTEN session and hands every decoded event to a sink.
///
/// On connection loss the listener returns to `Disconnected`, waits
/// `reconnect_delay` and connects again. Notifications emitted while no
/// session is open are never seen.
pub struct CdcListener {
	config: ListenerConfig,
	source: Arc<dyn NotificationSource>,
	sink: Arc<dyn ChangeSink>,
	state: Arc<watch::Sender<ListenerState>>,
	running: Arc<AtomicBool>,
	worker: Option<JoinHandle<()>>,
}

impl CdcListener {
	pub fn new(config: ListenerConfig, source: Arc<dyn NotificationSource>, sink: Arc<dyn ChangeSink>) -> Self {
		let (state, _) = watch::channel(ListenerState::Disconnected);
		Self {
			config,
			source,
			sink,
			state: Arc::new(state),
			running: Arc::new(AtomicBool::new(false)),
			worker: None,
		}
	}

	pub fn state(&self) -> ListenerState {
		*self.state.borrow()
	}

	/// Observe state transitions.
	pub fn watch_state(&self) -> watch::Receiver<ListenerState> {
		self.state.subscribe()
	}

	pub fn start(&mut self) {
		if self.running.swap(true, Ordering::AcqRel) {
			return;
		}

		self.worker = Some(tokio::spawn(listen_loop(
			self.config.clone(),
			Arc::clone(&self.source),
			Arc::clone(&self.sink),
			Arc::clone(&self.state),
			Arc::clone(&self.running),
		)));
	}

	pub fn stop(&mut self) {
		if !self.running.swap(false, Ordering::AcqRel) {
			return;
		}

		if let Some(worker) = self.worker.take() {
			worker.abort();
		}
		self.state.send_replace(ListenerState::Disconnected);
		info!(channel = %self.config.channel, "change feed listener stopped");
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::Acquire)
	}
}

impl Drop for CdcListener {
	fn drop(&mut self) {
		if let Some(worker) = self.worker.take() {
			worker.abort();
		}
	}
}

async fn listen_loop(
	config: ListenerConfig,
	source: Arc<dyn NotificationSource>,
	sink: Arc<dyn ChangeSink>,
	state: Arc<watch::Sender<ListenerState>>,
	running: Arc<AtomicBool>,
) {
	while running.load(Ordering::Acquire) {
		transition(&state, ListenerState::Connecting);

		match source.connect(&config.channel).await {
			Ok(mut notifications) => {
				transition(&state, ListenerState::Listening);
				info!(channel = %config.channel, "listening for change notifications");

				while let Some(item) = notifications.next().await {
					match item {
						Ok(payload) => match ChangeEvent::parse(&payload) {
							Ok(event) => sink.dispatch(event),
							Err(err) => warn!(error = %err, "dropping change notification"),
						},
						Err(err) => {
							warn!(error = %err, "change feed interrupted");
							break;
						}
					}
				}
			}
			Err(err) => warn!(error = %err, channel = %config.channel, "change feed connection attempt failed"),
		}

		transition(&state, ListenerState::Disconnected);
		if !running.load(Ordering::Acquire) {
			break;
		}
		debug!(delay = ?config.reconnect_delay, "reconnecting change feed");
		sleep(config.reconnect_delay).await;
	}
}

fn transition(state: &watch::Sender<ListenerState>, next: ListenerState) {
	let previous = state.send_replace(next);
	if previous != next {
		debug!(from = %previous, to = %next, "change feed listener state");
	}
}
