// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use relay_cdc::{CdcError, NotificationSource, NotificationStream};
use tokio::sync::{broadcast, watch};

/// In-process stand-in for LISTEN/NOTIFY.
///
/// Like the real thing, a notification is only seen by sessions that are
/// listening when it is sent; with no session open it is lost.
pub struct MemoryNotificationSource {
	notifications: broadcast::Sender<String>,
	sessions: watch::Sender<u64>,
	refuse: AtomicBool,
	connects: AtomicUsize,
}

impl Default for MemoryNotificationSource {
	fn default() -> Self {
		let (notifications, _) = broadcast::channel(1024);
		let (sessions, _) = watch::channel(0);
		Self {
			notifications,
			sessions,
			refuse: AtomicBool::new(false),
			connects: AtomicUsize::new(0),
		}
	}
}

impl MemoryNotificationSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Send a payload. Returns the number of open sessions that received it.
	pub fn notify(&self, payload: impl Into<String>) -> usize {
		self.notifications.send(payload.into()).unwrap_or(0)
	}

	/// End every open session, as if the database connection dropped.
	pub fn disconnect(&self) {
		self.sessions.send_modify(|generation| *generation += 1);
	}

	/// Make subsequent connection attempts fail (or succeed again).
	pub fn refuse_connections(&self, refuse: bool) {
		self.refuse.store(refuse, Ordering::SeqCst);
	}

	/// Number of successful connection attempts so far.
	pub fn connects(&self) -> usize {
		self.connects.load(Ordering::SeqCst)
	}

	pub fn listeners(&self) -> usize {
		self.notifications.receiver_count()
	}
}

#[async_trait]
impl NotificationSource for MemoryNotificationSource {
	async fn connect(&self, _channel: &str) -> Result<NotificationStream, CdcError> {
		if self.refuse.load(Ordering::SeqCst) {
			return Err(CdcError::Connect("connection refused".to_string()));
		}
		self.connects.fetch_add(1, Ordering::SeqCst);

		let notifications = self.notifications.subscribe();
		let sessions = self.sessions.subscribe();

		let stream = stream::unfold((notifications, sessions), |(mut notifications, mut sessions)| async move {
			loop {
				tokio::select! {
					_ = sessions.changed() => return None,
					received = notifications.recv() => match received {
						Ok(payload) => return Some((Ok(payload), (notifications, sessions))),
						Err(broadcast::error::RecvError::Lagged(_)) => continue,
						Err(broadcast::error::RecvError::Closed) => return None,
					},
				}
			}
		});
		Ok(stream.boxed())
	}
}
