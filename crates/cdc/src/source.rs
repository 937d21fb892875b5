// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use async_trait::async_trait;
use futures_util::{
	StreamExt,
	stream::{self, BoxStream},
};
use tokio::sync::mpsc;
use tokio_postgres::{AsyncMessage, NoTls};
use tracing::{debug, warn};

use crate::error::CdcError;

/// Raw notification payloads. The stream ends, or yields an error, when the
/// underlying connection is lost.
pub type NotificationStream = BoxStream<'static, Result<String, CdcError>>;

/// Something that can open a LISTEN session on a channel.
#[async_trait]
pub trait NotificationSource: Send + Sync + 'static {
	async fn connect(&self, channel: &str) -> Result<NotificationStream, CdcError>;
}

/// A dedicated (unpooled) PostgreSQL connection running `LISTEN`.
#[derive(Debug, Clone)]
pub struct PgNotificationSource {
	url: String,
}

impl PgNotificationSource {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
		}
	}
}

#[async_trait]
impl NotificationSource for PgNotificationSource {
	async fn connect(&self, channel: &str) -> Result<NotificationStream, CdcError> {
		let (client, mut connection) =
			tokio_postgres::connect(&self.url, NoTls).await.map_err(|e| CdcError::Connect(e.to_string()))?;

		let (tx, rx) = mpsc::unbounded_channel();
		tokio::spawn(async move {
			let mut messages = stream::poll_fn(move |cx| connection.poll_message(cx));
			while let Some(message) = messages.next().await {
				match message {
					Ok(AsyncMessage::Notification(notification)) => {
						if tx.send(Ok(notification.payload().to_string())).is_err() {
							break;
						}
					}
					Ok(AsyncMessage::Notice(notice)) => debug!(notice = %notice, "notice on change feed connection"),
					Ok(_) => {}
					Err(e) => {
						warn!(error = %e, "change feed connection failed");
						let _ = tx.send(Err(CdcError::Connection(e.to_string())));
						break;
					}
				}
			}
		});

		client.batch_execute(&format!("LISTEN {}", quote(channel))).await.map_err(|e| CdcError::Listen {
			channel: channel.to_string(),
			reason: e.to_string(),
		})?;

		// The client lives inside the stream state so the session stays open
		// for as long as the listener holds the stream.
		let notifications = stream::unfold((client, rx), |(client, mut rx)| async move {
			let item = rx.recv().await?;
			Some((item, (client, rx)))
		});
		Ok(notifications.boxed())
	}
}

fn quote(channel: &str) -> String {
	format!("\"{}\"", channel.replace('"', "\"\""))
}
