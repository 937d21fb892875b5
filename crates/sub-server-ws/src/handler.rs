// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use futures_util::{SinkExt, StreamExt};
use relay_auth::bearer_token;
use relay_sub_server::AppState;
use tokio::{
	net::TcpStream,
	sync::watch,
	time::{MissedTickBehavior, interval},
};
use tokio_tungstenite::{
	accept_hdr_async,
	tungstenite::{
		Message,
		handshake::server::{ErrorResponse, Request, Response},
	},
};
use tracing::{debug, warn};

/// Credential carried by the upgrade request, if any. Query values are
/// percent-decoded.
pub fn credential_from_request(request: &Request) -> Option<String> {
	let header = |name: &str| request.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_string);

	if let Some(token) = header("authorization").as_deref().and_then(bearer_token) {
		return Some(token.to_string());
	}

	let query = request.uri().query().unwrap_or_default();
	let param = |name: &str| {
		form_urlencoded::parse(query.as_bytes()).find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
	};

	param("access_token")
		.or_else(|| param("apikey"))
		.or_else(|| header("apikey"))
		.filter(|credential| !credential.is_empty())
}

/// Serve one socket until the client leaves, misses a pong or the server
/// shuts down. The connection's subscriptions and presence are dropped on
/// every exit path.
pub async fn handle_connection(stream: TcpStream, state: AppState, mut shutdown: watch::Receiver<bool>) {
	let peer = stream.peer_addr().ok();

	let mut credential = None;
	let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
		credential = credential_from_request(request);
		Ok(response)
	};

	let socket = match accept_hdr_async(stream, callback).await {
		Ok(socket) => socket,
		Err(e) => {
			debug!(?peer, "WebSocket handshake failed: {}", e);
			return;
		}
	};

	let channels = state.channels().clone();
	let identity = state.identify(credential.as_deref());
	let (connection, mut outbound) = channels.connect(identity);
	debug!(%connection, ?peer, "WebSocket connection open");

	let (mut sink, mut source) = socket.split();

	let mut heartbeat = interval(state.config().ws.heartbeat_interval);
	heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
	// The first tick completes immediately.
	heartbeat.tick().await;
	let mut awaiting_pong = false;

	loop {
		tokio::select! {
			biased;

			changed = shutdown.changed() => {
				if changed.is_err() || *shutdown.borrow() {
					let _ = sink.close().await;
					break;
				}
			}

			message = source.next() => {
				match message {
					Some(Ok(Message::Text(text))) => channels.handle_text(connection, text.as_str()),
					Some(Ok(Message::Pong(_))) => awaiting_pong = false,
					Some(Ok(Message::Close(_))) | None => break,
					// Pings are answered by tungstenite; binary frames are not part of the protocol.
					Some(Ok(_)) => {}
					Some(Err(e)) => {
						debug!(%connection, "WebSocket read error: {}", e);
						break;
					}
				}
			}

			frame = outbound.recv() => {
				let Some(frame) = frame else {
					break;
				};
				if sink.send(Message::text(frame.to_text())).await.is_err() {
					break;
				}
			}

			_ = heartbeat.tick() => {
				if awaiting_pong {
					warn!(%connection, "no pong since the last ping, closing");
					let _ = sink.close().await;
					break;
				}
				awaiting_pong = true;
				if sink.send(Message::Ping(Default::default())).await.is_err() {
					break;
				}
			}
		}
	}

	channels.disconnect(connection);
	debug!(%connection, "WebSocket connection closed");
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request(uri: &str, headers: &[(&str, &str)]) -> Request {
		let mut builder = Request::builder().uri(uri);
		for (name, value) in headers {
			builder = builder.header(*name, *value);
		}
		builder.body(()).unwrap()
	}

	#[test]
	fn test_no_credential() {
		assert_eq!(credential_from_request(&request("/socket", &[])), None);
		assert_eq!(credential_from_request(&request("/socket?apikey=", &[])), None);
	}

	#[test]
	fn test_query_parameters() {
		assert_eq!(credential_from_request(&request("/socket?vsn=1.0.0&apikey=key", &[])).as_deref(), Some("key"));
		assert_eq!(
			credential_from_request(&request("/socket?apikey=key&access_token=token", &[])).as_deref(),
			Some("token")
		);
	}

	#[test]
	fn test_query_parameters_are_decoded() {
		assert_eq!(credential_from_request(&request("/socket?access_token=a%2Bb%3D", &[])).as_deref(), Some("a+b="));
		assert_eq!(credential_from_request(&request("/socket?apikey=a%20b&vsn=2", &[])).as_deref(), Some("a b"));
	}

	#[test]
	fn test_authorization_header_wins() {
		let request = request("/socket?access_token=query", &[("authorization", "Bearer header"), ("apikey", "key")]);
		assert_eq!(credential_from_request(&request).as_deref(), Some("header"));
	}

	#[test]
	fn test_apikey_header() {
		assert_eq!(credential_from_request(&request("/socket", &[("apikey", "key")])).as_deref(), Some("key"));
	}
}
