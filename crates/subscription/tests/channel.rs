// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use relay_auth::{AUTHENTICATED_ROLE, AuthConfig, Identity, IdentityExtractor};
use relay_cdc::{ChangeEvent, ChangeOperation, ChangeSink, ListenerState};
use relay_subscription::{ChannelConfig, ChannelServer, ConnectionId, Frame, TopicState, event};
use relay_testing::{TEST_SECRET, sign_token};
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};

fn server() -> ChannelServer {
	let extractor = IdentityExtractor::new(&AuthConfig {
		jwt_secret: Some(TEST_SECRET.to_string()),
		..AuthConfig::default()
	});
	ChannelServer::new(ChannelConfig::default(), Arc::new(extractor))
}

fn send(server: &ChannelServer, connection: ConnectionId, topic: &str, event: &str, payload: Value) {
	let frame = json!({"topic": topic, "event": event, "payload": payload, "ref": "1"});
	server.handle_text(connection, &frame.to_string());
}

fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<Frame> {
	let mut frames = Vec::new();
	while let Ok(frame) = rx.try_recv() {
		frames.push(frame);
	}
	frames
}

fn change(operation: ChangeOperation, record: Value) -> ChangeEvent {
	ChangeEvent {
		schema: "public".to_string(),
		table: "orders".to_string(),
		operation,
		record: Some(record),
		old_record: None,
	}
}

#[tokio::test]
async fn test_join_replies_with_presence_state() {
	let server = server();
	let (connection, mut rx) = server.connect(Identity::anonymous());

	send(&server, connection, "room:1", event::JOIN, json!({}));

	let frames = drain(&mut rx);
	assert_eq!(frames.len(), 2);
	assert_eq!(frames[0].event, event::REPLY);
	assert_eq!(frames[0].payload["status"], "ok");
	assert_eq!(frames[0].reference.as_deref(), Some("1"));
	assert_eq!(frames[1].event, event::PRESENCE_STATE);
	assert_eq!(frames[1].payload, json!({}));
	assert_eq!(server.topic_state(connection, "room:1"), TopicState::Joined);
}

#[tokio::test]
async fn test_join_twice_is_rejected() {
	let server = server();
	let (connection, mut rx) = server.connect(Identity::anonymous());

	send(&server, connection, "room:1", event::JOIN, json!({}));
	drain(&mut rx);
	send(&server, connection, "room:1", "join", json!({}));

	let frames = drain(&mut rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0].payload["status"], "error");
}

#[tokio::test]
async fn test_leave() {
	let server = server();
	let (connection, mut rx) = server.connect(Identity::anonymous());

	send(&server, connection, "room:1", event::LEAVE, json!({}));
	assert_eq!(drain(&mut rx)[0].payload["status"], "error");

	send(&server, connection, "room:1", event::JOIN, json!({}));
	send(&server, connection, "room:1", event::LEAVE, json!({}));
	let frames = drain(&mut rx);
	assert_eq!(frames.last().unwrap().payload["status"], "ok");
	assert_eq!(server.topic_state(connection, "room:1"), TopicState::Left);
}

#[tokio::test]
async fn test_malformed_frames_get_no_reply() {
	let server = server();
	let (connection, mut rx) = server.connect(Identity::anonymous());

	server.handle_text(connection, "{{{");
	server.handle_text(connection, r#"{"topic":"t"}"#);
	send(&server, connection, "t", "shout", json!({}));
	assert!(drain(&mut rx).is_empty());

	send(&server, connection, "phoenix", event::HEARTBEAT, json!({}));
	let frames = drain(&mut rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0].payload["status"], "ok");
}

#[tokio::test]
async fn test_change_event_respects_column_filter() {
	let server = server();
	let (connection, mut rx) = server.connect(Identity::anonymous());

	send(
		&server,
		connection,
		"realtime:orders",
		event::JOIN,
		json!({"config": {"postgres_changes": [
			{"table": "orders", "event": "update", "filter": "user_id=eq.u1"}
		]}}),
	);
	drain(&mut rx);

	assert_eq!(server.publish(&change(ChangeOperation::Update, json!({"user_id": "u1"}))), 1);
	assert_eq!(server.publish(&change(ChangeOperation::Update, json!({"user_id": "u2"}))), 0);
	assert_eq!(server.publish(&change(ChangeOperation::Insert, json!({"user_id": "u1"}))), 0);

	let frames = drain(&mut rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0].topic, "realtime:orders");
	assert_eq!(frames[0].event, event::POSTGRES_CHANGES);
	assert_eq!(frames[0].payload["data"]["record"]["user_id"], "u1");
}

#[tokio::test]
async fn test_one_delivery_per_connection() {
	let server = server();
	let (connection, mut rx) = server.connect(Identity::anonymous());

	for topic in ["a", "b"] {
		send(&server, connection, topic, event::JOIN, json!({"config": {"postgres_changes": [{"table": "orders"}]}}));
	}
	drain(&mut rx);

	server.dispatch(change(ChangeOperation::Insert, json!({"id": 1})));
	let frames = drain(&mut rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0].event, event::POSTGRES_CHANGES);
}

#[tokio::test]
async fn test_invalid_change_filter_rejects_join() {
	let server = server();
	let (connection, mut rx) = server.connect(Identity::anonymous());

	send(
		&server,
		connection,
		"realtime:orders",
		event::JOIN,
		json!({"config": {"postgres_changes": [{"table": "orders", "filter": "user_id=like.u%"}]}}),
	);

	let frames = drain(&mut rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0].payload["status"], "error");
	assert_eq!(server.topic_state(connection, "realtime:orders"), TopicState::Left);
}

#[tokio::test]
async fn test_presence_join_and_leave_on_disconnect() {
	let server = server();
	let (a, mut a_rx) = server.connect(Identity::anonymous());
	let (b, mut b_rx) = server.connect(Identity::anonymous());

	send(&server, b, "P", event::JOIN, json!({}));
	send(&server, a, "P", event::JOIN, json!({"config": {"presence": {"key": "u1"}}}));
	drain(&mut a_rx);
	drain(&mut b_rx);

	send(&server, a, "P", event::PRESENCE, json!({"type": "presence", "event": "track", "payload": {"name": "ann"}}));

	let frames = drain(&mut b_rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0].event, event::PRESENCE_DIFF);
	assert_eq!(frames[0].payload["joins"]["u1"]["metas"][0]["name"], "ann");
	assert_eq!(frames[0].payload["leaves"], json!({}));

	// the tracking connection gets its reply but not its own diff
	let own = drain(&mut a_rx);
	assert_eq!(own.len(), 1);
	assert_eq!(own[0].event, event::REPLY);
	assert!(server.presence("P").contains_key("u1"));

	server.disconnect(a);

	let frames = drain(&mut b_rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0].payload["leaves"]["u1"]["metas"][0]["name"], "ann");
	assert!(server.presence("P").is_empty());
	assert_eq!(server.connection_count(), 1);
}

#[tokio::test]
async fn test_presence_requires_join_and_track() {
	let server = server();
	let (connection, mut rx) = server.connect(Identity::anonymous());

	send(&server, connection, "P", "presence-track", json!({"name": "ann"}));
	assert_eq!(drain(&mut rx)[0].payload["status"], "error");

	send(&server, connection, "P", event::JOIN, json!({}));
	drain(&mut rx);
	send(&server, connection, "P", "presence-untrack", json!({}));
	assert_eq!(drain(&mut rx)[0].payload["status"], "error");

	send(&server, connection, "P", "presence-track", json!({"name": "ann"}));
	assert!(server.presence("P").contains_key(&connection.to_string()));
	send(&server, connection, "P", "presence-untrack", json!({}));
	assert!(server.presence("P").is_empty());

	let frames = drain(&mut rx);
	assert_eq!(frames.len(), 2);
	assert!(frames.iter().all(|frame| frame.event == event::REPLY && frame.payload["status"] == "ok"));
}

#[tokio::test]
async fn test_leave_broadcasts_presence_leave() {
	let server = server();
	let (a, mut a_rx) = server.connect(Identity::anonymous());
	let (b, mut b_rx) = server.connect(Identity::anonymous());

	send(&server, a, "P", event::JOIN, json!({"config": {"presence": {"key": "u1"}}}));
	send(&server, b, "P", event::JOIN, json!({}));
	send(&server, a, "P", "presence-track", json!({"name": "ann"}));
	drain(&mut a_rx);
	drain(&mut b_rx);

	send(&server, a, "P", event::LEAVE, json!({}));
	let frames = drain(&mut b_rx);
	assert_eq!(frames.len(), 1);
	assert!(frames[0].payload["leaves"].get("u1").is_some());

	// a left the topic, so it does not see its own leave diff
	let own = drain(&mut a_rx);
	assert_eq!(own.len(), 1);
	assert_eq!(own[0].event, event::REPLY);
}

#[tokio::test]
async fn test_access_token_attaches_identity() {
	let server = server();
	let (connection, mut rx) = server.connect(Identity::anonymous());

	send(&server, connection, "t", event::ACCESS_TOKEN, json!({"access_token": "garbage"}));
	assert_eq!(drain(&mut rx)[0].payload["status"], "ok");
	assert!(server.identity(connection).unwrap().is_anonymous());

	let token = sign_token(TEST_SECRET, json!({"sub": "u1", "role": AUTHENTICATED_ROLE}));
	send(&server, connection, "t", "identity-attach", json!({"access_token": token}));
	assert_eq!(drain(&mut rx)[0].payload["status"], "ok");

	let identity = server.identity(connection).unwrap();
	assert_eq!(identity.subject.as_deref(), Some("u1"));
	assert_eq!(identity.role, AUTHENTICATED_ROLE);
}

#[tokio::test]
async fn test_system_frame_reports_feed_state() {
	let (state, feed) = watch::channel(ListenerState::Disconnected);
	let server = server();
	server.attach_feed(feed);
	let (connection, mut rx) = server.connect(Identity::anonymous());

	send(&server, connection, "a", event::JOIN, json!({"config": {"postgres_changes": [{"table": "orders"}]}}));
	let system = drain(&mut rx).into_iter().find(|f| f.event == event::SYSTEM).unwrap();
	assert_eq!(system.payload["status"], "error");

	state.send_replace(ListenerState::Listening);
	send(&server, connection, "b", event::JOIN, json!({"config": {"postgres_changes": [{"table": "orders"}]}}));
	let system = drain(&mut rx).into_iter().find(|f| f.event == event::SYSTEM).unwrap();
	assert_eq!(system.payload["status"], "ok");

	send(&server, connection, "c", event::JOIN, json!({}));
	assert!(drain(&mut rx).iter().all(|f| f.event != event::SYSTEM));
}
