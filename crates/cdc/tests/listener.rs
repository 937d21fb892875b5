// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{sync::Arc, time::Duration};

use relay_cdc::{CdcListener, CdcSubsystem, ChangeOperation, ListenerConfig, ListenerState};
use relay_sub_api::{HealthStatus, Subsystem};
use relay_testing::{MemoryNotificationSource, RecordingSink, wait_for};
use serde_json::json;

fn payload(id: i64) -> String {
	json!({
		"schema": "public",
		"table": "messages",
		"type": "INSERT",
		"record": {"id": id},
		"old_record": null
	})
	.to_string()
}

fn listener(source: &Arc<MemoryNotificationSource>, sink: &Arc<RecordingSink>, delay: Duration) -> CdcListener {
	CdcListener::new(
		ListenerConfig {
			channel: "relay_changes".to_string(),
			reconnect_delay: delay,
		},
		source.clone(),
		sink.clone(),
	)
}

#[tokio::test]
async fn test_delivers_events_to_sink() {
	let source = Arc::new(MemoryNotificationSource::new());
	let sink = Arc::new(RecordingSink::new());
	let mut listener = listener(&source, &sink, Duration::from_millis(50));

	listener.start();
	wait_for(|| listener.state() == ListenerState::Listening, "listener should be listening").await;

	assert_eq!(source.notify(payload(1)), 1);
	wait_for(|| sink.len() == 1, "event should be dispatched").await;

	let events = sink.events();
	assert_eq!(events[0].table, "messages");
	assert_eq!(events[0].operation, ChangeOperation::Insert);
	assert_eq!(events[0].record, Some(json!({"id": 1})));

	listener.stop();
	assert_eq!(listener.state(), ListenerState::Disconnected);
}

#[tokio::test]
async fn test_notifications_during_reconnect_gap_are_lost() {
	let source = Arc::new(MemoryNotificationSource::new());
	let sink = Arc::new(RecordingSink::new());
	let mut listener = listener(&source, &sink, Duration::from_millis(200));

	listener.start();
	wait_for(|| listener.state() == ListenerState::Listening, "listener should be listening").await;

	source.notify(payload(1));
	wait_for(|| sink.len() == 1, "first event should arrive").await;

	source.disconnect();
	wait_for(|| listener.state() == ListenerState::Disconnected, "listener should notice the drop").await;

	assert_eq!(source.notify(payload(2)), 0);

	wait_for(|| source.connects() == 2 && listener.state() == ListenerState::Listening, "listener should reconnect")
		.await;

	source.notify(payload(3));
	wait_for(|| sink.len() == 2, "third event should arrive").await;

	let ids: Vec<_> = sink.events().iter().map(|e| e.record.as_ref().unwrap()["id"].as_i64().unwrap()).collect();
	assert_eq!(ids, vec![1, 3]);

	listener.stop();
}

#[tokio::test]
async fn test_malformed_payload_is_skipped() {
	let source = Arc::new(MemoryNotificationSource::new());
	let sink = Arc::new(RecordingSink::new());
	let mut listener = listener(&source, &sink, Duration::from_millis(50));

	listener.start();
	wait_for(|| listener.state() == ListenerState::Listening, "listener should be listening").await;

	source.notify("not json");
	source.notify(json!({"schema": "public", "table": "t", "type": "TRUNCATE"}).to_string());
	source.notify(payload(7));

	wait_for(|| sink.len() == 1, "valid event should still arrive").await;
	assert_eq!(source.connects(), 1);
	assert_eq!(sink.events()[0].record, Some(json!({"id": 7})));

	listener.stop();
}

#[tokio::test]
async fn test_retries_refused_connections() {
	let source = Arc::new(MemoryNotificationSource::new());
	source.refuse_connections(true);
	let sink = Arc::new(RecordingSink::new());
	let mut listener = listener(&source, &sink, Duration::from_millis(20));

	listener.start();
	tokio::time::sleep(Duration::from_millis(80)).await;
	assert_ne!(listener.state(), ListenerState::Listening);
	assert_eq!(source.connects(), 0);

	source.refuse_connections(false);
	wait_for(|| listener.state() == ListenerState::Listening, "listener should connect once allowed").await;
	assert_eq!(source.connects(), 1);

	listener.stop();
}

#[tokio::test]
async fn test_subsystem_health_follows_listener_state() {
	let source = Arc::new(MemoryNotificationSource::new());
	let sink = Arc::new(RecordingSink::new());
	let mut subsystem = CdcSubsystem::new(listener(&source, &sink, Duration::from_millis(200)));

	assert!(subsystem.health_status().is_failed());

	subsystem.start().await.unwrap();
	wait_for(|| subsystem.health_status().is_healthy(), "subsystem should become healthy").await;

	source.disconnect();
	wait_for(
		|| matches!(subsystem.health_status(), HealthStatus::Warning { .. }),
		"subsystem should warn while reconnecting",
	)
	.await;

	subsystem.shutdown().await.unwrap();
	assert!(!subsystem.is_running());
}
