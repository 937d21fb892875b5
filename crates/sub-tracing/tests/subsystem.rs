// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use relay_sub_api::Subsystem;
use relay_sub_tracing::TracingBuilder;

// One test per binary: the global subscriber can be set only once.
#[tokio::test]
async fn test_lifecycle() {
	let mut first = TracingBuilder::new().with_filter("debug").with_ansi(false).build();
	assert!(first.health_status().is_failed());

	first.start().await.unwrap();
	assert!(first.is_running());
	assert!(first.is_installed());
	assert!(first.health_status().is_healthy());

	// A second subscriber cannot replace the first, but still starts.
	let mut second = TracingBuilder::new().with_json(true).build();
	second.start().await.unwrap();
	assert!(second.is_running());
	assert!(!second.is_installed());

	tracing::info!("visible through the first subscriber");

	first.shutdown().await.unwrap();
	second.shutdown().await.unwrap();
	assert!(!first.is_running());
	assert!(first.health_status().is_failed());
}
