// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use relay_sub_api::{HealthStatus, Subsystem};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::builder::TracingBuilder;

/// Installs the global subscriber on start.
///
/// A global subscriber cannot be removed, so shutdown only flips the running
/// flag. If another subscriber was installed first (test harnesses do this),
/// that one stays in place.
pub struct TracingSubsystem {
	builder: TracingBuilder,
	installed: AtomicBool,
	running: AtomicBool,
}

impl TracingSubsystem {
	pub fn new(builder: TracingBuilder) -> Self {
		Self {
			builder,
			installed: AtomicBool::new(false),
			running: AtomicBool::new(false),
		}
	}

	pub fn builder(&self) -> &TracingBuilder {
		&self.builder
	}

	/// Whether this subsystem's subscriber is the global one.
	pub fn is_installed(&self) -> bool {
		self.installed.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Subsystem for TracingSubsystem {
	fn name(&self) -> &'static str {
		"Tracing"
	}

	async fn start(&mut self) -> relay_type::Result<()> {
		if self.running.load(Ordering::SeqCst) {
			return Ok(());
		}

		let filter = self.builder.env_filter()?;
		let result = if self.builder.is_json() {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_target(true).with_current_span(true))
				.try_init()
		} else {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_ansi(self.builder.is_ansi()).with_target(true))
				.try_init()
		};

		match result {
			Ok(()) => {
				self.installed.store(true, Ordering::SeqCst);
				tracing::debug!(filter = self.builder.filter(), json = self.builder.is_json(), "logging initialized");
			}
			Err(e) => tracing::debug!("keeping existing global subscriber: {}", e),
		}

		self.running.store(true, Ordering::SeqCst);
		Ok(())
	}

	async fn shutdown(&mut self) -> relay_type::Result<()> {
		self.running.store(false, Ordering::SeqCst);
		Ok(())
	}

	fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	fn health_status(&self) -> HealthStatus {
		if self.running.load(Ordering::SeqCst) {
			HealthStatus::Healthy
		} else {
			HealthStatus::Failed {
				description: "Not running".to_string(),
			}
		}
	}
}
