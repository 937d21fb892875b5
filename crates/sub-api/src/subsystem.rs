// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthStatus {
	Healthy,
	Warning {
		description: String,
	},
	Failed {
		description: String,
	},
}

impl HealthStatus {
	pub fn is_healthy(&self) -> bool {
		matches!(self, HealthStatus::Healthy)
	}

	pub fn is_failed(&self) -> bool {
		matches!(self, HealthStatus::Failed { .. })
	}
}

impl Display for HealthStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			HealthStatus::Healthy => f.write_str("healthy"),
			HealthStatus::Warning {
				description,
			} => write!(f, "warning: {description}"),
			HealthStatus::Failed {
				description,
			} => write!(f, "failed: {description}"),
		}
	}
}

/// A component with an explicit start/stop lifecycle.
///
/// `start` and `shutdown` are idempotent.
#[async_trait]
pub trait Subsystem: Send + Sync {
	fn name(&self) -> &'static str;

	async fn start(&mut self) -> relay_type::Result<()>;

	async fn shutdown(&mut self) -> relay_type::Result<()>;

	fn is_running(&self) -> bool;

	fn health_status(&self) -> HealthStatus;
}
