// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use async_trait::async_trait;
use relay_sub_api::{HealthStatus, Subsystem};

use crate::listener::{CdcListener, ListenerState};

/// Runs a [`CdcListener`] as part of the server lifecycle.
pub struct CdcSubsystem {
	listener: CdcListener,
}

impl CdcSubsystem {
	pub fn new(listener: CdcListener) -> Self {
		Self {
			listener,
		}
	}

	pub fn listener(&self) -> &CdcListener {
		&self.listener
	}
}

#[async_trait]
impl Subsystem for CdcSubsystem {
	fn name(&self) -> &'static str {
		"ChangeFeed"
	}

	async fn start(&mut self) -> relay_type::Result<()> {
		self.listener.start();
		Ok(())
	}

	async fn shutdown(&mut self) -> relay_type::Result<()> {
		self.listener.stop();
		Ok(())
	}

	fn is_running(&self) -> bool {
		self.listener.is_running()
	}

	fn health_status(&self) -> HealthStatus {
		if !self.listener.is_running() {
			return HealthStatus::Failed {
				description: "Not running".to_string(),
			};
		}
		match self.listener.state() {
			ListenerState::Listening => HealthStatus::Healthy,
			state => HealthStatus::Warning {
				description: format!("Change feed {state}"),
			},
		}
	}
}
