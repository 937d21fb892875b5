// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use relay_auth::{Identity, IdentityExtractor};
use relay_subscription::ChannelServer;
use relay_transaction::Executor;
use tracing::debug;

use crate::config::ServerConfig;

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
	executor: Executor,
	extractor: Arc<IdentityExtractor>,
	channels: Arc<ChannelServer>,
	config: Arc<ServerConfig>,
}

impl AppState {
	/// Build the pool, the credential verifier and an empty channel server.
	///
	/// No database connection is opened here.
	pub fn new(config: ServerConfig) -> relay_type::Result<Self> {
		let pool = config.database.create_pool()?;
		let executor = Executor::new(pool, config.session.clone(), config.query.clone());
		let extractor = Arc::new(IdentityExtractor::new(&config.auth));
		let channels = Arc::new(ChannelServer::new(config.ws.channel.clone(), Arc::clone(&extractor)));

		debug!(pool_size = config.database.pool_size, "server context created");
		Ok(Self {
			executor,
			extractor,
			channels,
			config: Arc::new(config),
		})
	}

	pub fn executor(&self) -> &Executor {
		&self.executor
	}

	pub fn extractor(&self) -> &IdentityExtractor {
		&self.extractor
	}

	/// Resolve a credential; anything unverifiable is anonymous.
	pub fn identify(&self, credential: Option<&str>) -> Identity {
		self.extractor.extract(credential)
	}

	pub fn channels(&self) -> &Arc<ChannelServer> {
		&self.channels
	}

	pub fn config(&self) -> &ServerConfig {
		&self.config
	}

	pub fn max_connections(&self) -> usize {
		self.config.ws.max_connections
	}
}
