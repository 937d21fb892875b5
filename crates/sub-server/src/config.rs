// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{fmt::Display, str::FromStr, time::Duration};

use relay_auth::AuthConfig;
use relay_cdc::ListenerConfig;
use relay_sql::RelationshipMap;
use relay_subscription::ChannelConfig;
use relay_transaction::{DatabaseConfig, QueryConfig, SessionConfig};
use relay_type::{error, error::subsystem::invalid_config};

/// WebSocket endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsConfig {
	/// Interval between server pings. A socket that has not answered the
	/// previous ping when the next one is due is closed.
	pub heartbeat_interval: Duration,
	pub max_connections: usize,
	pub channel: ChannelConfig,
}

impl Default for WsConfig {
	fn default() -> Self {
		Self {
			heartbeat_interval: Duration::from_millis(30_000),
			max_connections: 10_000,
			channel: ChannelConfig::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
	/// `tracing-subscriber` filter directive; `RUST_LOG` takes precedence.
	pub filter: String,
	pub json: bool,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			filter: "info".to_string(),
			json: false,
		}
	}
}

/// Process configuration, read from `RELAY_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http_bind: String,
	pub ws_bind: String,
	/// Path under which table and RPC routes are mounted.
	pub rest_prefix: String,
	pub database: DatabaseConfig,
	pub auth: AuthConfig,
	pub session: SessionConfig,
	pub query: QueryConfig,
	pub cdc: ListenerConfig,
	pub ws: WsConfig,
	pub log: LogConfig,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			http_bind: "0.0.0.0:8090".to_string(),
			ws_bind: "0.0.0.0:8091".to_string(),
			rest_prefix: "/rest/v1".to_string(),
			database: DatabaseConfig::default(),
			auth: AuthConfig::default(),
			session: SessionConfig::default(),
			query: QueryConfig::default(),
			cdc: ListenerConfig::default(),
			ws: WsConfig::default(),
			log: LogConfig::default(),
		}
	}
}

impl ServerConfig {
	pub fn from_env() -> relay_type::Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Build from an arbitrary variable source. Unset and empty variables
	/// keep their defaults; unparsable ones are an error.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> relay_type::Result<Self> {
		let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
		let mut config = Self::default();

		if let Some(v) = get("RELAY_HTTP_BIND") {
			config.http_bind = v;
		}
		if let Some(v) = get("RELAY_WS_BIND") {
			config.ws_bind = v;
		}
		if let Some(v) = get("RELAY_REST_PREFIX") {
			config.rest_prefix = normalize_prefix(&v);
		}

		if let Some(v) = get("RELAY_DATABASE_URL") {
			config.database.url = v;
		}
		if let Some(v) = parse(&get, "RELAY_DB_POOL_SIZE")? {
			config.database.pool_size = v;
		}
		if let Some(v) = parse(&get, "RELAY_DB_ACQUIRE_TIMEOUT_MS")? {
			config.database.acquire_timeout = Duration::from_millis(v);
		}
		if let Some(v) = parse(&get, "RELAY_DB_STATEMENT_TIMEOUT_MS")? {
			config.session.statement_timeout = Some(Duration::from_millis(v));
		}

		config.auth.jwt_secret = get("RELAY_JWT_SECRET");
		config.auth.service_key = get("RELAY_SERVICE_KEY");
		if let Some(v) = parse(&get, "RELAY_ASSUME_ROLE")? {
			config.session.assume_role = v;
		}

		config.query.max_rows = parse(&get, "RELAY_MAX_ROWS")?;
		if let Some(v) = get("RELAY_RELATIONSHIPS") {
			config.query.relationships =
				RelationshipMap::parse(&v).map_err(|e| error!(invalid_config("RELAY_RELATIONSHIPS", e)))?;
		}

		if let Some(v) = get("RELAY_CDC_CHANNEL") {
			config.cdc.channel = v;
		}
		if let Some(v) = parse(&get, "RELAY_CDC_RECONNECT_MS")? {
			config.cdc.reconnect_delay = Duration::from_millis(v);
		}

		if let Some(v) = parse(&get, "RELAY_WS_HEARTBEAT_MS")? {
			config.ws.heartbeat_interval = Duration::from_millis(v);
		}
		if let Some(v) = parse(&get, "RELAY_WS_MAX_CONNECTIONS")? {
			config.ws.max_connections = v;
		}

		if let Some(v) = get("RELAY_LOG") {
			config.log.filter = v;
		}
		if let Some(v) = parse(&get, "RELAY_LOG_JSON")? {
			config.log.json = v;
		}

		Ok(config)
	}

	pub fn with_http_bind(mut self, addr: impl Into<String>) -> Self {
		self.http_bind = addr.into();
		self
	}

	pub fn with_ws_bind(mut self, addr: impl Into<String>) -> Self {
		self.ws_bind = addr.into();
		self
	}

	pub fn with_rest_prefix(mut self, prefix: &str) -> Self {
		self.rest_prefix = normalize_prefix(prefix);
		self
	}

	pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
		self.database.url = url.into();
		self
	}

	pub fn with_pool_size(mut self, size: usize) -> Self {
		self.database.pool_size = size;
		self
	}

	pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
		self.database.acquire_timeout = timeout;
		self
	}

	pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
		self.auth.jwt_secret = Some(secret.into());
		self
	}

	pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
		self.auth.service_key = Some(key.into());
		self
	}

	pub fn with_assume_role(mut self, assume_role: bool) -> Self {
		self.session.assume_role = assume_role;
		self
	}

	pub fn with_max_rows(mut self, max_rows: u64) -> Self {
		self.query.max_rows = Some(max_rows);
		self
	}

	pub fn with_relationships(mut self, relationships: RelationshipMap) -> Self {
		self.query.relationships = relationships;
		self
	}

	pub fn with_cdc_channel(mut self, channel: impl Into<String>) -> Self {
		self.cdc.channel = channel.into();
		self
	}

	pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
		self.cdc.reconnect_delay = delay;
		self
	}

	pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
		self.ws.heartbeat_interval = interval;
		self
	}

	pub fn with_max_connections(mut self, max: usize) -> Self {
		self.ws.max_connections = max;
		self
	}

	pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
		self.log.filter = filter.into();
		self
	}
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> relay_type::Result<Option<T>>
where
	T: FromStr,
	T::Err: Display,
{
	match get(key) {
		None => Ok(None),
		Some(raw) => raw.parse().map(Some).map_err(|e| error!(invalid_config(key, e))),
	}
}

/// `rest/v1/` becomes `/rest/v1`; an empty prefix mounts at the root.
fn normalize_prefix(prefix: &str) -> String {
	let trimmed = prefix.trim().trim_matches('/');
	if trimmed.is_empty() {
		String::new()
	} else {
		format!("/{trimmed}")
	}
}
