// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use relay_type::{error, error::subsystem::invalid_config};
use tracing_subscriber::EnvFilter;

use crate::subsystem::TracingSubsystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingBuilder {
	filter: String,
	json: bool,
	ansi: bool,
}

impl Default for TracingBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl TracingBuilder {
	pub fn new() -> Self {
		Self {
			filter: "info".to_string(),
			json: false,
			ansi: true,
		}
	}

	/// Filter directive used when `RUST_LOG` is unset, e.g.
	/// `info,relay_cdc=debug`.
	pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
		self.filter = filter.into();
		self
	}

	/// One JSON object per line instead of human-readable text.
	pub fn with_json(mut self, json: bool) -> Self {
		self.json = json;
		self
	}

	pub fn with_ansi(mut self, ansi: bool) -> Self {
		self.ansi = ansi;
		self
	}

	pub fn filter(&self) -> &str {
		&self.filter
	}

	pub fn is_json(&self) -> bool {
		self.json
	}

	pub fn is_ansi(&self) -> bool {
		self.ansi
	}

	/// `RUST_LOG` when it is set and valid, otherwise the configured filter.
	pub fn env_filter(&self) -> relay_type::Result<EnvFilter> {
		if let Ok(filter) = EnvFilter::try_from_default_env() {
			return Ok(filter);
		}
		EnvFilter::try_new(&self.filter).map_err(|e| error!(invalid_config("RELAY_LOG", e)))
	}

	pub fn build(self) -> TracingSubsystem {
		TracingSubsystem::new(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let builder = TracingBuilder::default();
		assert_eq!(builder.filter(), "info");
		assert!(!builder.is_json());
		assert!(builder.is_ansi());
	}

	#[test]
	fn test_directives() {
		let builder = TracingBuilder::new().with_filter("warn,relay_cdc=debug").with_json(true).with_ansi(false);
		assert_eq!(builder.filter(), "warn,relay_cdc=debug");
		assert!(builder.is_json());
		assert!(!builder.is_ansi());
	}

	#[test]
	fn test_invalid_filter() {
		// Only meaningful when RUST_LOG does not override the directive.
		if std::env::var_os("RUST_LOG").is_some() {
			return;
		}
		let err = TracingBuilder::new().with_filter("relay=notalevel").env_filter().unwrap_err();
		assert_eq!(err.code(), "SUB_003");
		assert!(TracingBuilder::new().with_filter("info,relay_sql=trace").env_filter().is_ok());
	}
}
