// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

pub const ANON_ROLE: &str = "anon";
pub const AUTHENTICATED_ROLE: &str = "authenticated";
pub const SERVICE_ROLE: &str = "service_role";

/// The caller of one request or one channel connection.
///
/// Created per request and dropped with it; never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
	pub subject: Option<String>,
	pub role: String,
	pub email: Option<String>,
	/// Full verified claim set, projected into the session as `request.jwt.claims`.
	#[serde(skip)]
	pub claims: Value,
}

impl Identity {
	pub fn anonymous() -> Self {
		let mut claims = Map::new();
		claims.insert("role".to_string(), Value::String(ANON_ROLE.to_string()));
		Self {
			subject: None,
			role: ANON_ROLE.to_string(),
			email: None,
			claims: Value::Object(claims),
		}
	}

	/// Privileged identity for the internal service credential.
	pub fn service() -> Self {
		let mut claims = Map::new();
		claims.insert("role".to_string(), Value::String(SERVICE_ROLE.to_string()));
		Self {
			subject: None,
			role: SERVICE_ROLE.to_string(),
			email: None,
			claims: Value::Object(claims),
		}
	}

	pub fn is_anonymous(&self) -> bool {
		self.role == ANON_ROLE && self.subject.is_none()
	}

	pub fn is_service(&self) -> bool {
		self.role == SERVICE_ROLE
	}
}

impl Default for Identity {
	fn default() -> Self {
		Self::anonymous()
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.subject {
			Some(subject) => write!(f, "{}:{}", self.role, subject),
			None => f.write_str(&self.role),
		}
	}
}
