// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod subsystem;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Coarse classification used to pick transport-level status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
	/// Malformed input rejected before any statement executed.
	Validation,
	/// Credential rejected.
	Authorization,
	/// Route or resource does not exist.
	NotFound,
	/// Invalid upsert target.
	Conflict,
	/// Response shape cannot satisfy the requested representation.
	NotAcceptable,
	/// Pool exhaustion, connection loss.
	Transport,
	/// Malformed channel frame.
	Protocol,
	/// Statement failed inside the database.
	Database,
	Internal,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::Validation => "ValidationError",
			ErrorKind::Authorization => "AuthorizationError",
			ErrorKind::NotFound => "NotFoundError",
			ErrorKind::Conflict => "ConflictError",
			ErrorKind::NotAcceptable => "NotAcceptableError",
			ErrorKind::Transport => "TransportError",
			ErrorKind::Protocol => "ProtocolError",
			ErrorKind::Database => "DatabaseError",
			ErrorKind::Internal => "InternalError",
		}
	}
}

impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// User-visible description of a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub code: String,
	pub kind: ErrorKind,
	pub message: String,
	pub details: Option<String>,
	pub hint: Option<String>,
	/// The compiled statement, when the failure happened while executing one.
	pub statement: Option<String>,
}

impl Diagnostic {
	pub fn new(code: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			kind,
			message: message.into(),
			details: None,
			hint: None,
			statement: None,
		}
	}

	pub fn with_details(mut self, details: impl Into<String>) -> Self {
		self.details = Some(details.into());
		self
	}

	pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
		self.hint = Some(hint.into());
		self
	}

	pub fn with_statement(&mut self, statement: impl Into<String>) {
		self.statement = Some(statement.into());
	}
}
