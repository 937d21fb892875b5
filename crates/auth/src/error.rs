// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use relay_type::{Diagnostic, ErrorKind, IntoDiagnostic};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
	#[error("authentication token has expired")]
	Expired,

	#[error("authentication token signature is invalid")]
	InvalidSignature,

	#[error("malformed authentication token: {0}")]
	Malformed(String),

	#[error("token verification is not configured")]
	NotConfigured,
}

impl IntoDiagnostic for AuthError {
	fn into_diagnostic(self) -> Diagnostic {
		let code = match &self {
			AuthError::Expired => "AUTH_001",
			AuthError::InvalidSignature => "AUTH_002",
			AuthError::Malformed(_) => "AUTH_003",
			AuthError::NotConfigured => "AUTH_004",
		};
		Diagnostic::new(code, ErrorKind::Authorization, self.to_string())
			.with_hint("Provide a valid bearer token or continue as the anonymous role")
	}
}
