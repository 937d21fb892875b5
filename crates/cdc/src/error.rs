// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use relay_type::{Diagnostic, ErrorKind, IntoDiagnostic};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CdcError {
	#[error("change feed connection failed: {0}")]
	Connect(String),

	#[error("LISTEN on \"{channel}\" failed: {reason}")]
	Listen {
		channel: String,
		reason: String,
	},

	#[error("change feed connection lost: {0}")]
	Connection(String),

	#[error("malformed change notification: {0}")]
	Decode(String),
}

impl IntoDiagnostic for CdcError {
	fn into_diagnostic(self) -> Diagnostic {
		let (code, kind) = match &self {
			CdcError::Connect(_) => ("CDC_001", ErrorKind::Transport),
			CdcError::Listen {
				..
			} => ("CDC_002", ErrorKind::Transport),
			CdcError::Connection(_) => ("CDC_003", ErrorKind::Transport),
			CdcError::Decode(_) => ("CDC_004", ErrorKind::Protocol),
		};
		Diagnostic::new(code, kind, self.to_string())
	}
}
