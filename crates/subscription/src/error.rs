// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use relay_type::{Diagnostic, ErrorKind, IntoDiagnostic};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
	#[error("malformed frame: {0}")]
	MalformedFrame(String),

	#[error("unknown event '{0}'")]
	UnknownEvent(String),

	#[error("topic '{0}' is already joined")]
	AlreadyJoined(String),

	#[error("topic '{0}' is not joined")]
	NotJoined(String),

	#[error("invalid change filter: {0}")]
	InvalidFilter(String),

	#[error("presence is not tracked on topic '{0}'")]
	NotTracked(String),

	#[error("connection is closed")]
	Closed,
}

impl ChannelError {
	/// Protocol errors are dropped silently; everything else is answered.
	pub fn is_protocol(&self) -> bool {
		matches!(self, ChannelError::MalformedFrame(_) | ChannelError::UnknownEvent(_))
	}
}

impl IntoDiagnostic for ChannelError {
	fn into_diagnostic(self) -> Diagnostic {
		let (code, kind) = match &self {
			ChannelError::MalformedFrame(_) => ("CHANNEL_001", ErrorKind::Protocol),
			ChannelError::UnknownEvent(_) => ("CHANNEL_002", ErrorKind::Protocol),
			ChannelError::AlreadyJoined(_) => ("CHANNEL_003", ErrorKind::Validation),
			ChannelError::NotJoined(_) => ("CHANNEL_004", ErrorKind::Validation),
			ChannelError::InvalidFilter(_) => ("CHANNEL_005", ErrorKind::Validation),
			ChannelError::NotTracked(_) => ("CHANNEL_006", ErrorKind::Validation),
			ChannelError::Closed => ("CHANNEL_007", ErrorKind::Transport),
		};
		Diagnostic::new(code, kind, self.to_string())
	}
}
