// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Display;

use super::{Diagnostic, ErrorKind};

/// A subsystem could not bind its listening socket.
pub fn bind_failed(addr: &str, reason: impl Display) -> Diagnostic {
	Diagnostic::new("SUB_001", ErrorKind::Transport, format!("failed to bind {addr}: {reason}"))
		.with_hint("Check that the address is valid and the port is not already in use")
}

/// The bound socket did not report its local address.
pub fn address_unavailable(reason: impl Display) -> Diagnostic {
	Diagnostic::new("SUB_002", ErrorKind::Transport, format!("bound address unavailable: {reason}"))
}

/// A setting is present but unparsable.
pub fn invalid_config(key: &str, reason: impl Display) -> Diagnostic {
	Diagnostic::new("SUB_003", ErrorKind::Internal, format!("invalid configuration {key}: {reason}"))
}
