// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use deadpool_postgres::PoolError;
use relay_type::{Diagnostic, ErrorKind, IntoDiagnostic};
use tokio_postgres::error::SqlState;

#[derive(Debug, thiserror::Error)]
pub enum TxnError {
	#[error("timed out waiting for a database connection")]
	PoolTimeout,

	#[error("database connection unavailable: {0}")]
	Pool(String),

	#[error("invalid database configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Database(#[from] tokio_postgres::Error),

	#[error("unexpected result shape: {0}")]
	Decode(String),
}

impl TxnError {
	/// SQLSTATE reported by the server, if the failure came from a statement.
	pub fn sqlstate(&self) -> Option<&SqlState> {
		match self {
			TxnError::Database(err) => err.code(),
			_ => None,
		}
	}

	pub fn is_sqlstate(&self, state: &SqlState) -> bool {
		self.sqlstate() == Some(state)
	}
}

impl From<PoolError> for TxnError {
	fn from(err: PoolError) -> Self {
		match err {
			PoolError::Timeout(_) => TxnError::PoolTimeout,
			PoolError::Backend(err) => TxnError::Database(err),
			other => TxnError::Pool(other.to_string()),
		}
	}
}

impl IntoDiagnostic for TxnError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			TxnError::PoolTimeout => Diagnostic::new("TXN_001", ErrorKind::Transport, self.to_string())
				.with_hint("All pooled connections are busy; retry later or raise RELAY_DB_POOL_SIZE"),
			TxnError::Pool(_) => Diagnostic::new("TXN_002", ErrorKind::Transport, self.to_string()),
			TxnError::Config(_) => Diagnostic::new("TXN_003", ErrorKind::Internal, self.to_string()),
			TxnError::Database(err) => match err.as_db_error() {
				Some(db) => {
					let mut diagnostic = Diagnostic::new(db.code().code(), ErrorKind::Database, db.message());
					if let Some(detail) = db.detail() {
						diagnostic = diagnostic.with_details(detail);
					}
					if let Some(hint) = db.hint() {
						diagnostic = diagnostic.with_hint(hint);
					}
					diagnostic
				}
				None => Diagnostic::new("TXN_004", ErrorKind::Transport, err.to_string()),
			},
			TxnError::Decode(_) => Diagnostic::new("TXN_005", ErrorKind::Internal, self.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pool_timeout_is_transport() {
		let diagnostic = TxnError::PoolTimeout.into_diagnostic();
		assert_eq!(diagnostic.code, "TXN_001");
		assert_eq!(diagnostic.kind, ErrorKind::Transport);
	}

	#[test]
	fn test_non_database_errors_have_no_sqlstate() {
		assert!(TxnError::Decode("x".to_string()).sqlstate().is_none());
		assert!(!TxnError::PoolTimeout.is_sqlstate(&SqlState::UNDEFINED_TABLE));
	}
}
