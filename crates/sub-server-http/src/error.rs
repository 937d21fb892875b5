// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! HTTP error handling and response formatting.
//!
//! Every failure leaves the server as `{message, error, code, details, hint}`
//! with a status derived from its [`ErrorKind`].

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use relay_sql::SqlError;
use relay_transaction::TxnError;
use relay_type::{Diagnostic, ErrorKind, IntoDiagnostic};
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
	pub message: String,
	/// Error class, e.g. `ValidationError`.
	pub error: String,
	pub code: String,
	pub details: Option<String>,
	pub hint: Option<String>,
}

impl From<Diagnostic> for ErrorResponse {
	fn from(diagnostic: Diagnostic) -> Self {
		Self {
			message: diagnostic.message,
			error: diagnostic.kind.as_str().to_string(),
			code: diagnostic.code,
			details: diagnostic.details,
			hint: diagnostic.hint,
		}
	}
}

#[derive(Debug)]
pub enum AppError {
	/// Anything the compiler, executor or auth layer reported.
	Relay(relay_type::Error),
	/// Body or query string could not be read.
	BadRequest(String),
	/// A single object was requested but several rows matched.
	NotAcceptable(String),
	NotFound(String),
}

impl From<relay_type::Error> for AppError {
	fn from(e: relay_type::Error) -> Self {
		AppError::Relay(e)
	}
}

impl From<SqlError> for AppError {
	fn from(e: SqlError) -> Self {
		AppError::Relay(e.into())
	}
}

impl From<TxnError> for AppError {
	fn from(e: TxnError) -> Self {
		AppError::Relay(e.into())
	}
}

impl std::fmt::Display for AppError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AppError::Relay(e) => write!(f, "{}", e),
			AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
			AppError::NotAcceptable(msg) => write!(f, "Not acceptable: {}", msg),
			AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
		}
	}
}

impl std::error::Error for AppError {}

impl IntoDiagnostic for AppError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			AppError::Relay(e) => e.into_inner(),
			AppError::BadRequest(msg) => Diagnostic::new("HTTP_001", ErrorKind::Validation, msg),
			AppError::NotAcceptable(msg) => Diagnostic::new("HTTP_002", ErrorKind::NotAcceptable, msg)
				.with_hint("Drop the single-object Accept header or narrow the filters to one row"),
			AppError::NotFound(msg) => Diagnostic::new("HTTP_003", ErrorKind::NotFound, msg),
		}
	}
}

pub fn status_of(kind: ErrorKind) -> StatusCode {
	match kind {
		ErrorKind::Validation | ErrorKind::Conflict | ErrorKind::Protocol | ErrorKind::Database => {
			StatusCode::BAD_REQUEST
		}
		ErrorKind::Authorization => StatusCode::UNAUTHORIZED,
		ErrorKind::NotFound => StatusCode::NOT_FOUND,
		ErrorKind::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
		ErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
		ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let diagnostic = self.into_diagnostic();
		let status = status_of(diagnostic.kind);

		if status.is_server_error() {
			tracing::error!(code = %diagnostic.code, "{}", diagnostic.message);
		} else {
			tracing::debug!(code = %diagnostic.code, "{}", diagnostic.message);
		}

		(status, Json(ErrorResponse::from(diagnostic))).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_response_serialization() {
		let response = ErrorResponse::from(Diagnostic::new("QUERY_009", ErrorKind::Validation, "no filter"));
		let json = serde_json::to_value(&response).unwrap();
		assert_eq!(json["message"], "no filter");
		assert_eq!(json["error"], "ValidationError");
		assert_eq!(json["code"], "QUERY_009");
		assert!(json["details"].is_null());
		assert!(json["hint"].is_null());
	}

	#[test]
	fn test_status_mapping() {
		assert_eq!(status_of(ErrorKind::Validation), StatusCode::BAD_REQUEST);
		assert_eq!(status_of(ErrorKind::Conflict), StatusCode::BAD_REQUEST);
		assert_eq!(status_of(ErrorKind::Database), StatusCode::BAD_REQUEST);
		assert_eq!(status_of(ErrorKind::NotAcceptable), StatusCode::NOT_ACCEPTABLE);
		assert_eq!(status_of(ErrorKind::Transport), StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(status_of(ErrorKind::Internal), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[test]
	fn test_sql_error_conversion() {
		let err = AppError::from(SqlError::UnfilteredDelete);
		let diagnostic = err.into_diagnostic();
		assert_eq!(diagnostic.code, "QUERY_009");
		assert!(diagnostic.hint.is_some());
	}

	#[test]
	fn test_app_error_display() {
		let err = AppError::BadRequest("Invalid JSON".to_string());
		assert_eq!(err.to_string(), "Bad request: Invalid JSON");
	}
}
