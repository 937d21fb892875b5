// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use relay_type::{Diagnostic, ErrorKind, IntoDiagnostic};

/// Input rejected by the compiler. No statement is ever built from input that
/// produced one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SqlError {
	#[error("invalid identifier \"{0}\"")]
	InvalidIdentifier(String),

	#[error("malformed filter on \"{column}\": {reason}")]
	MalformedFilter {
		column: String,
		reason: String,
	},

	#[error("unknown operator \"{0}\"")]
	UnknownOperator(String),

	#[error("\"is\" expects null, true, false or unknown, got \"{0}\"")]
	InvalidIsValue(String),

	#[error("unbalanced parentheses in \"{0}\"")]
	UnbalancedParentheses(String),

	#[error("malformed select item \"{0}\"")]
	MalformedSelect(String),

	#[error("nested embedding is not supported in \"{0}\"")]
	NestedEmbed(String),

	#[error("invalid {param} value \"{value}\"")]
	InvalidLimit {
		param: &'static str,
		value: String,
	},

	#[error("DELETE requires at least one filter")]
	UnfilteredDelete,

	#[error("request body must not be empty")]
	EmptyPayload,

	#[error("invalid request body: {0}")]
	InvalidPayload(String),

	#[error("invalid conflict target \"{0}\"")]
	InvalidConflictTarget(String),
}

impl IntoDiagnostic for SqlError {
	fn into_diagnostic(self) -> Diagnostic {
		let (code, kind, hint) = match &self {
			SqlError::InvalidIdentifier(_) => (
				"QUERY_001",
				ErrorKind::Validation,
				Some("Identifiers start with a letter or underscore followed by letters, digits, underscores or hyphens"),
			),
			SqlError::MalformedFilter {
				..
			} => ("QUERY_002", ErrorKind::Validation, Some("Filters are written as column=operator.value")),
			SqlError::UnknownOperator(_) => (
				"QUERY_003",
				ErrorKind::Validation,
				Some("Supported operators: eq, neq, gt, gte, lt, lte, like, ilike, is, in, cs, cd, ov, fts, plfts, phfts, wfts"),
			),
			SqlError::InvalidIsValue(_) => ("QUERY_004", ErrorKind::Validation, None),
			SqlError::UnbalancedParentheses(_) => ("QUERY_005", ErrorKind::Validation, None),
			SqlError::MalformedSelect(_) => ("QUERY_006", ErrorKind::Validation, None),
			SqlError::NestedEmbed(_) => (
				"QUERY_007",
				ErrorKind::Validation,
				Some("Only one level of embedding is supported"),
			),
			SqlError::InvalidLimit {
				..
			} => ("QUERY_008", ErrorKind::Validation, Some("limit and offset must be non-negative integers")),
			SqlError::UnfilteredDelete => (
				"QUERY_009",
				ErrorKind::Validation,
				Some("Add a filter such as ?id=eq.1 to select the rows to delete"),
			),
			SqlError::EmptyPayload => ("QUERY_010", ErrorKind::Validation, None),
			SqlError::InvalidPayload(_) => ("QUERY_011", ErrorKind::Validation, None),
			SqlError::InvalidConflictTarget(_) => (
				"QUERY_012",
				ErrorKind::Conflict,
				Some("on_conflict must list valid column names"),
			),
		};

		let mut diagnostic = Diagnostic::new(code, kind, self.to_string());
		if let Some(hint) = hint {
			diagnostic = diagnostic.with_hint(hint);
		}
		diagnostic
	}
}
