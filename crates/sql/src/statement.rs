// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::param::Param;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
	Select,
	Count,
	Insert,
	Update,
	Delete,
	Call,
}

impl StatementKind {
	pub fn is_read(&self) -> bool {
		matches!(self, StatementKind::Select | StatementKind::Count)
	}
}

/// Compiled SQL text with its ordered bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
	pub kind: StatementKind,
	pub sql: String,
	pub params: Vec<Param>,
	/// Set when the statement ends in `RETURNING *`.
	pub returning: bool,
}

impl Statement {
	pub(crate) fn new(kind: StatementKind, sql: String, params: Vec<Param>) -> Self {
		Self {
			kind,
			sql,
			params,
			returning: false,
		}
	}

	pub(crate) fn returning(mut self, returning: bool) -> Self {
		if returning {
			self.sql.push_str(" RETURNING *");
		}
		self.returning = returning;
		self
	}

	/// Whether the statement yields rows (as opposed to a bare affected-row count).
	pub fn produces_rows(&self) -> bool {
		match self.kind {
			StatementKind::Select | StatementKind::Call => true,
			StatementKind::Count => false,
			StatementKind::Insert | StatementKind::Update | StatementKind::Delete => self.returning,
		}
	}

	/// The statement rewritten to return its rows as a single JSON array
	/// value, or `None` when it produces no rows.
	pub fn json_rows(&self) -> Option<String> {
		match self.kind {
			StatementKind::Select | StatementKind::Call => {
				Some(format!("SELECT coalesce(json_agg(\"_r\"), '[]'::json) FROM ({}) AS \"_r\"", self.sql))
			}
			_ if self.produces_rows() => {
				Some(format!("WITH \"_r\" AS ({}) SELECT coalesce(json_agg(\"_r\"), '[]'::json) FROM \"_r\"", self.sql))
			}
			_ => None,
		}
	}
}
