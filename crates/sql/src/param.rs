// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

/// A bind parameter.
///
/// Values are carried as text and sent to the server in text format so that
/// PostgreSQL parses them according to the type it inferred for the
/// placeholder, the same way an untyped literal would be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
	Null,
	Text(String),
}

impl Param {
	pub fn text(value: impl Into<String>) -> Self {
		Param::Text(value.into())
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Param::Null => None,
			Param::Text(text) => Some(text),
		}
	}
}

/// Collects parameters while SQL text is rendered and hands out placeholders.
#[derive(Debug, Default)]
pub(crate) struct ParamSink {
	params: Vec<Param>,
}

impl ParamSink {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Store `param` and return its `$n` placeholder.
	pub(crate) fn push(&mut self, param: Param) -> String {
		self.params.push(param);
		format!("${}", self.params.len())
	}

	pub(crate) fn into_params(self) -> Vec<Param> {
		self.params
	}
}
