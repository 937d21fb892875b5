// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::cmp::Ordering;

use relay_cdc::{ChangeEvent, ChangeOperation};
use serde_json::{Value, json};

use crate::{error::ChannelError, protocol::ChangeFilterSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOperator {
	Eq,
	Neq,
	Lt,
	Lte,
	Gt,
	Gte,
	In,
}

impl ColumnOperator {
	fn parse(s: &str) -> Option<Self> {
		Some(match s {
			"eq" => ColumnOperator::Eq,
			"neq" => ColumnOperator::Neq,
			"lt" => ColumnOperator::Lt,
			"lte" => ColumnOperator::Lte,
			"gt" => ColumnOperator::Gt,
			"gte" => ColumnOperator::Gte,
			"in" => ColumnOperator::In,
			_ => return None,
		})
	}
}

/// `column=op.value`, tested against the new record of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
	pub raw: String,
	pub column: String,
	pub operator: ColumnOperator,
	pub operands: Vec<String>,
}

impl ColumnFilter {
	pub fn parse(raw: &str) -> Result<Self, ChannelError> {
		let invalid = || ChannelError::InvalidFilter(raw.to_string());

		let (column, rest) = raw.split_once('=').ok_or_else(invalid)?;
		let (operator, value) = rest.split_once('.').ok_or_else(invalid)?;
		let column = column.trim();
		if column.is_empty() {
			return Err(invalid());
		}
		let operator = ColumnOperator::parse(operator).ok_or_else(invalid)?;

		let operands = if operator == ColumnOperator::In {
			let list = value.strip_prefix('(').and_then(|v| v.strip_suffix(')')).ok_or_else(invalid)?;
			list.split(',').map(|item| item.trim().trim_matches('"').to_string()).collect()
		} else {
			vec![value.to_string()]
		};

		Ok(Self {
			raw: raw.to_string(),
			column: column.to_string(),
			operator,
			operands,
		})
	}

	pub fn matches(&self, record: Option<&Value>) -> bool {
		let Some(field) = record.and_then(|r| r.get(&self.column)) else {
			return false;
		};

		if self.operator == ColumnOperator::In {
			return self.operands.iter().any(|o| compare(field, o) == Some(Ordering::Equal));
		}

		let Some(ordering) = self.operands.first().and_then(|o| compare(field, o)) else {
			return false;
		};
		match self.operator {
			ColumnOperator::Eq | ColumnOperator::In => ordering == Ordering::Equal,
			ColumnOperator::Neq => ordering != Ordering::Equal,
			ColumnOperator::Lt => ordering == Ordering::Less,
			ColumnOperator::Lte => ordering != Ordering::Greater,
			ColumnOperator::Gt => ordering == Ordering::Greater,
			ColumnOperator::Gte => ordering != Ordering::Less,
		}
	}
}

/// Numbers compare numerically, everything else by its text form.
/// `null` never compares.
fn compare(field: &Value, operand: &str) -> Option<Ordering> {
	match field {
		Value::Null => None,
		Value::Number(n) => {
			let left = n.as_f64()?;
			match operand.parse::<f64>() {
				Ok(right) => left.partial_cmp(&right),
				Err(_) => Some(n.to_string().as_str().cmp(operand)),
			}
		}
		Value::String(s) => Some(s.as_str().cmp(operand)),
		other => Some(other.to_string().as_str().cmp(operand)),
	}
}

/// One change subscription of one joined topic.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeFilter {
	pub id: u64,
	/// `None` matches every operation.
	pub operation: Option<ChangeOperation>,
	pub schema: Option<String>,
	pub table: Option<String>,
	pub column: Option<ColumnFilter>,
}

impl ChangeFilter {
	pub fn from_spec(id: u64, spec: &ChangeFilterSpec) -> Result<Self, ChannelError> {
		let operation = match spec.event.trim() {
			"*" | "" => None,
			op => Some(op.parse::<ChangeOperation>().map_err(|_| ChannelError::InvalidFilter(op.to_string()))?),
		};

		let column = match spec.filter.as_deref().map(str::trim) {
			None | Some("") => None,
			Some(raw) => Some(ColumnFilter::parse(raw)?),
		};

		Ok(Self {
			id,
			operation,
			schema: wildcard(spec.schema.as_deref()),
			table: wildcard(spec.table.as_deref()),
			column,
		})
	}

	pub fn matches(&self, event: &ChangeEvent) -> bool {
		if self.operation.is_some_and(|op| op != event.operation) {
			return false;
		}
		if self.schema.as_deref().is_some_and(|s| s != event.schema) {
			return false;
		}
		if self.table.as_deref().is_some_and(|t| t != event.table) {
			return false;
		}
		match &self.column {
			Some(column) => column.matches(event.record.as_ref()),
			None => true,
		}
	}

	/// Echo of the accepted filter, sent back in the join reply.
	pub fn describe(&self) -> Value {
		json!({
			"id": self.id,
			"event": self.operation.map(|op| op.to_string()).unwrap_or_else(|| "*".to_string()),
			"schema": self.schema.as_deref().unwrap_or("*"),
			"table": self.table.as_deref().unwrap_or("*"),
			"filter": self.column.as_ref().map(|c| c.raw.as_str()),
		})
	}
}

fn wildcard(value: Option<&str>) -> Option<String> {
	match value.map(str::trim) {
		None | Some("") | Some("*") => None,
		Some(v) => Some(v.to_string()),
	}
}
