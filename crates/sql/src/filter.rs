// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Row filters.
//!
//! A filter arrives as a query pair. The canonical form is `column=op.value`;
//! `column.op=value` and a bare `column.op.value` key are accepted as well.
//! `or=(...)` and `and=(...)` hold comma separated `column.op.value` items and
//! may nest further `and(...)`/`or(...)` groups. A `not.` prefix negates the
//! following operator or group.

use crate::{
	error::SqlError,
	identifier::{self, Identifier},
	param::{Param, ParamSink},
};

/// Operator token as written in the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Eq,
	Neq,
	Gt,
	Gte,
	Lt,
	Lte,
	Like,
	Ilike,
	Is,
	In,
	Contains,
	ContainedBy,
	Overlaps,
	Fts,
	Plfts,
	Phfts,
	Wfts,
}

impl Operator {
	pub fn parse(token: &str) -> Result<Self, SqlError> {
		Ok(match token {
			"eq" => Operator::Eq,
			"neq" => Operator::Neq,
			"gt" => Operator::Gt,
			"gte" => Operator::Gte,
			"lt" => Operator::Lt,
			"lte" => Operator::Lte,
			"like" => Operator::Like,
			"ilike" => Operator::Ilike,
			"is" => Operator::Is,
			"in" => Operator::In,
			"cs" | "contains" => Operator::Contains,
			"cd" | "contained-by" | "containedby" => Operator::ContainedBy,
			"ov" | "overlaps" => Operator::Overlaps,
			"fts" => Operator::Fts,
			"plfts" => Operator::Plfts,
			"phfts" => Operator::Phfts,
			"wfts" => Operator::Wfts,
			_ => return Err(SqlError::UnknownOperator(token.to_string())),
		})
	}

	fn is_full_text(&self) -> bool {
		matches!(self, Operator::Fts | Operator::Plfts | Operator::Phfts | Operator::Wfts)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
	Eq,
	Neq,
	Gt,
	Gte,
	Lt,
	Lte,
	Like,
	Ilike,
	Contains,
	ContainedBy,
	Overlaps,
}

impl CompareOp {
	fn sql(&self) -> &'static str {
		match self {
			CompareOp::Eq => "=",
			CompareOp::Neq => "<>",
			CompareOp::Gt => ">",
			CompareOp::Gte => ">=",
			CompareOp::Lt => "<",
			CompareOp::Lte => "<=",
			CompareOp::Like => "LIKE",
			CompareOp::Ilike => "ILIKE",
			CompareOp::Contains => "@>",
			CompareOp::ContainedBy => "<@",
			CompareOp::Overlaps => "&&",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsValue {
	Null,
	True,
	False,
	Unknown,
}

impl IsValue {
	fn parse(raw: &str) -> Result<Self, SqlError> {
		match raw.to_ascii_lowercase().as_str() {
			"null" => Ok(IsValue::Null),
			"true" => Ok(IsValue::True),
			"false" => Ok(IsValue::False),
			"unknown" => Ok(IsValue::Unknown),
			_ => Err(SqlError::InvalidIsValue(raw.to_string())),
		}
	}

	fn sql(&self) -> &'static str {
		match self {
			IsValue::Null => "NULL",
			IsValue::True => "TRUE",
			IsValue::False => "FALSE",
			IsValue::Unknown => "UNKNOWN",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
	Fts,
	Plain,
	Phrase,
	Websearch,
}

impl SearchKind {
	fn function(&self) -> &'static str {
		match self {
			SearchKind::Fts => "to_tsquery",
			SearchKind::Plain => "plainto_tsquery",
			SearchKind::Phrase => "phraseto_tsquery",
			SearchKind::Websearch => "websearch_to_tsquery",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	Compare {
		op: CompareOp,
		value: String,
	},
	Is(IsValue),
	In(Vec<String>),
	Search {
		kind: SearchKind,
		language: Option<Identifier>,
		query: String,
	},
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
	pub column: Identifier,
	pub negated: bool,
	pub predicate: Predicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
	And,
	Or,
}

impl GroupKind {
	fn separator(&self) -> &'static str {
		match self {
			GroupKind::And => " AND ",
			GroupKind::Or => " OR ",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
	Condition(Condition),
	Group {
		kind: GroupKind,
		negated: bool,
		filters: Vec<Filter>,
	},
}

impl Filter {
	/// Parse one non-reserved query pair.
	pub fn from_pair(key: &str, value: &str) -> Result<Filter, SqlError> {
		match key {
			"or" => parse_group(GroupKind::Or, false, value),
			"and" => parse_group(GroupKind::And, false, value),
			"not.or" => parse_group(GroupKind::Or, true, value),
			"not.and" => parse_group(GroupKind::And, true, value),
			_ if identifier::is_valid(key) => parse_condition(key, value),
			_ => {
				let (column, rest) = key.split_once('.').ok_or_else(|| SqlError::InvalidIdentifier(key.to_string()))?;
				if value.is_empty() {
					parse_condition(column, rest)
				} else {
					parse_condition(column, &format!("{rest}.{value}"))
				}
			}
		}
	}

	/// Number of bind parameters this filter contributes.
	pub fn param_count(&self) -> usize {
		match self {
			Filter::Condition(condition) => match &condition.predicate {
				Predicate::Compare {
					..
				}
				| Predicate::Search {
					..
				} => 1,
				Predicate::Is(_) => 0,
				Predicate::In(items) => items.len(),
			},
			Filter::Group {
				filters,
				..
			} => filters.iter().map(Filter::param_count).sum(),
		}
	}

	pub(crate) fn render(&self, sink: &mut ParamSink) -> String {
		match self {
			Filter::Condition(condition) => condition.render(sink),
			Filter::Group {
				kind,
				negated,
				filters,
			} => {
				let parts: Vec<String> = filters
					.iter()
					.map(|filter| match filter {
						Filter::Condition(_) => format!("({})", filter.render(sink)),
						Filter::Group {
							..
						} => filter.render(sink),
					})
					.collect();
				let group = format!("({})", parts.join(kind.separator()));
				if *negated {
					format!("NOT {group}")
				} else {
					group
				}
			}
		}
	}
}

impl Condition {
	fn render(&self, sink: &mut ParamSink) -> String {
		let column = self.column.quoted();
		let clause = match &self.predicate {
			Predicate::Compare {
				op,
				value,
			} => {
				let value = match op {
					CompareOp::Like | CompareOp::Ilike => value.replace('*', "%"),
					_ => value.clone(),
				};
				let placeholder = sink.push(Param::Text(value));
				format!("{column} {} {placeholder}", op.sql())
			}
			Predicate::Is(value) => format!("{column} IS {}", value.sql()),
			Predicate::In(items) if items.is_empty() => "FALSE".to_string(),
			Predicate::In(items) => {
				let placeholders: Vec<String> = items.iter().map(|item| sink.push(Param::text(item))).collect();
				format!("{column} IN ({})", placeholders.join(", "))
			}
			Predicate::Search {
				kind,
				language,
				query,
			} => {
				let placeholder = sink.push(Param::text(query));
				match language {
					Some(language) => {
						format!("{column} @@ {}({}, {placeholder})", kind.function(), language.literal())
					}
					None => format!("{column} @@ {}({placeholder})", kind.function()),
				}
			}
		};

		if self.negated {
			format!("NOT ({clause})")
		} else {
			clause
		}
	}
}

/// Render a conjunction of filters, or `None` when there are none.
pub(crate) fn render_where(filters: &[Filter], sink: &mut ParamSink) -> Option<String> {
	if filters.is_empty() {
		return None;
	}
	let clauses: Vec<String> = filters.iter().map(|filter| filter.render(sink)).collect();
	Some(clauses.join(" AND "))
}

fn parse_condition(column: &str, operation: &str) -> Result<Filter, SqlError> {
	let column = Identifier::parse(column)?;
	let (negated, operation) = match operation.strip_prefix("not.") {
		Some(rest) => (true, rest),
		None => (false, operation),
	};
	let (token, value) = operation.split_once('.').unwrap_or((operation, ""));

	let malformed = |reason: &str| SqlError::MalformedFilter {
		column: column.to_string(),
		reason: reason.to_string(),
	};

	let (token, language) = match token.find('(') {
		Some(open) => {
			let language = token[open + 1..]
				.strip_suffix(')')
				.ok_or_else(|| malformed("unterminated language specifier"))?;
			(&token[..open], Some(Identifier::parse(language)?))
		}
		None => (token, None),
	};

	let operator = Operator::parse(token)?;
	if language.is_some() && !operator.is_full_text() {
		return Err(malformed("only full-text operators accept a language"));
	}

	let compare = |op| Predicate::Compare {
		op,
		value: value.to_string(),
	};
	let search = |kind| Predicate::Search {
		kind,
		language: language.clone(),
		query: value.to_string(),
	};

	let predicate = match operator {
		Operator::Eq => compare(CompareOp::Eq),
		Operator::Neq => compare(CompareOp::Neq),
		Operator::Gt => compare(CompareOp::Gt),
		Operator::Gte => compare(CompareOp::Gte),
		Operator::Lt => compare(CompareOp::Lt),
		Operator::Lte => compare(CompareOp::Lte),
		Operator::Like => compare(CompareOp::Like),
		Operator::Ilike => compare(CompareOp::Ilike),
		Operator::Contains => compare(CompareOp::Contains),
		Operator::ContainedBy => compare(CompareOp::ContainedBy),
		Operator::Overlaps => compare(CompareOp::Overlaps),
		Operator::Is => Predicate::Is(IsValue::parse(value)?),
		Operator::In => Predicate::In(parse_list(column.as_str(), value)?),
		Operator::Fts => search(SearchKind::Fts),
		Operator::Plfts => search(SearchKind::Plain),
		Operator::Phfts => search(SearchKind::Phrase),
		Operator::Wfts => search(SearchKind::Websearch),
	};

	Ok(Filter::Condition(Condition {
		column,
		negated,
		predicate,
	}))
}

fn parse_group(kind: GroupKind, negated: bool, text: &str) -> Result<Filter, SqlError> {
	let inner = strip_parens(text.trim()).ok_or_else(|| SqlError::MalformedFilter {
		column: text.to_string(),
		reason: "logical groups must be wrapped in parentheses".to_string(),
	})?;

	if inner.trim().is_empty() {
		return Err(SqlError::MalformedFilter {
			column: text.to_string(),
			reason: "empty logical group".to_string(),
		});
	}

	let filters = split_top_level(inner)?.into_iter().map(|item| parse_group_item(item.trim())).collect::<Result<_, _>>()?;

	Ok(Filter::Group {
		kind,
		negated,
		filters,
	})
}

fn parse_group_item(item: &str) -> Result<Filter, SqlError> {
	let (negated, rest) = match item.strip_prefix("not.") {
		Some(rest) => (true, rest),
		None => (false, item),
	};
	if let Some(group) = rest.strip_prefix("and").filter(|g| g.starts_with('(')) {
		return parse_group(GroupKind::And, negated, group);
	}
	if let Some(group) = rest.strip_prefix("or").filter(|g| g.starts_with('(')) {
		return parse_group(GroupKind::Or, negated, group);
	}

	let (column, operation) = item.split_once('.').ok_or_else(|| SqlError::MalformedFilter {
		column: item.to_string(),
		reason: "expected column.operator.value".to_string(),
	})?;
	parse_condition(column, operation)
}

fn parse_list(column: &str, value: &str) -> Result<Vec<String>, SqlError> {
	let inner = strip_parens(value.trim()).ok_or_else(|| SqlError::MalformedFilter {
		column: column.to_string(),
		reason: "in expects a parenthesized list such as (1,2,3)".to_string(),
	})?;
	if inner.trim().is_empty() {
		return Ok(Vec::new());
	}
	Ok(split_top_level(inner)?.into_iter().map(|item| unquote(item.trim())).collect())
}

fn strip_parens(text: &str) -> Option<&str> {
	text.strip_prefix('(')?.strip_suffix(')')
}

fn unquote(item: &str) -> String {
	match item.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
		Some(quoted) => {
			let mut out = String::with_capacity(quoted.len());
			let mut chars = quoted.chars();
			while let Some(c) = chars.next() {
				if c == '\\' {
					if let Some(next) = chars.next() {
						out.push(next);
					}
				} else {
					out.push(c);
				}
			}
			out
		}
		None => item.to_string(),
	}
}

/// Split on commas that are outside parentheses and double quotes.
pub(crate) fn split_top_level(text: &str) -> Result<Vec<&str>, SqlError> {
	let mut parts = Vec::new();
	let mut depth: usize = 0;
	let mut quoted = false;
	let mut escaped = false;
	let mut start = 0;

	for (idx, c) in text.char_indices() {
		if escaped {
			escaped = false;
			continue;
		}
		match c {
			'\\' if quoted => escaped = true,
			'"' => quoted = !quoted,
			'(' if !quoted => depth += 1,
			')' if !quoted => {
				depth = depth.checked_sub(1).ok_or_else(|| SqlError::UnbalancedParentheses(text.to_string()))?;
			}
			',' if !quoted && depth == 0 => {
				parts.push(&text[start..idx]);
				start = idx + 1;
			}
			_ => {}
		}
	}

	if depth != 0 || quoted {
		return Err(SqlError::UnbalancedParentheses(text.to_string()));
	}
	parts.push(&text[start..]);
	Ok(parts)
}
