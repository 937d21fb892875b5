// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use tracing::debug;

use crate::identifier::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
	#[default]
	Asc,
	Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
	First,
	Last,
}

/// One `column.direction.nulls` term of the `order` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
	pub column: Identifier,
	pub direction: Direction,
	pub nulls: Option<Nulls>,
}

impl OrderTerm {
	/// Parse a comma separated `order` value. Terms naming an invalid column
	/// are skipped; an unrecognized direction falls back to ascending.
	pub fn parse_list(raw: &str) -> Vec<OrderTerm> {
		raw.split(',').map(str::trim).filter(|term| !term.is_empty()).filter_map(OrderTerm::parse).collect()
	}

	fn parse(term: &str) -> Option<OrderTerm> {
		let mut parts = term.split('.');
		let column = parts.next().unwrap_or_default();
		let column = match Identifier::parse(column) {
			Ok(column) => column,
			Err(_) => {
				debug!(term, "dropping order term with invalid column");
				return None;
			}
		};

		let mut direction = Direction::Asc;
		let mut nulls = None;
		for modifier in parts {
			match modifier.to_ascii_lowercase().as_str() {
				"asc" => direction = Direction::Asc,
				"desc" => direction = Direction::Desc,
				"nullsfirst" => nulls = Some(Nulls::First),
				"nullslast" => nulls = Some(Nulls::Last),
				other => debug!(term, modifier = other, "ignoring unknown order modifier"),
			}
		}

		Some(OrderTerm {
			column,
			direction,
			nulls,
		})
	}

	pub(crate) fn render(&self) -> String {
		let mut out = self.column.quoted();
		out.push_str(match self.direction {
			Direction::Asc => " ASC",
			Direction::Desc => " DESC",
		});
		match self.nulls {
			Some(Nulls::First) => out.push_str(" NULLS FIRST"),
			Some(Nulls::Last) => out.push_str(" NULLS LAST"),
			None => {}
		}
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn render(raw: &str) -> Vec<String> {
		OrderTerm::parse_list(raw).iter().map(OrderTerm::render).collect()
	}

	#[test]
	fn test_direction_and_nulls() {
		assert_eq!(
			render("created_at.desc.nullslast,title"),
			vec!["\"created_at\" DESC NULLS LAST", "\"title\" ASC"]
		);
		assert_eq!(render("rank.nullsfirst"), vec!["\"rank\" ASC NULLS FIRST"]);
	}

	#[test]
	fn test_unknown_direction_defaults_to_ascending() {
		assert_eq!(render("title.sideways"), vec!["\"title\" ASC"]);
	}

	#[test]
	fn test_invalid_columns_are_dropped() {
		assert_eq!(render("title;drop table x.desc,id.desc"), vec!["\"id\" DESC"]);
		assert!(render(",,").is_empty());
	}
}
