// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use tracing::debug;

use crate::{
	error::SqlError,
	filter::split_top_level,
	identifier::Identifier,
	relationship::{RelationshipMap, singular},
};

/// One entry of the `select` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
	All,
	Column {
		column: Identifier,
		alias: Option<Identifier>,
	},
	Embed(Embed),
}

/// `alias:table!fk(columns)`, resolved to a correlated subquery returning one
/// related row as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
	pub alias: Option<Identifier>,
	pub table: Identifier,
	pub hint: Option<Identifier>,
	pub columns: Vec<EmbedColumn>,
}

impl Embed {
	/// Output key of the embed: the alias, or the related table name.
	pub fn key(&self) -> &Identifier {
		self.alias.as_ref().unwrap_or(&self.table)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedColumn {
	All,
	Column {
		column: Identifier,
		alias: Option<Identifier>,
	},
}

impl SelectItem {
	/// Parse a `select` value. An empty value selects every column.
	pub fn parse_list(raw: &str) -> Result<Vec<SelectItem>, SqlError> {
		if raw.trim().is_empty() {
			return Ok(vec![SelectItem::All]);
		}
		split_top_level(raw)?.into_iter().map(|item| SelectItem::parse(item.trim())).collect()
	}

	fn parse(item: &str) -> Result<SelectItem, SqlError> {
		if item == "*" {
			return Ok(SelectItem::All);
		}

		let Some(open) = item.find('(') else {
			let (column, alias) = parse_aliased(item)?;
			return Ok(SelectItem::Column {
				column,
				alias,
			});
		};

		let inner = item[open + 1..].strip_suffix(')').ok_or_else(|| SqlError::MalformedSelect(item.to_string()))?;
		if inner.contains('(') {
			return Err(SqlError::NestedEmbed(item.to_string()));
		}

		let (alias, target) = match item[..open].split_once(':') {
			Some((alias, target)) => (Some(Identifier::parse(alias)?), target),
			None => (None, &item[..open]),
		};
		let (table, hint) = match target.split_once('!') {
			Some((table, hint)) => (Identifier::parse(table)?, Some(Identifier::parse(hint)?)),
			None => (Identifier::parse(target)?, None),
		};

		let mut columns = Vec::new();
		for column in inner.split(',').map(str::trim) {
			match column {
				"" | "*" => columns.push(EmbedColumn::All),
				_ => {
					let (column, alias) = parse_aliased(column)?;
					columns.push(EmbedColumn::Column {
						column,
						alias,
					});
				}
			}
		}
		if columns.contains(&EmbedColumn::All) {
			columns = vec![EmbedColumn::All];
		}

		Ok(SelectItem::Embed(Embed {
			alias,
			table,
			hint,
			columns,
		}))
	}
}

fn parse_aliased(raw: &str) -> Result<(Identifier, Option<Identifier>), SqlError> {
	match raw.split_once(':') {
		Some((alias, column)) => Ok((Identifier::parse(column)?, Some(Identifier::parse(alias)?))),
		None => Ok((Identifier::parse(raw)?, None)),
	}
}

/// Picks the foreign-key column on the outer table that links an embed.
///
/// Candidates are tried in order: the explicit `!hint`, the configured
/// [`RelationshipMap`], `<alias>_id` when an alias was given, and
/// `<singular(table)>_id`. When the outer table's columns are known, a
/// candidate must be one of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbedResolver<'a> {
	relationships: Option<&'a RelationshipMap>,
	known_columns: Option<&'a HashSet<String>>,
}

impl<'a> EmbedResolver<'a> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_relationships(mut self, relationships: &'a RelationshipMap) -> Self {
		self.relationships = Some(relationships);
		self
	}

	pub fn with_known_columns(mut self, columns: &'a HashSet<String>) -> Self {
		self.known_columns = Some(columns);
		self
	}

	pub fn resolve(&self, table: &Identifier, embed: &Embed) -> Option<Identifier> {
		let mut candidates: Vec<Identifier> = Vec::with_capacity(4);
		candidates.extend(embed.hint.clone());
		if let Some(column) = self.relationships.and_then(|map| map.get(table, embed.key())) {
			candidates.push(column.clone());
		}
		if let Some(alias) = &embed.alias {
			candidates.extend(Identifier::parse(&format!("{alias}_id")).ok());
		}
		candidates.extend(Identifier::parse(&format!("{}_id", singular(embed.table.as_str()))).ok());

		candidates.into_iter().find(|candidate| match self.known_columns {
			Some(columns) => columns.contains(candidate.as_str()),
			None => true,
		})
	}
}

pub(crate) fn render_list(table: &Identifier, items: &[SelectItem], resolver: &EmbedResolver<'_>) -> String {
	let mut embeds = 0usize;
	let rendered: Vec<String> = items
		.iter()
		.map(|item| match item {
			SelectItem::All => "*".to_string(),
			SelectItem::Column {
				column,
				alias: Some(alias),
			} => format!("{} AS {}", column.quoted(), alias.quoted()),
			SelectItem::Column {
				column,
				alias: None,
			} => column.quoted(),
			SelectItem::Embed(embed) => {
				embeds += 1;
				render_embed(table, embed, resolver, embeds)
			}
		})
		.collect();
	rendered.join(", ")
}

fn render_embed(table: &Identifier, embed: &Embed, resolver: &EmbedResolver<'_>, index: usize) -> String {
	let key = embed.key().quoted();
	let Some(foreign_key) = resolver.resolve(table, embed) else {
		debug!(table = %table, embed = %embed.table, "no foreign key found for embed, selecting null");
		return format!("NULL AS {key}");
	};

	let related = format!("\"_e{index}\"");
	let object = if embed.columns.contains(&EmbedColumn::All) {
		format!("row_to_json({related})")
	} else {
		let pairs: Vec<String> = embed
			.columns
			.iter()
			.filter_map(|column| match column {
				EmbedColumn::Column {
					column,
					alias,
				} => Some(format!(
					"{}, {related}.{}",
					alias.as_ref().unwrap_or(column).literal(),
					column.quoted()
				)),
				EmbedColumn::All => None,
			})
			.collect();
		format!("json_build_object({})", pairs.join(", "))
	};

	format!(
		"(SELECT {object} FROM {} AS {related} WHERE {related}.\"id\" = {}.{} LIMIT 1) AS {key}",
		embed.table.quoted(),
		table.quoted(),
		foreign_key.quoted()
	)
}
