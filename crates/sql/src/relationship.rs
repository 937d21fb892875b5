// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use crate::{error::SqlError, identifier::Identifier};

/// Statically declared foreign keys used to resolve embeds:
/// `outer table -> embed alias -> foreign-key column on the outer table`.
///
/// Parsed from `posts.author=author_id;posts.editor=edited_by`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipMap {
	entries: HashMap<Identifier, HashMap<Identifier, Identifier>>,
}

impl RelationshipMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn parse(raw: &str) -> Result<Self, SqlError> {
		let mut map = Self::new();
		for entry in raw.split([';', ',']).map(str::trim).filter(|e| !e.is_empty()) {
			let (path, column) = entry.split_once('=').ok_or_else(|| SqlError::MalformedSelect(entry.to_string()))?;
			let (table, alias) =
				path.trim().split_once('.').ok_or_else(|| SqlError::MalformedSelect(entry.to_string()))?;
			map.insert(Identifier::parse(table)?, Identifier::parse(alias)?, Identifier::parse(column.trim())?);
		}
		Ok(map)
	}

	pub fn insert(&mut self, table: Identifier, alias: Identifier, column: Identifier) {
		self.entries.entry(table).or_default().insert(alias, column);
	}

	pub fn get(&self, table: &Identifier, alias: &Identifier) -> Option<&Identifier> {
		self.entries.get(table)?.get(alias)
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// English singular used for foreign-key guessing: `categories -> category`,
/// `users -> user`, `address -> address`.
pub fn singular(table: &str) -> String {
	if let Some(stem) = table.strip_suffix("ies") {
		format!("{stem}y")
	} else if table.ends_with("ss") {
		table.to_string()
	} else if let Some(stem) = table.strip_suffix('s') {
		stem.to_string()
	} else {
		table.to_string()
	}
}
