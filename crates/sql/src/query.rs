// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{
	error::SqlError,
	filter::{Filter, render_where},
	identifier::Identifier,
	order::OrderTerm,
	param::ParamSink,
	select::{EmbedResolver, SelectItem, render_list},
	statement::{Statement, StatementKind},
};

/// A parsed table request.
///
/// `select`, `order`, `limit`, `offset`, `on_conflict` and `columns` have a
/// fixed meaning; every other query parameter is a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
	pub table: Identifier,
	pub select: Vec<SelectItem>,
	pub filters: Vec<Filter>,
	pub order: Vec<OrderTerm>,
	pub limit: Option<u64>,
	pub offset: Option<u64>,
	pub on_conflict: Vec<Identifier>,
	pub columns: Option<Vec<Identifier>>,
}

impl Query {
	pub fn parse(table: &str, params: &[(String, String)]) -> Result<Self, SqlError> {
		let mut query = Query {
			table: Identifier::parse(table)?,
			select: vec![SelectItem::All],
			filters: Vec::new(),
			order: Vec::new(),
			limit: None,
			offset: None,
			on_conflict: Vec::new(),
			columns: None,
		};

		for (key, value) in params {
			match key.as_str() {
				"select" => query.select = SelectItem::parse_list(value)?,
				"order" => query.order = OrderTerm::parse_list(value),
				"limit" => query.limit = Some(parse_count("limit", value)?),
				"offset" => query.offset = Some(parse_count("offset", value)?),
				"on_conflict" => {
					query.on_conflict = split_names(value)
						.map(|name| {
							Identifier::parse(name).map_err(|_| SqlError::InvalidConflictTarget(value.clone()))
						})
						.collect::<Result<_, _>>()?;
				}
				"columns" => query.columns = Some(split_names(value).map(Identifier::parse).collect::<Result<_, _>>()?),
				_ => query.filters.push(Filter::from_pair(key, value)?),
			}
		}

		Ok(query)
	}

	/// Cap `limit` at `max_rows`, applying it when no limit was requested.
	pub fn with_max_rows(mut self, max_rows: Option<u64>) -> Self {
		if let Some(max) = max_rows {
			self.limit = Some(self.limit.map_or(max, |limit| limit.min(max)));
		}
		self
	}

	pub fn has_embeds(&self) -> bool {
		self.select.iter().any(|item| matches!(item, SelectItem::Embed(_)))
	}

	pub fn select_statement(&self, resolver: &EmbedResolver<'_>) -> Statement {
		let mut sink = ParamSink::new();
		let mut sql = format!("SELECT {} FROM {}", render_list(&self.table, &self.select, resolver), self.table.quoted());

		if let Some(clause) = render_where(&self.filters, &mut sink) {
			sql.push_str(" WHERE ");
			sql.push_str(&clause);
		}
		if !self.order.is_empty() {
			let terms: Vec<String> = self.order.iter().map(OrderTerm::render).collect();
			sql.push_str(" ORDER BY ");
			sql.push_str(&terms.join(", "));
		}
		if let Some(limit) = self.limit {
			sql.push_str(&format!(" LIMIT {limit}"));
		}
		if let Some(offset) = self.offset {
			sql.push_str(&format!(" OFFSET {offset}"));
		}

		Statement::new(StatementKind::Select, sql, sink.into_params())
	}

	/// `count(*)` under the same filters, ignoring order and pagination.
	pub fn count_statement(&self) -> Statement {
		let mut sink = ParamSink::new();
		let mut sql = format!("SELECT count(*) FROM {}", self.table.quoted());
		if let Some(clause) = render_where(&self.filters, &mut sink) {
			sql.push_str(" WHERE ");
			sql.push_str(&clause);
		}
		Statement::new(StatementKind::Count, sql, sink.into_params())
	}
}

fn parse_count(param: &'static str, value: &str) -> Result<u64, SqlError> {
	value.trim().parse().map_err(|_| SqlError::InvalidLimit {
		param,
		value: value.to_string(),
	})
}

fn split_names(value: &str) -> impl Iterator<Item = &str> {
	value.split(',').map(str::trim).filter(|name| !name.is_empty())
}
