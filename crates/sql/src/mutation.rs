// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde_json::{Map, Value};

use crate::{
	error::SqlError,
	filter::{Filter, render_where},
	identifier::Identifier,
	param::ParamSink,
	statement::{Statement, StatementKind},
	value::column_value,
};

/// How an insert handles rows that collide with the conflict target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
	/// `ON CONFLICT ... DO UPDATE SET col = EXCLUDED.col`
	MergeDuplicates,
	/// `ON CONFLICT ... DO NOTHING`
	IgnoreDuplicates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
	pub resolution: Resolution,
	/// Conflict target; `id` when empty.
	pub on_conflict: Vec<Identifier>,
}

impl Upsert {
	pub fn new(resolution: Resolution, on_conflict: Vec<Identifier>) -> Self {
		Self {
			resolution,
			on_conflict,
		}
	}

	fn target(&self) -> Vec<Identifier> {
		if self.on_conflict.is_empty() {
			vec![Identifier::fixed("id")]
		} else {
			self.on_conflict.clone()
		}
	}

	fn render(&self, columns: &[Identifier]) -> String {
		let target = self.target();
		let conflict = target.iter().map(Identifier::quoted).collect::<Vec<_>>().join(", ");
		let updates: Vec<String> = columns
			.iter()
			.filter(|column| !target.contains(column))
			.map(|column| format!("{0} = EXCLUDED.{0}", column.quoted()))
			.collect();

		if self.resolution == Resolution::IgnoreDuplicates || updates.is_empty() {
			format!(" ON CONFLICT ({conflict}) DO NOTHING")
		} else {
			format!(" ON CONFLICT ({conflict}) DO UPDATE SET {}", updates.join(", "))
		}
	}
}

/// One INSERT per row of `body`, which is an object or an array of objects.
///
/// `columns` restricts which body keys are written.
pub fn insert(
	table: &Identifier,
	body: &Value,
	returning: bool,
	upsert: Option<&Upsert>,
	columns: Option<&[Identifier]>,
) -> Result<Vec<Statement>, SqlError> {
	let rows: Vec<&Map<String, Value>> = match body {
		Value::Object(row) => vec![row],
		Value::Array(rows) if rows.is_empty() => return Err(SqlError::EmptyPayload),
		Value::Array(rows) => rows
			.iter()
			.map(|row| row.as_object().ok_or_else(|| SqlError::InvalidPayload("array items must be objects".to_string())))
			.collect::<Result<_, _>>()?,
		_ => return Err(SqlError::InvalidPayload("expected an object or an array of objects".to_string())),
	};

	rows.into_iter().map(|row| insert_row(table, row, returning, upsert, columns)).collect()
}

fn insert_row(
	table: &Identifier,
	row: &Map<String, Value>,
	returning: bool,
	upsert: Option<&Upsert>,
	columns: Option<&[Identifier]>,
) -> Result<Statement, SqlError> {
	let mut sink = ParamSink::new();
	let mut names = Vec::with_capacity(row.len());
	let mut values = Vec::with_capacity(row.len());

	for (key, value) in row {
		let column = Identifier::parse(key)?;
		if columns.is_some_and(|allowed| !allowed.contains(&column)) {
			continue;
		}
		let bound = column_value(value);
		values.push(bound.placeholder(sink.push(bound.param.clone())));
		names.push(column);
	}

	let mut sql = if names.is_empty() {
		format!("INSERT INTO {} DEFAULT VALUES", table.quoted())
	} else {
		format!(
			"INSERT INTO {} ({}) VALUES ({})",
			table.quoted(),
			names.iter().map(Identifier::quoted).collect::<Vec<_>>().join(", "),
			values.join(", ")
		)
	};
	if let Some(upsert) = upsert {
		sql.push_str(&upsert.render(&names));
	}

	Ok(Statement::new(StatementKind::Insert, sql, sink.into_params()).returning(returning))
}

/// UPDATE with the body's keys as the SET list. SET placeholders come first,
/// filter placeholders continue the numbering.
pub fn update(table: &Identifier, body: &Value, filters: &[Filter], returning: bool) -> Result<Statement, SqlError> {
	let row = body.as_object().ok_or_else(|| SqlError::InvalidPayload("expected an object".to_string()))?;
	if row.is_empty() {
		return Err(SqlError::EmptyPayload);
	}

	let mut sink = ParamSink::new();
	let mut assignments = Vec::with_capacity(row.len());
	for (key, value) in row {
		let column = Identifier::parse(key)?;
		let bound = column_value(value);
		assignments.push(format!("{} = {}", column.quoted(), bound.placeholder(sink.push(bound.param.clone()))));
	}

	let mut sql = format!("UPDATE {} SET {}", table.quoted(), assignments.join(", "));
	if let Some(clause) = render_where(filters, &mut sink) {
		sql.push_str(" WHERE ");
		sql.push_str(&clause);
	}

	Ok(Statement::new(StatementKind::Update, sql, sink.into_params()).returning(returning))
}

/// DELETE restricted by `filters`; an empty filter list is refused.
pub fn delete(table: &Identifier, filters: &[Filter], returning: bool) -> Result<Statement, SqlError> {
	let mut sink = ParamSink::new();
	let clause = render_where(filters, &mut sink).ok_or(SqlError::UnfilteredDelete)?;
	let sql = format!("DELETE FROM {} WHERE {clause}", table.quoted());
	Ok(Statement::new(StatementKind::Delete, sql, sink.into_params()).returning(returning))
}
