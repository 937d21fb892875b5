// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde_json::{Map, Value};

use crate::{
	error::SqlError,
	identifier::Identifier,
	param::ParamSink,
	statement::{Statement, StatementKind},
	value::function_argument,
};

/// `SELECT * FROM "function"("name" := $1::cast, ...)` with every argument
/// passed by name.
pub fn call(function: &str, arguments: &Map<String, Value>) -> Result<Statement, SqlError> {
	let function = Identifier::parse(function)?;
	let mut sink = ParamSink::new();

	let mut named = Vec::with_capacity(arguments.len());
	for (name, value) in arguments {
		let name = Identifier::parse(name)?;
		let bound = function_argument(value);
		named.push(format!("{} := {}", name.quoted(), bound.placeholder(sink.push(bound.param.clone()))));
	}

	let sql = format!("SELECT * FROM {}({})", function.quoted(), named.join(", "));
	Ok(Statement::new(StatementKind::Call, sql, sink.into_params()))
}
