// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use relay_auth::Identity;
use serde_json::{Map, Value};
use tokio_postgres::error::SqlState;
use tracing::info;

use crate::executor::{Executor, Operation};

impl Executor {
	/// Call `function` with named `arguments` in the caller's transaction
	/// context.
	///
	/// One row with one column is unwrapped to that value. A function that
	/// does not exist yields `null`.
	pub async fn invoke(
		&self,
		identity: &Identity,
		function: &str,
		arguments: &Map<String, Value>,
		read_only: bool,
	) -> relay_type::Result<Value> {
		let statement = relay_sql::call(function, arguments)?;

		match self
			.run(
				identity,
				Operation::Call {
					statement,
					read_only,
				},
			)
			.await
		{
			Ok(outcome) => Ok(unwrap_scalar(outcome.rows)),
			Err(err) if err.is_sqlstate(&SqlState::UNDEFINED_FUNCTION) => {
				info!(function, error = %err, "function does not exist, returning null");
				Ok(Value::Null)
			}
			Err(err) => Err(err.into()),
		}
	}
}

/// `[{"f": 5}]` becomes `5`; any other shape stays an array of rows.
pub fn unwrap_scalar(mut rows: Vec<Value>) -> Value {
	if rows.len() == 1 {
		if let Some(Value::Object(row)) = rows.first_mut() {
			if row.len() == 1 {
				if let Some((_, value)) = row.iter_mut().next() {
					return value.take();
				}
			}
		}
	}
	Value::Array(rows)
}
