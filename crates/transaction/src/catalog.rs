// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use relay_sql::{Identifier, Param};
use tokio_postgres::Transaction;

use crate::{
	bind::{binds, refs},
	error::TxnError,
};

const COLUMNS: &str = "SELECT column_name::text FROM information_schema.columns \
	WHERE table_name = $1 AND table_schema = ANY (current_schemas(false))";

/// Columns of `table` visible on the search path, used to validate embed
/// foreign-key candidates.
pub(crate) async fn columns(tx: &Transaction<'_>, table: &Identifier) -> Result<HashSet<String>, TxnError> {
	let params = [Param::text(table.as_str())];
	let binds = binds(&params);
	let rows = tx.query(COLUMNS, &refs(&binds)).await?;
	rows.iter().map(|row| row.try_get::<_, String>(0).map_err(TxnError::from)).collect()
}
