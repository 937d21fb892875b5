// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use deadpool_postgres::{Object, Pool};
use relay_auth::Identity;
use relay_sql::{EmbedResolver, Query, Statement};
use serde_json::Value;
use tokio_postgres::{Transaction, error::SqlState};
use tracing::{debug, warn};

use crate::{
	bind::{binds, refs},
	catalog,
	config::{QueryConfig, SessionConfig},
	error::TxnError,
	session,
};

/// A unit of work executed inside one transaction.
#[derive(Debug, Clone)]
pub enum Operation {
	/// Rows for `query`, plus the exact filtered count when `count` is set.
	Read {
		query: Query,
		count: bool,
	},
	/// Only the exact count.
	Count {
		query: Query,
	},
	/// Statements run in order; the first failure aborts the rest.
	Write {
		statements: Vec<Statement>,
	},
	Call {
		statement: Statement,
		read_only: bool,
	},
}

impl Operation {
	fn is_read_only(&self) -> bool {
		match self {
			Operation::Read {
				..
			}
			| Operation::Count {
				..
			} => true,
			Operation::Write {
				..
			} => false,
			Operation::Call {
				read_only,
				..
			} => *read_only,
		}
	}

	/// Decide what a failed operation reports once the transaction has been
	/// rolled back. Reads against a missing table or column yield an empty
	/// result; everything else is surfaced.
	fn recover(&self, err: TxnError) -> Result<Outcome, TxnError> {
		let total = match self {
			Operation::Read {
				count,
				..
			} => count.then_some(0),
			Operation::Count {
				..
			} => Some(0),
			_ => return Err(err),
		};

		if err.is_sqlstate(&SqlState::UNDEFINED_TABLE) || err.is_sqlstate(&SqlState::UNDEFINED_COLUMN) {
			debug!(error = %err, "read against missing relation, returning no rows");
			return Ok(Outcome {
				rows: Vec::new(),
				affected: 0,
				total,
			});
		}
		Err(err)
	}
}

/// What a committed operation produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
	/// Returned rows as JSON objects, in statement order.
	pub rows: Vec<Value>,
	/// Rows read or written.
	pub affected: u64,
	/// Exact count, when one was requested.
	pub total: Option<u64>,
}

/// Runs operations on pooled connections.
///
/// Every operation gets its own transaction: begin, project the identity,
/// execute, then commit on success or roll back on any failure. This is the
/// only place a transaction is committed or rolled back.
#[derive(Clone)]
pub struct Executor {
	pool: Pool,
	session: SessionConfig,
	query: Arc<QueryConfig>,
}

impl Executor {
	pub fn new(pool: Pool, session: SessionConfig, query: QueryConfig) -> Self {
		Self {
			pool,
			session,
			query: Arc::new(query),
		}
	}

	pub fn pool(&self) -> &Pool {
		&self.pool
	}

	pub async fn run(&self, identity: &Identity, operation: Operation) -> Result<Outcome, TxnError> {
		let mut client = self.acquire().await?;
		let tx = client.build_transaction().read_only(operation.is_read_only()).start().await?;

		let result = match session::project(&tx, identity, &self.session).await {
			Ok(()) => self.execute(&tx, &operation).await,
			Err(err) => Err(err),
		};

		match result {
			Ok(outcome) => {
				tx.commit().await?;
				Ok(outcome)
			}
			Err(err) => {
				if let Err(rollback) = tx.rollback().await {
					warn!(error = %rollback, "rollback failed");
				}
				debug!(error = %err, identity = %identity, "transaction rolled back");
				operation.recover(err)
			}
		}
	}

	async fn acquire(&self) -> Result<Object, TxnError> {
		self.pool.get().await.map_err(|err| {
			let err = TxnError::from(err);
			warn!(error = %err, "failed to acquire database connection");
			err
		})
	}

	async fn execute(&self, tx: &Transaction<'_>, operation: &Operation) -> Result<Outcome, TxnError> {
		match operation {
			Operation::Read {
				query,
				count,
			} => {
				let query = query.clone().with_max_rows(self.query.max_rows);
				let columns = if query.has_embeds() {
					Some(catalog::columns(tx, &query.table).await?)
				} else {
					None
				};

				let mut resolver = EmbedResolver::new().with_relationships(&self.query.relationships);
				if let Some(columns) = &columns {
					resolver = resolver.with_known_columns(columns);
				}

				let rows = fetch_rows(tx, &query.select_statement(&resolver)).await?;
				let total = if *count {
					Some(fetch_count(tx, &query.count_statement()).await?)
				} else {
					None
				};
				Ok(Outcome {
					affected: rows.len() as u64,
					rows,
					total,
				})
			}
			Operation::Count {
				query,
			} => {
				let total = fetch_count(tx, &query.count_statement()).await?;
				Ok(Outcome {
					rows: Vec::new(),
					affected: 0,
					total: Some(total),
				})
			}
			Operation::Write {
				statements,
			} => {
				let mut outcome = Outcome::default();
				for statement in statements {
					if statement.produces_rows() {
						let rows = fetch_rows(tx, statement).await?;
						outcome.affected += rows.len() as u64;
						outcome.rows.extend(rows);
					} else {
						outcome.affected += execute(tx, statement).await?;
					}
				}
				Ok(outcome)
			}
			Operation::Call {
				statement,
				..
			} => {
				let rows = fetch_rows(tx, statement).await?;
				Ok(Outcome {
					affected: rows.len() as u64,
					rows,
					total: None,
				})
			}
		}
	}
}

async fn fetch_rows(tx: &Transaction<'_>, statement: &Statement) -> Result<Vec<Value>, TxnError> {
	let Some(sql) = statement.json_rows() else {
		execute(tx, statement).await?;
		return Ok(Vec::new());
	};

	debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");
	let binds = binds(&statement.params);
	let row = tx.query_one(sql.as_str(), &refs(&binds)).await?;
	match row.try_get::<_, Value>(0)? {
		Value::Array(rows) => Ok(rows),
		other => Err(TxnError::Decode(format!("expected a JSON array, got {other}"))),
	}
}

async fn fetch_count(tx: &Transaction<'_>, statement: &Statement) -> Result<u64, TxnError> {
	debug!(sql = %statement.sql, params = statement.params.len(), "executing count");
	let binds = binds(&statement.params);
	let row = tx.query_one(statement.sql.as_str(), &refs(&binds)).await?;
	let count: i64 = row.try_get(0)?;
	u64::try_from(count).map_err(|_| TxnError::Decode(format!("negative count {count}")))
}

async fn execute(tx: &Transaction<'_>, statement: &Statement) -> Result<u64, TxnError> {
	debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");
	let binds = binds(&statement.params);
	Ok(tx.execute(statement.sql.as_str(), &refs(&binds)).await?)
}
