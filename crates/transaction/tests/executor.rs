// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Runs against a live PostgreSQL when `RELAY_TEST_DATABASE_URL` is set;
//! otherwise every test returns immediately.

use std::time::Duration;

use relay_auth::Identity;
use relay_sql::{Query, insert, update};
use relay_transaction::{DatabaseConfig, Executor, Operation, QueryConfig, SessionConfig, TxnError};
use relay_type::ErrorKind;
use serde_json::{Map, json};

fn database_url() -> Option<String> {
	std::env::var("RELAY_TEST_DATABASE_URL").ok().filter(|url| !url.is_empty())
}

fn executor(url: String) -> Executor {
	let pool = DatabaseConfig {
		url,
		pool_size: 4,
		..DatabaseConfig::default()
	}
	.create_pool()
	.unwrap();
	Executor::new(pool, SessionConfig::default(), QueryConfig::default())
}

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
	pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

async fn setup(executor: &Executor, table: &str) {
	let client = executor.pool().get().await.unwrap();
	client
		.batch_execute(&format!(
			"DROP TABLE IF EXISTS {table};
			 CREATE TABLE {table} (id serial PRIMARY KEY, title text, created_at timestamptz NOT NULL DEFAULT now());"
		))
		.await
		.unwrap();
}

#[tokio::test]
async fn test_insert_with_representation_returns_server_fields() {
	let Some(url) = database_url() else {
		return;
	};
	let executor = executor(url);
	setup(&executor, "relay_test_insert").await;

	let table = Query::parse("relay_test_insert", &[]).unwrap().table;
	let statements = insert(&table, &json!({"title": "X"}), true, None, None).unwrap();
	let outcome = executor
		.run(
			&Identity::service(),
			Operation::Write {
				statements,
			},
		)
		.await
		.unwrap();

	assert_eq!(outcome.rows.len(), 1);
	assert_eq!(outcome.rows[0]["title"], "X");
	assert!(outcome.rows[0]["id"].is_number());
}

#[tokio::test]
async fn test_order_and_limit() {
	let Some(url) = database_url() else {
		return;
	};
	let executor = executor(url);
	setup(&executor, "relay_test_order").await;
	executor
		.pool()
		.get()
		.await
		.unwrap()
		.batch_execute(
			"INSERT INTO relay_test_order (id, created_at) VALUES
			 (1, '2024-01-01'), (2, '2024-01-02'), (3, '2024-01-03')",
		)
		.await
		.unwrap();

	let query = Query::parse("relay_test_order", &params(&[("order", "created_at.desc"), ("limit", "2")])).unwrap();
	let outcome = executor
		.run(
			&Identity::anonymous(),
			Operation::Read {
				query,
				count: true,
			},
		)
		.await
		.unwrap();

	let ids: Vec<i64> = outcome.rows.iter().map(|row| row["id"].as_i64().unwrap()).collect();
	assert_eq!(ids, vec![3, 2]);
	assert_eq!(outcome.total, Some(3));
}

#[tokio::test]
async fn test_patch_is_idempotent() {
	let Some(url) = database_url() else {
		return;
	};
	let executor = executor(url);
	setup(&executor, "relay_test_patch").await;
	executor.pool().get().await.unwrap().batch_execute("INSERT INTO relay_test_patch (id, title) VALUES (1, 'a')").await.unwrap();

	let query = Query::parse("relay_test_patch", &params(&[("id", "eq.1")])).unwrap();
	let mut states = Vec::new();
	for _ in 0..2 {
		let statement = update(&query.table, &json!({"title": "b"}), &query.filters, true).unwrap();
		let outcome = executor
			.run(
				&Identity::service(),
				Operation::Write {
					statements: vec![statement],
				},
			)
			.await
			.unwrap();
		states.push(outcome.rows);
	}
	assert_eq!(states[0], states[1]);
	assert_eq!(states[1][0]["title"], "b");
}

#[tokio::test]
async fn test_failure_rolls_back_every_statement() {
	let Some(url) = database_url() else {
		return;
	};
	let executor = executor(url);
	setup(&executor, "relay_test_rollback").await;

	let table = Query::parse("relay_test_rollback", &[]).unwrap().table;
	let mut statements = insert(&table, &json!({"id": 1, "title": "kept?"}), false, None, None).unwrap();
	statements.extend(insert(&table, &json!({"id": 1, "title": "duplicate"}), false, None, None).unwrap());

	let err = executor
		.run(
			&Identity::service(),
			Operation::Write {
				statements,
			},
		)
		.await
		.unwrap_err();
	assert_eq!(err.sqlstate().map(|s| s.code()), Some("23505"));

	let outcome = executor
		.run(
			&Identity::service(),
			Operation::Count {
				query: Query::parse("relay_test_rollback", &[]).unwrap(),
			},
		)
		.await
		.unwrap();
	assert_eq!(outcome.total, Some(0));
}

#[tokio::test]
async fn test_missing_table_reads_as_empty() {
	let Some(url) = database_url() else {
		return;
	};
	let executor = executor(url);

	let query = Query::parse("relay_table_that_does_not_exist", &[]).unwrap();
	let outcome = executor
		.run(
			&Identity::anonymous(),
			Operation::Read {
				query,
				count: true,
			},
		)
		.await
		.unwrap();
	assert!(outcome.rows.is_empty());
	assert_eq!(outcome.total, Some(0));
}

#[tokio::test]
async fn test_identity_is_visible_inside_the_transaction_only() {
	let Some(url) = database_url() else {
		return;
	};
	let executor = executor(url);

	let mut identity = Identity::anonymous();
	identity.subject = Some("u1".to_string());
	identity.role = "authenticated".to_string();

	let client = executor.pool().get().await.unwrap();
	client
		.batch_execute(
			"CREATE OR REPLACE FUNCTION relay_test_whoami() RETURNS text LANGUAGE sql AS
			 $$ SELECT current_setting('request.jwt.claim.sub', true) $$",
		)
		.await
		.unwrap();
	drop(client);

	let value = executor.invoke(&identity, "relay_test_whoami", &Map::new(), true).await.unwrap();
	assert_eq!(value, json!("u1"));

	let client = executor.pool().get().await.unwrap();
	let row = client.query_one("SELECT coalesce(current_setting('request.jwt.claim.sub', true), '')", &[]).await.unwrap();
	assert_eq!(row.get::<_, String>(0), "");
}

#[tokio::test]
async fn test_missing_function_is_null() {
	let Some(url) = database_url() else {
		return;
	};
	let executor = executor(url);
	let value = executor.invoke(&Identity::anonymous(), "relay_no_such_function", &Map::new(), false).await.unwrap();
	assert!(value.is_null());
}

#[tokio::test]
async fn test_exhausted_pool_is_a_transport_error() {
	let Some(url) = database_url() else {
		return;
	};
	let pool = DatabaseConfig {
		url,
		pool_size: 1,
		acquire_timeout: Duration::from_millis(200),
	}
	.create_pool()
	.unwrap();
	let executor = Executor::new(pool, SessionConfig::default(), QueryConfig::default());

	let _held = executor.pool().get().await.unwrap();
	let err = executor
		.run(
			&Identity::anonymous(),
			Operation::Count {
				query: Query::parse("anything", &[]).unwrap(),
			},
		)
		.await
		.unwrap_err();
	assert!(matches!(err, TxnError::PoolTimeout));
	assert_eq!(relay_type::Error::from(err).kind(), ErrorKind::Transport);
}
