// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Table and RPC handlers.
//!
//! Requests are compiled completely before a connection is taken from the
//! pool, so rejected input never reaches the database.

use axum::{
	Json,
	body::Bytes,
	extract::{Path, Query as QueryParams, State},
	http::{HeaderMap, HeaderValue, StatusCode, header},
	response::{IntoResponse, Response},
};
use relay_auth::{Identity, bearer_token};
use relay_sql::{Query, Upsert};
use relay_sub_server::AppState;
use relay_transaction::{Operation, Outcome};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
	error::AppError,
	prefer::{Preferences, ReturnPreference, content_range, wants_single_object},
};

type Params = QueryParams<Vec<(String, String)>>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
}

/// Liveness; no credentials required.
pub async fn health() -> impl IntoResponse {
	(
		StatusCode::OK,
		Json(HealthResponse {
			status: "ok",
		}),
	)
}

pub async fn not_found() -> AppError {
	AppError::NotFound("no route matches this path".to_string())
}

/// `Authorization: Bearer`, then the `apikey` header.
fn identify(state: &AppState, headers: &HeaderMap) -> Identity {
	let text = |name| headers.get(name).and_then(|v: &HeaderValue| v.to_str().ok());

	let credential = text(header::AUTHORIZATION.as_str()).and_then(bearer_token).or_else(|| text("apikey"));
	state.identify(credential)
}

fn parse_body(body: &Bytes) -> Result<Value, AppError> {
	serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))
}

/// `GET /{table}`
pub async fn read(
	State(state): State<AppState>,
	Path(table): Path<String>,
	headers: HeaderMap,
	QueryParams(params): Params,
) -> Result<Response, AppError> {
	let query = Query::parse(&table, &params)?;
	let preferences = Preferences::from_headers(&headers);
	let single = wants_single_object(&headers);
	let offset = query.offset.unwrap_or(0);

	let identity = identify(&state, &headers);
	let outcome = state
		.executor()
		.run(
			&identity,
			Operation::Read {
				query,
				count: preferences.count,
			},
		)
		.await?;

	let range = content_range(offset, outcome.rows.len(), outcome.total);
	let body = if single {
		single_object(outcome)?
	} else {
		Value::Array(outcome.rows)
	};

	Ok(([(header::CONTENT_RANGE, range)], Json(body)).into_response())
}

/// `[]` is `null`, one row is that row, more is an error.
fn single_object(outcome: Outcome) -> Result<Value, AppError> {
	let mut rows = outcome.rows;
	match rows.len() {
		0 => Ok(Value::Null),
		1 => Ok(rows.swap_remove(0)),
		n => Err(AppError::NotAcceptable(format!("JSON object requested, {n} rows returned"))),
	}
}

/// `HEAD /{table}`: count headers only.
pub async fn count(
	State(state): State<AppState>,
	Path(table): Path<String>,
	headers: HeaderMap,
	QueryParams(params): Params,
) -> Result<Response, AppError> {
	let query = Query::parse(&table, &params)?;
	let identity = identify(&state, &headers);
	let outcome = state
		.executor()
		.run(
			&identity,
			Operation::Count {
				query,
			},
		)
		.await?;

	let total = outcome.total.unwrap_or(0);
	let range = if total == 0 {
		"*/0".to_string()
	} else {
		format!("0-{}/{}", total - 1, total)
	};
	Ok((StatusCode::OK, [(header::CONTENT_RANGE, range)]).into_response())
}

/// `POST /{table}`: insert an object or an array of objects.
pub async fn create(
	State(state): State<AppState>,
	Path(table): Path<String>,
	headers: HeaderMap,
	QueryParams(params): Params,
	body: Bytes,
) -> Result<Response, AppError> {
	let query = Query::parse(&table, &params)?;
	let preferences = Preferences::from_headers(&headers);
	let body = parse_body(&body)?;

	let upsert = preferences.resolution.map(|resolution| Upsert::new(resolution, query.on_conflict.clone()));
	let statements = relay_sql::insert(
		&query.table,
		&body,
		preferences.wants_rows(),
		upsert.as_ref(),
		query.columns.as_deref(),
	)?;

	let identity = identify(&state, &headers);
	let outcome = state
		.executor()
		.run(
			&identity,
			Operation::Write {
				statements,
			},
		)
		.await?;

	Ok(written(StatusCode::CREATED, preferences, outcome))
}

/// `PATCH /{table}?filters`
pub async fn modify(
	State(state): State<AppState>,
	Path(table): Path<String>,
	headers: HeaderMap,
	QueryParams(params): Params,
	body: Bytes,
) -> Result<Response, AppError> {
	let query = Query::parse(&table, &params)?;
	let preferences = Preferences::from_headers(&headers);
	let body = parse_body(&body)?;
	let statement = relay_sql::update(&query.table, &body, &query.filters, preferences.wants_rows())?;

	let identity = identify(&state, &headers);
	let outcome = state
		.executor()
		.run(
			&identity,
			Operation::Write {
				statements: vec![statement],
			},
		)
		.await?;

	Ok(written(StatusCode::NO_CONTENT, preferences, outcome))
}

/// `DELETE /{table}?filters`; at least one filter is required.
pub async fn remove(
	State(state): State<AppState>,
	Path(table): Path<String>,
	headers: HeaderMap,
	QueryParams(params): Params,
) -> Result<Response, AppError> {
	let query = Query::parse(&table, &params)?;
	let preferences = Preferences::from_headers(&headers);
	let statement = relay_sql::delete(&query.table, &query.filters, preferences.wants_rows())?;

	let identity = identify(&state, &headers);
	let outcome = state
		.executor()
		.run(
			&identity,
			Operation::Write {
				statements: vec![statement],
			},
		)
		.await?;

	Ok(written(StatusCode::NO_CONTENT, preferences, outcome))
}

/// Inserts answer 201 whatever the preference; updates and deletes answer
/// 200 with rows or `minimal_status` without.
fn written(minimal_status: StatusCode, preferences: Preferences, outcome: Outcome) -> Response {
	let range = content_range(0, outcome.rows.len(), None);
	match preferences.returning {
		ReturnPreference::Representation => {
			let status = if minimal_status == StatusCode::CREATED {
				StatusCode::CREATED
			} else {
				StatusCode::OK
			};
			(status, [(header::CONTENT_RANGE, range)], Json(Value::Array(outcome.rows))).into_response()
		}
		ReturnPreference::Minimal | ReturnPreference::HeadersOnly => {
			let range = format!("*/{}", outcome.affected);
			(minimal_status, [(header::CONTENT_RANGE, range)]).into_response()
		}
	}
}

/// `GET /rpc/{function}`: read-only, arguments from the query string.
pub async fn call_read(
	State(state): State<AppState>,
	Path(function): Path<String>,
	headers: HeaderMap,
	QueryParams(params): Params,
) -> Result<Json<Value>, AppError> {
	let arguments: Map<String, Value> = params.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
	let identity = identify(&state, &headers);
	let result = state.executor().invoke(&identity, &function, &arguments, true).await?;
	Ok(Json(result))
}

/// `POST /rpc/{function}`: read-write, arguments from a JSON object body.
pub async fn call_write(
	State(state): State<AppState>,
	Path(function): Path<String>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<Value>, AppError> {
	let arguments = if body.iter().all(u8::is_ascii_whitespace) {
		Map::new()
	} else {
		match parse_body(&body)? {
			Value::Object(arguments) => arguments,
			Value::Null => Map::new(),
			_ => return Err(AppError::BadRequest("RPC arguments must be a JSON object".to_string())),
		}
	};

	let identity = identify(&state, &headers);
	let result = state.executor().invoke(&identity, &function, &arguments, false).await?;
	Ok(Json(result))
}
