// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use axum::{Router, routing::get};
use relay_sub_server::AppState;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{call_read, call_write, count, create, health, modify, not_found, read, remove};

/// `/health` at the root, table and RPC routes under the configured prefix.
pub fn router(state: AppState) -> Router {
	let api = Router::new()
		.route("/rpc/{function}", get(call_read).post(call_write))
		.route("/{table}", get(read).head(count).post(create).patch(modify).delete(remove));

	let prefix = state.config().rest_prefix.clone();
	let app = if prefix.is_empty() {
		Router::new().merge(api)
	} else {
		Router::new().nest(&prefix, api)
	};

	app.route("/health", get(health))
		.fallback(not_found)
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}
