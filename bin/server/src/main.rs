// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{process::ExitCode, sync::Arc};

use relay_cdc::{CdcListener, CdcSubsystem, PgNotificationSource};
use relay_sub_api::Subsystem;
use relay_sub_server::{AppState, ServerConfig};
use relay_sub_server_http::HttpSubsystem;
use relay_sub_server_ws::WsSubsystem;
use relay_sub_tracing::TracingBuilder;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
	match run().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			// The subscriber may not be installed yet.
			eprintln!("relay: {e}");
			error!("{}", e);
			ExitCode::FAILURE
		}
	}
}

async fn run() -> relay_type::Result<()> {
	let config = ServerConfig::from_env()?;

	let mut logging = TracingBuilder::new().with_filter(config.log.filter.clone()).with_json(config.log.json).build();
	logging.start().await?;

	let state = AppState::new(config.clone())?;

	let source = Arc::new(PgNotificationSource::new(config.database.url.clone()));
	let listener = CdcListener::new(config.cdc.clone(), source, state.channels().clone());
	state.channels().attach_feed(listener.watch_state());

	let mut subsystems: Vec<Box<dyn Subsystem>> = vec![
		Box::new(CdcSubsystem::new(listener)),
		Box::new(HttpSubsystem::new(config.http_bind.clone(), state.clone())),
		Box::new(WsSubsystem::new(config.ws_bind.clone(), state)),
	];

	for index in 0..subsystems.len() {
		let subsystem = &mut subsystems[index];
		if let Err(e) = subsystem.start().await {
			error!("{} failed to start: {}", subsystem.name(), e);
			shutdown(&mut subsystems[..index]).await;
			return Err(e);
		}
		info!("{} started", subsystem.name());
	}

	info!(http = %config.http_bind, ws = %config.ws_bind, "relay is up");
	if let Err(e) = tokio::signal::ctrl_c().await {
		error!("cannot listen for Ctrl-C: {}", e);
	}

	info!("shutting down");
	shutdown(&mut subsystems).await;
	logging.shutdown().await?;
	Ok(())
}

/// Stop in reverse start order so sockets close before the change feed.
async fn shutdown(subsystems: &mut [Box<dyn Subsystem>]) {
	for subsystem in subsystems.iter_mut().rev() {
		match subsystem.shutdown().await {
			Ok(()) => info!("{} stopped", subsystem.name()),
			Err(e) => error!("{} failed to stop: {}", subsystem.name(), e),
		}
	}
}
