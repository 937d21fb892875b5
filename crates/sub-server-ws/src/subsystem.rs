// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! WebSocket server subsystem implementing the Relay Subsystem trait.

use std::{
	net::SocketAddr,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use relay_sub_api::{HealthStatus, Subsystem};
use relay_sub_server::AppState;
use relay_type::{
	error,
	error::subsystem::{address_unavailable, bind_failed},
};
use tokio::{
	net::TcpListener,
	spawn,
	sync::{Semaphore, watch},
	time::{Instant, sleep},
};

use crate::handler::handle_connection;

/// How long shutdown waits for open sockets to close.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// WebSocket server subsystem.
///
/// Accepts sockets up to `ws.max_connections`; further connections are
/// dropped before the handshake. Shutdown closes every socket and waits for
/// the handlers to finish their cleanup.
pub struct WsSubsystem {
	bind_addr: String,
	/// Actual bound address (available after start).
	actual_addr: RwLock<Option<SocketAddr>>,
	state: AppState,
	running: Arc<AtomicBool>,
	active_connections: Arc<AtomicUsize>,
	shutdown_tx: Option<watch::Sender<bool>>,
	connection_semaphore: Arc<Semaphore>,
}

impl WsSubsystem {
	pub fn new(bind_addr: String, state: AppState) -> Self {
		let max_connections = state.max_connections();
		Self {
			bind_addr,
			actual_addr: RwLock::new(None),
			state,
			running: Arc::new(AtomicBool::new(false)),
			active_connections: Arc::new(AtomicUsize::new(0)),
			shutdown_tx: None,
			connection_semaphore: Arc::new(Semaphore::new(max_connections)),
		}
	}

	pub fn bind_addr(&self) -> &str {
		&self.bind_addr
	}

	/// Get the actual bound address (available after start).
	pub fn local_addr(&self) -> Option<SocketAddr> {
		*self.actual_addr.read()
	}

	pub fn port(&self) -> Option<u16> {
		self.local_addr().map(|a| a.port())
	}

	pub fn active_connections(&self) -> usize {
		self.active_connections.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Subsystem for WsSubsystem {
	fn name(&self) -> &'static str {
		"WebSocket"
	}

	async fn start(&mut self) -> relay_type::Result<()> {
		if self.running.load(Ordering::SeqCst) {
			return Ok(());
		}

		let addr = self.bind_addr.clone();
		let listener = TcpListener::bind(&addr).await.map_err(|e| error!(bind_failed(&addr, e)))?;

		let actual_addr = listener.local_addr().map_err(|e| error!(address_unavailable(e)))?;
		*self.actual_addr.write() = Some(actual_addr);
		tracing::info!("WebSocket server bound to {}", actual_addr);

		let (tx, mut rx) = watch::channel(false);
		let state = self.state.clone();
		let running = self.running.clone();
		let active_connections = self.active_connections.clone();
		let semaphore = self.connection_semaphore.clone();

		running.store(true, Ordering::SeqCst);
		spawn(async move {
			loop {
				tokio::select! {
					biased;

					result = rx.changed() => {
						if result.is_err() || *rx.borrow() {
							tracing::info!("WebSocket server shutting down");
							break;
						}
					}

					accept = listener.accept() => {
						match accept {
							Ok((stream, peer)) => {
								let permit = match semaphore.clone().try_acquire_owned() {
									Ok(p) => p,
									Err(_) => {
										tracing::warn!("Connection limit reached, rejecting {}", peer);
										continue;
									}
								};

								let conn_state = state.clone();
								let shutdown_rx = rx.clone();
								let active = active_connections.clone();

								active.fetch_add(1, Ordering::SeqCst);
								tracing::debug!("Accepted connection from {}", peer);

								spawn(async move {
									handle_connection(stream, conn_state, shutdown_rx).await;
									active.fetch_sub(1, Ordering::SeqCst);
									drop(permit);
								});
							}
							Err(e) => {
								tracing::warn!("Accept error: {}", e);
							}
						}
					}
				}
			}

			running.store(false, Ordering::SeqCst);
			tracing::info!("WebSocket server stopped");
		});

		self.shutdown_tx = Some(tx);
		Ok(())
	}

	async fn shutdown(&mut self) -> relay_type::Result<()> {
		let Some(tx) = self.shutdown_tx.take() else {
			return Ok(());
		};
		let _ = tx.send(true);

		let deadline = Instant::now() + DRAIN_TIMEOUT;
		while self.running.load(Ordering::SeqCst) || self.active_connections() > 0 {
			if Instant::now() > deadline {
				tracing::warn!(
					"WebSocket shutdown timeout with {} connections still active",
					self.active_connections()
				);
				break;
			}
			sleep(Duration::from_millis(20)).await;
		}
		tracing::debug!("WebSocket server shutdown completed");

		Ok(())
	}

	fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	fn health_status(&self) -> HealthStatus {
		if self.running.load(Ordering::SeqCst) {
			let active = self.active_connections.load(Ordering::SeqCst);
			let max = self.state.max_connections();

			if active > max * 90 / 100 {
				HealthStatus::Warning {
					description: format!("High connection count: {}/{}", active, max),
				}
			} else {
				HealthStatus::Healthy
			}
		} else if self.shutdown_tx.is_some() {
			HealthStatus::Warning {
				description: "Stopped unexpectedly".to_string(),
			}
		} else {
			HealthStatus::Failed {
				description: "Not running".to_string(),
			}
		}
	}
}
