// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Polling waits for asynchronous effects (listener reconnects, frames
//! arriving on a socket) so tests do not depend on fixed sleeps.

use std::time::{Duration, Instant};

use tokio::time::sleep;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Poll `condition` until it holds.
///
/// # Panics
/// Panics with `timeout_message` when `timeout` elapses first.
pub async fn wait_for_condition<F>(condition: F, timeout: Duration, poll_interval: Duration, timeout_message: &str)
where
	F: Fn() -> bool,
{
	let start = Instant::now();
	while !condition() {
		if start.elapsed() > timeout {
			panic!("Timeout after {:?}: {}", timeout, timeout_message);
		}
		sleep(poll_interval).await;
	}
}

pub async fn wait_for<F>(condition: F, message: &str)
where
	F: Fn() -> bool,
{
	wait_for_condition(condition, DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL, message).await;
}

#[cfg(test)]
mod tests {
	use std::sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	};

	use super::*;

	#[tokio::test]
	async fn test_wait_for_immediate() {
		wait_for(|| true, "already true").await;
	}

	#[tokio::test]
	async fn test_wait_for_flag_set_later() {
		let flag = Arc::new(AtomicBool::new(false));
		let setter = Arc::clone(&flag);
		tokio::spawn(async move {
			sleep(Duration::from_millis(20)).await;
			setter.store(true, Ordering::SeqCst);
		});
		wait_for(|| flag.load(Ordering::SeqCst), "flag should be set").await;
	}

	#[tokio::test]
	#[should_panic(expected = "Timeout")]
	async fn test_wait_for_times_out() {
		wait_for_condition(|| false, Duration::from_millis(20), Duration::from_millis(5), "never").await;
	}
}
