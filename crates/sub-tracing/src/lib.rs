// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Process-wide log output: a `tracing-subscriber` formatter installed once
//! at startup, plain text or JSON lines, filtered by `RUST_LOG` when set.

pub mod builder;
pub mod subsystem;

pub use builder::TracingBuilder;
pub use subsystem::TracingSubsystem;
