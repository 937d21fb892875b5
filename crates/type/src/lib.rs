// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shared types used across the Relay workspace.
//!
//! The only thing every crate needs to agree on is how failures are reported,
//! so this crate is intentionally small: a [`Diagnostic`] record, the boxed
//! [`Error`] that carries it and the [`IntoDiagnostic`] conversion trait that
//! component errors implement.

pub mod error;

pub use error::{Diagnostic, Error, ErrorKind, IntoDiagnostic};

pub type Result<T> = std::result::Result<T, Error>;
