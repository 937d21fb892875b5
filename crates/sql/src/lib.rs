// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Query compiler for the Relay REST dialect.
//!
//! Translates a table name plus URL query parameters (filters, selection with
//! single-level embedding, ordering, pagination) and JSON mutation bodies into
//! parameterized PostgreSQL statements. Nothing in this crate touches a
//! database: the output is always a [`Statement`] whose SQL text contains only
//! validated, double-quoted identifiers and `$n` placeholders, with every
//! untrusted value carried in [`Statement::params`].
//!
//! ```ignore
//! let query = Query::parse("posts", &params)?;
//! let statement = query.select_statement(&EmbedResolver::default());
//! ```

pub mod error;
pub mod filter;
pub mod identifier;
pub mod mutation;
pub mod order;
pub mod param;
pub mod query;
pub mod relationship;
pub mod rpc;
pub mod select;
pub mod statement;
pub mod value;

pub use error::SqlError;
pub use filter::{Filter, GroupKind, Operator};
pub use identifier::Identifier;
pub use mutation::{Resolution, Upsert, delete, insert, update};
pub use order::{Direction, Nulls, OrderTerm};
pub use param::Param;
pub use query::Query;
pub use relationship::RelationshipMap;
pub use rpc::call;
pub use select::{EmbedResolver, SelectItem};
pub use statement::{Statement, StatementKind};
