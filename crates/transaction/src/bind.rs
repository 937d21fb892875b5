// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use bytes::BytesMut;
use relay_sql::Param;
use tokio_postgres::types::{Format, IsNull, ToSql, Type, to_sql_checked};

/// Sends a [`Param`] in text format for whatever type the server inferred
/// for its placeholder.
#[derive(Debug)]
pub(crate) struct Bind<'a>(&'a Param);

impl ToSql for Bind<'_> {
	fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
		match self.0 {
			Param::Null => Ok(IsNull::Yes),
			Param::Text(text) => {
				out.extend_from_slice(text.as_bytes());
				Ok(IsNull::No)
			}
		}
	}

	fn accepts(_ty: &Type) -> bool {
		true
	}

	fn encode_format(&self, _ty: &Type) -> Format {
		Format::Text
	}

	to_sql_checked!();
}

pub(crate) fn binds(params: &[Param]) -> Vec<Bind<'_>> {
	params.iter().map(Bind).collect()
}

pub(crate) fn refs<'a>(binds: &'a [Bind<'a>]) -> Vec<&'a (dyn ToSql + Sync)> {
	binds.iter().map(|bind| bind as &(dyn ToSql + Sync)).collect()
}
