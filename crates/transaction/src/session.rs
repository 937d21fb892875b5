// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Projection of the request identity into transaction-local settings read by
//! row security policies (`current_setting('request.jwt.claim.sub', true)`).

use relay_auth::Identity;
use relay_sql::Param;
use tokio_postgres::Transaction;

use crate::{
	bind::{binds, refs},
	config::SessionConfig,
	error::TxnError,
};

pub const CLAIM_SUB: &str = "request.jwt.claim.sub";
pub const CLAIM_ROLE: &str = "request.jwt.claim.role";
pub const CLAIM_EMAIL: &str = "request.jwt.claim.email";
pub const CLAIMS: &str = "request.jwt.claims";

/// Settings and values to apply, in order. Absent claims are set to `''`.
pub(crate) fn settings(identity: &Identity, config: &SessionConfig) -> Vec<(&'static str, Param)> {
	let mut settings = vec![
		(CLAIM_SUB, Param::text(identity.subject.clone().unwrap_or_default())),
		(CLAIM_ROLE, Param::text(identity.role.as_str())),
		(CLAIM_EMAIL, Param::text(identity.email.clone().unwrap_or_default())),
		(CLAIMS, Param::text(identity.claims.to_string())),
	];
	if config.assume_role {
		settings.push(("role", Param::text(identity.role.as_str())));
	}
	if let Some(timeout) = config.statement_timeout {
		settings.push(("statement_timeout", Param::text(timeout.as_millis().to_string())));
	}
	settings
}

pub(crate) fn projection_sql(settings: &[(&'static str, Param)]) -> String {
	let calls: Vec<String> = settings
		.iter()
		.enumerate()
		.map(|(idx, (name, _))| format!("set_config('{name}', ${}, true)", idx + 1))
		.collect();
	format!("SELECT {}", calls.join(", "))
}

/// Apply the identity to the open transaction. Every setting is
/// transaction-local and disappears on commit or rollback.
pub(crate) async fn project(tx: &Transaction<'_>, identity: &Identity, config: &SessionConfig) -> Result<(), TxnError> {
	let settings = settings(identity, config);
	let sql = projection_sql(&settings);
	let params: Vec<Param> = settings.into_iter().map(|(_, param)| param).collect();
	let binds = binds(&params);
	tx.execute(sql.as_str(), &refs(&binds)).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn test_anonymous_projection() {
		let settings = settings(&Identity::anonymous(), &SessionConfig::default());
		assert_eq!(
			projection_sql(&settings),
			"SELECT set_config('request.jwt.claim.sub', $1, true), set_config('request.jwt.claim.role', $2, true), set_config('request.jwt.claim.email', $3, true), set_config('request.jwt.claims', $4, true)"
		);
		assert_eq!(settings[0].1, Param::text(""));
		assert_eq!(settings[1].1, Param::text("anon"));
	}

	#[test]
	fn test_role_and_timeout_are_optional_extras() {
		let config = SessionConfig {
			assume_role: true,
			statement_timeout: Some(Duration::from_secs(3)),
		};
		let mut identity = Identity::anonymous();
		identity.subject = Some("u1".to_string());
		identity.role = "authenticated".to_string();

		let settings = settings(&identity, &config);
		assert_eq!(settings.len(), 6);
		assert_eq!(settings[0].1, Param::text("u1"));
		assert_eq!(settings[4], ("role", Param::text("authenticated")));
		assert_eq!(settings[5], ("statement_timeout", Param::text("3000")));
	}
}
