// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

pub const TEST_SECRET: &str = "relay-test-secret-with-at-least-32-characters";

/// HS256 token over `claims`, valid for an hour unless `claims` sets `exp`.
pub fn sign_token(secret: &str, claims: Value) -> String {
	let mut claims = claims;
	if let Value::Object(map) = &mut claims {
		map.entry("exp").or_insert_with(|| json!(chrono::Utc::now().timestamp() + 3600));
	}
	encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
		.expect("failed to sign test token")
}
