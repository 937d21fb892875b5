// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::{
	error::AuthError,
	identity::{ANON_ROLE, AUTHENTICATED_ROLE, Identity, SERVICE_ROLE},
};

/// Verification settings for bearer credentials.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
	/// HS256 secret. Without one, every token resolves to the anonymous identity.
	pub jwt_secret: Option<String>,
	/// Opaque internal credential mapped to [`Identity::service`].
	pub service_key: Option<String>,
	/// Clock skew tolerated when checking `exp`, in seconds.
	pub leeway: u64,
}

/// The claims Relay reads from a token. Anything else is kept verbatim in
/// [`Identity::claims`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exp: Option<u64>,
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
	let (scheme, token) = header.trim().split_once(' ')?;
	if !scheme.eq_ignore_ascii_case("bearer") {
		return None;
	}
	let token = token.trim();
	if token.is_empty() {
		None
	} else {
		Some(token)
	}
}

/// Stateless verifier turning credentials into identities.
#[derive(Clone)]
pub struct IdentityExtractor {
	decoding_key: Option<DecodingKey>,
	validation: Validation,
	service_key: Option<String>,
}

impl IdentityExtractor {
	pub fn new(config: &AuthConfig) -> Self {
		let mut validation = Validation::new(Algorithm::HS256);
		validation.validate_exp = true;
		validation.validate_nbf = false;
		validation.validate_aud = false;
		validation.leeway = config.leeway;
		validation.set_required_spec_claims(&["exp"]);

		Self {
			decoding_key: config
				.jwt_secret
				.as_deref()
				.filter(|secret| !secret.is_empty())
				.map(|secret| DecodingKey::from_secret(secret.as_bytes())),
			validation,
			service_key: config.service_key.clone().filter(|key| !key.is_empty()),
		}
	}

	/// Resolve a credential, degrading to the anonymous identity on any failure.
	pub fn extract(&self, credential: Option<&str>) -> Identity {
		let Some(token) = credential else {
			return Identity::anonymous();
		};

		match self.verify(token) {
			Ok(identity) => identity,
			Err(err) => {
				debug!("credential rejected, continuing as {}: {}", ANON_ROLE, err);
				Identity::anonymous()
			}
		}
	}

	/// Verify a credential strictly.
	pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
		if self.is_service_key(token) {
			return Ok(Identity::service());
		}

		let key = self.decoding_key.as_ref().ok_or(AuthError::NotConfigured)?;
		let data = decode::<Value>(token, key, &self.validation).map_err(|e| match e.kind() {
			ErrorKind::ExpiredSignature => AuthError::Expired,
			ErrorKind::InvalidSignature => AuthError::InvalidSignature,
			_ => AuthError::Malformed(e.to_string()),
		})?;

		Ok(identity_from_claims(data.claims))
	}

	fn is_service_key(&self, token: &str) -> bool {
		match &self.service_key {
			Some(key) => key.as_bytes().ct_eq(token.as_bytes()).into(),
			None => false,
		}
	}
}

fn identity_from_claims(claims: Value) -> Identity {
	let text = |name: &str| claims.get(name).and_then(Value::as_str).map(str::to_string);

	let subject = text("sub").filter(|s| !s.is_empty());
	let email = text("email");
	let role = match text("role") {
		Some(role) if !role.is_empty() => role,
		_ if subject.is_some() => AUTHENTICATED_ROLE.to_string(),
		_ => ANON_ROLE.to_string(),
	};

	if role == SERVICE_ROLE {
		let mut identity = Identity::service();
		identity.claims = claims;
		return identity;
	}

	Identity {
		subject,
		role,
		email,
		claims,
	}
}

#[cfg(test)]
mod tests {
	use jsonwebtoken::{EncodingKey, Header, encode};

	use super::*;

	const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

	fn extractor() -> IdentityExtractor {
		IdentityExtractor::new(&AuthConfig {
			jwt_secret: Some(SECRET.to_string()),
			service_key: Some("internal-service-key".to_string()),
			leeway: 0,
		})
	}

	fn sign(claims: &Claims, secret: &str) -> String {
		encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
	}

	fn in_an_hour() -> Option<u64> {
		Some((chrono::Utc::now().timestamp() + 3600) as u64)
	}

	#[test]
	fn test_bearer_token_parsing() {
		assert_eq!(bearer_token("Bearer abc"), Some("abc"));
		assert_eq!(bearer_token("bearer   abc "), Some("abc"));
		assert_eq!(bearer_token("Basic abc"), None);
		assert_eq!(bearer_token("Bearer "), None);
		assert_eq!(bearer_token("abc"), None);
	}

	#[test]
	fn test_valid_token_yields_identity() {
		let token = sign(
			&Claims {
				sub: Some("u1".to_string()),
				role: Some("authenticated".to_string()),
				email: Some("u1@example.com".to_string()),
				exp: in_an_hour(),
			},
			SECRET,
		);

		let identity = extractor().extract(Some(&token));
		assert_eq!(identity.subject.as_deref(), Some("u1"));
		assert_eq!(identity.role, "authenticated");
		assert_eq!(identity.email.as_deref(), Some("u1@example.com"));
		assert_eq!(identity.claims["sub"], "u1");
	}

	#[test]
	fn test_missing_role_defaults_to_authenticated() {
		let token = sign(
			&Claims {
				sub: Some("u2".to_string()),
				exp: in_an_hour(),
				..Default::default()
			},
			SECRET,
		);
		assert_eq!(extractor().extract(Some(&token)).role, AUTHENTICATED_ROLE);
	}

	#[test]
	fn test_absent_credential_is_anonymous() {
		assert_eq!(extractor().extract(None), Identity::anonymous());
	}

	#[test]
	fn test_wrong_signature_degrades_to_anonymous() {
		let token = sign(
			&Claims {
				sub: Some("u1".to_string()),
				exp: in_an_hour(),
				..Default::default()
			},
			"a-completely-different-secret-value-0000",
		);
		assert_eq!(extractor().verify(&token), Err(AuthError::InvalidSignature));
		assert!(extractor().extract(Some(&token)).is_anonymous());
	}

	#[test]
	fn test_expired_token_degrades_to_anonymous() {
		let token = sign(
			&Claims {
				sub: Some("u1".to_string()),
				exp: Some((chrono::Utc::now().timestamp() - 3600) as u64),
				..Default::default()
			},
			SECRET,
		);
		assert_eq!(extractor().verify(&token), Err(AuthError::Expired));
		assert!(extractor().extract(Some(&token)).is_anonymous());
	}

	#[test]
	fn test_garbage_token_degrades_to_anonymous() {
		assert!(matches!(extractor().verify("not-a-jwt"), Err(AuthError::Malformed(_))));
		assert!(extractor().extract(Some("not-a-jwt")).is_anonymous());
	}

	#[test]
	fn test_service_key_maps_to_service_identity() {
		let identity = extractor().extract(Some("internal-service-key"));
		assert!(identity.is_service());
		assert_eq!(identity.role, SERVICE_ROLE);
	}

	#[test]
	fn test_service_role_token_maps_to_service_identity() {
		let token = sign(
			&Claims {
				role: Some(SERVICE_ROLE.to_string()),
				exp: in_an_hour(),
				..Default::default()
			},
			SECRET,
		);
		assert!(extractor().extract(Some(&token)).is_service());
	}

	#[test]
	fn test_without_secret_every_token_is_anonymous() {
		let extractor = IdentityExtractor::new(&AuthConfig::default());
		let token = sign(
			&Claims {
				sub: Some("u1".to_string()),
				exp: in_an_hour(),
				..Default::default()
			},
			SECRET,
		);
		assert_eq!(extractor.verify(&token), Err(AuthError::NotConfigured));
		assert!(extractor.extract(Some(&token)).is_anonymous());
	}
}
