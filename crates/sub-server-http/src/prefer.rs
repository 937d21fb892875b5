// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! `Prefer` and `Accept` negotiation.

use axum::http::{HeaderMap, header};
use relay_sql::Resolution;

/// Media type asking for one object instead of an array.
pub const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnPreference {
	/// Empty body.
	#[default]
	Minimal,
	/// Affected rows in the body.
	Representation,
	/// Empty body, headers only.
	HeadersOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preferences {
	pub returning: ReturnPreference,
	/// `count=exact`
	pub count: bool,
	pub resolution: Option<Resolution>,
}

impl Preferences {
	/// Unknown preferences are ignored, as are unreadable header values.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		let mut preferences = Self::default();
		let tokens = headers
			.get_all("prefer")
			.iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(|value| value.split(','))
			.map(str::trim);

		for token in tokens {
			match token {
				"return=representation" => preferences.returning = ReturnPreference::Representation,
				"return=minimal" => preferences.returning = ReturnPreference::Minimal,
				"return=headers-only" => preferences.returning = ReturnPreference::HeadersOnly,
				"count=exact" => preferences.count = true,
				"resolution=merge-duplicates" => preferences.resolution = Some(Resolution::MergeDuplicates),
				"resolution=ignore-duplicates" => preferences.resolution = Some(Resolution::IgnoreDuplicates),
				_ => {}
			}
		}
		preferences
	}

	pub fn wants_rows(&self) -> bool {
		self.returning == ReturnPreference::Representation
	}
}

pub fn wants_single_object(headers: &HeaderMap) -> bool {
	headers
		.get_all(header::ACCEPT)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.any(|value| value.split(',').any(|media| media.trim().starts_with(SINGLE_OBJECT)))
}

/// `Content-Range` for a page starting at `offset` holding `len` rows.
pub fn content_range(offset: u64, len: usize, total: Option<u64>) -> String {
	let total = total.map_or_else(|| "*".to_string(), |t| t.to_string());
	if len == 0 {
		format!("*/{total}")
	} else {
		format!("{}-{}/{}", offset, offset + len as u64 - 1, total)
	}
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;

	use super::*;

	#[test]
	fn test_parse_prefer() {
		let mut headers = HeaderMap::new();
		headers.insert("prefer", HeaderValue::from_static("return=representation, count=exact"));
		headers.append("prefer", HeaderValue::from_static("resolution=merge-duplicates"));

		let preferences = Preferences::from_headers(&headers);
		assert!(preferences.wants_rows());
		assert!(preferences.count);
		assert_eq!(preferences.resolution, Some(Resolution::MergeDuplicates));
	}

	#[test]
	fn test_defaults() {
		let preferences = Preferences::from_headers(&HeaderMap::new());
		assert_eq!(preferences.returning, ReturnPreference::Minimal);
		assert!(!preferences.count);
		assert_eq!(preferences.resolution, None);
	}

	#[test]
	fn test_single_object_accept() {
		let mut headers = HeaderMap::new();
		headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
		assert!(!wants_single_object(&headers));

		headers.insert(header::ACCEPT, HeaderValue::from_static("application/vnd.pgrst.object+json; charset=utf-8"));
		assert!(wants_single_object(&headers));
	}

	#[test]
	fn test_content_range() {
		assert_eq!(content_range(0, 2, Some(3)), "0-1/3");
		assert_eq!(content_range(10, 5, None), "10-14/*");
		assert_eq!(content_range(0, 0, Some(0)), "*/0");
	}
}
