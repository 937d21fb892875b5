// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use crate::error::SqlError;

/// A table, column or function name that passed validation.
///
/// The stored form is lowercase with hyphens rewritten to underscores, so a
/// client may address `blog-posts` and reach the `blog_posts` table. Only the
/// quoted form is ever written into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
	pub fn parse(raw: &str) -> Result<Self, SqlError> {
		if !is_valid(raw) {
			return Err(SqlError::InvalidIdentifier(raw.to_string()));
		}
		Ok(Self(raw.to_ascii_lowercase().replace('-', "_")))
	}

	/// For names fixed at compile time, which bypass validation.
	pub(crate) fn fixed(name: &'static str) -> Self {
		Self(name.to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Double-quoted SQL form.
	pub fn quoted(&self) -> String {
		format!("\"{}\"", self.0)
	}

	/// Single-quoted literal form, used as a key inside `json_build_object`.
	pub fn literal(&self) -> String {
		format!("'{}'", self.0)
	}
}

impl Display for Identifier {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// `[A-Za-z_][A-Za-z0-9_-]*`
pub fn is_valid(raw: &str) -> bool {
	let mut chars = raw.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_accepts_plain_names() {
		assert_eq!(Identifier::parse("posts").unwrap().quoted(), "\"posts\"");
		assert_eq!(Identifier::parse("_private").unwrap().as_str(), "_private");
		assert_eq!(Identifier::parse("created_at2").unwrap().as_str(), "created_at2");
	}

	#[test]
	fn test_normalizes_case_and_hyphens() {
		assert_eq!(Identifier::parse("Blog-Posts").unwrap().quoted(), "\"blog_posts\"");
	}

	#[test]
	fn test_rejects_everything_else() {
		for raw in ["", "1posts", "-posts", "posts;", "po\"sts", "a b", "a.b", "posts'--", "ünicode", "a(b)"] {
			assert_eq!(Identifier::parse(raw), Err(SqlError::InvalidIdentifier(raw.to_string())), "{raw}");
		}
	}
}
