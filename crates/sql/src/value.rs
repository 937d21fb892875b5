// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! JSON body values to bind parameters.

use serde_json::Value;
use uuid::Uuid;

use crate::param::Param;

/// A bound value plus the explicit cast its placeholder needs, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bound {
	pub param: Param,
	pub cast: Option<&'static str>,
}

impl Bound {
	fn untyped(param: Param) -> Self {
		Self {
			param,
			cast: None,
		}
	}

	fn cast(param: Param, cast: &'static str) -> Self {
		Self {
			param,
			cast: Some(cast),
		}
	}

	/// `$n` or `$n::cast`.
	pub(crate) fn placeholder(&self, placeholder: String) -> String {
		match self.cast {
			Some(cast) => format!("{placeholder}::{cast}"),
			None => placeholder,
		}
	}
}

/// Encode a value written into a table column.
///
/// Scalars are bound untyped and parsed by the server as the column's type.
/// Arrays and objects are sent as `jsonb`.
pub(crate) fn column_value(value: &Value) -> Bound {
	match value {
		Value::Null => Bound::untyped(Param::Null),
		Value::Bool(b) => Bound::untyped(Param::Text(b.to_string())),
		Value::Number(n) => Bound::untyped(Param::Text(n.to_string())),
		Value::String(s) => Bound::untyped(Param::Text(s.clone())),
		Value::Array(_) | Value::Object(_) => Bound::cast(Param::Text(value.to_string()), "jsonb"),
	}
}

/// Encode a named function argument, inferring a cast from the value shape.
pub(crate) fn function_argument(value: &Value) -> Bound {
	match value {
		Value::String(s) if is_uuid(s) => Bound::cast(Param::Text(s.clone()), "uuid"),
		Value::Number(n) => match n.as_i64() {
			Some(i) if i32::try_from(i).is_ok() => Bound::cast(Param::Text(i.to_string()), "integer"),
			Some(i) => Bound::cast(Param::Text(i.to_string()), "bigint"),
			None if n.is_u64() => Bound::cast(Param::Text(n.to_string()), "bigint"),
			None => Bound::untyped(Param::Text(n.to_string())),
		},
		Value::Bool(b) => Bound::cast(Param::Text(b.to_string()), "boolean"),
		Value::Object(_) => Bound::cast(Param::Text(value.to_string()), "jsonb"),
		_ => column_value(value),
	}
}

fn is_uuid(raw: &str) -> bool {
	raw.len() == 36 && Uuid::parse_str(raw).is_ok()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_column_scalars_are_untyped() {
		assert_eq!(column_value(&json!("x")), Bound::untyped(Param::text("x")));
		assert_eq!(column_value(&json!(42)), Bound::untyped(Param::text("42")));
		assert_eq!(column_value(&json!(true)), Bound::untyped(Param::text("true")));
		assert_eq!(column_value(&Value::Null), Bound::untyped(Param::Null));
	}

	#[test]
	fn test_column_structures() {
		assert_eq!(column_value(&json!(["a", "b\"c", null, 3])), Bound::cast(Param::text(r#"["a","b\"c",null,3]"#), "jsonb"));
		assert_eq!(column_value(&json!({"k": 1})), Bound::cast(Param::text(r#"{"k":1}"#), "jsonb"));
		assert_eq!(column_value(&json!([{"k": 1}])), Bound::cast(Param::text(r#"[{"k":1}]"#), "jsonb"));
	}

	#[test]
	fn test_function_argument_casts() {
		let id = "7b2c1a7e-1f0a-4e0e-9a5b-2d1b6f0d9c11";
		assert_eq!(function_argument(&json!(id)).cast, Some("uuid"));
		assert_eq!(function_argument(&json!("not-a-uuid")).cast, None);
		assert_eq!(function_argument(&json!(7)).cast, Some("integer"));
		assert_eq!(function_argument(&json!(-7)).cast, Some("integer"));
		assert_eq!(function_argument(&json!(10_000_000_000i64)).cast, Some("bigint"));
		assert_eq!(function_argument(&json!(1.5)).cast, None);
		assert_eq!(function_argument(&json!(false)).cast, Some("boolean"));
		assert_eq!(function_argument(&json!({"a": 1})).cast, Some("jsonb"));
		assert_eq!(function_argument(&json!([1, 2])).cast, Some("jsonb"));
		assert_eq!(function_argument(&Value::Null), Bound::untyped(Param::Null));
	}

	#[test]
	fn test_placeholder() {
		assert_eq!(Bound::cast(Param::Null, "uuid").placeholder("$3".to_string()), "$3::uuid");
		assert_eq!(Bound::untyped(Param::Null).placeholder("$3".to_string()), "$3");
	}
}
