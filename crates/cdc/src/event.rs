// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::CdcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOperation {
	Insert,
	Update,
	Delete,
}

impl ChangeOperation {
	pub fn as_str(&self) -> &'static str {
		match self {
			ChangeOperation::Insert => "INSERT",
			ChangeOperation::Update => "UPDATE",
			ChangeOperation::Delete => "DELETE",
		}
	}
}

impl FromStr for ChangeOperation {
	type Err = CdcError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"INSERT" => Ok(ChangeOperation::Insert),
			"UPDATE" => Ok(ChangeOperation::Update),
			"DELETE" => Ok(ChangeOperation::Delete),
			_ => Err(CdcError::Decode(format!("unknown operation \"{s}\""))),
		}
	}
}

impl Display for ChangeOperation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for ChangeOperation {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for ChangeOperation {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

/// One row change, as emitted by the database trigger:
/// `{"schema", "table", "type", "record", "old_record"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
	pub schema: String,
	pub table: String,
	#[serde(rename = "type")]
	pub operation: ChangeOperation,
	#[serde(default)]
	pub record: Option<Value>,
	#[serde(default)]
	pub old_record: Option<Value>,
}

impl ChangeEvent {
	pub fn parse(payload: &str) -> Result<Self, CdcError> {
		serde_json::from_str(payload).map_err(|e| CdcError::Decode(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_parse_trigger_payload() {
		let event = ChangeEvent::parse(
			r#"{"schema":"public","table":"orders","type":"update","record":{"id":1,"user_id":"u1"},"old_record":{"id":1,"user_id":"u0"}}"#,
		)
		.unwrap();
		assert_eq!(event.operation, ChangeOperation::Update);
		assert_eq!(event.record, Some(json!({"id": 1, "user_id": "u1"})));
		assert_eq!(event.old_record.unwrap()["user_id"], "u0");
	}

	#[test]
	fn test_delete_has_no_record() {
		let event = ChangeEvent::parse(r#"{"schema":"public","table":"t","type":"DELETE","old_record":{"id":1}}"#).unwrap();
		assert_eq!(event.operation, ChangeOperation::Delete);
		assert_eq!(event.record, None);
	}

	#[test]
	fn test_serializes_uppercase_type() {
		let event = ChangeEvent {
			schema: "public".to_string(),
			table: "t".to_string(),
			operation: ChangeOperation::Insert,
			record: Some(json!({"id": 1})),
			old_record: None,
		};
		assert_eq!(serde_json::to_value(&event).unwrap()["type"], "INSERT");
	}

	#[test]
	fn test_rejects_garbage() {
		assert!(matches!(ChangeEvent::parse("not json"), Err(CdcError::Decode(_))));
		assert!(matches!(
			ChangeEvent::parse(r#"{"schema":"public","table":"t","type":"TRUNCATE"}"#),
			Err(CdcError::Decode(_))
		));
	}
}
