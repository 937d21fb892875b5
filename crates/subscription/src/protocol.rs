// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Channel protocol frames.
//!
//! Every frame in either direction is a JSON object
//! `{"topic", "event", "payload", "ref"}`. Event names follow the Phoenix
//! channel convention used by hosted-backend client libraries; the plain
//! names (`join`, `leave`, `identity-attach`, `presence-track`,
//! `presence-untrack`) are accepted as aliases.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ChannelError;

pub mod event {
	pub const JOIN: &str = "phx_join";
	pub const LEAVE: &str = "phx_leave";
	pub const HEARTBEAT: &str = "heartbeat";
	pub const ACCESS_TOKEN: &str = "access_token";
	pub const PRESENCE: &str = "presence";

	pub const REPLY: &str = "phx_reply";
	pub const SYSTEM: &str = "system";
	pub const POSTGRES_CHANGES: &str = "postgres_changes";
	pub const PRESENCE_STATE: &str = "presence_state";
	pub const PRESENCE_DIFF: &str = "presence_diff";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
	pub topic: String,
	pub event: String,
	#[serde(default)]
	pub payload: Value,
	#[serde(rename = "ref", default, deserialize_with = "reference")]
	pub reference: Option<String>,
}

/// Clients send `ref` as a string, a number or `null`.
fn reference<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::Null => None,
		Value::String(s) => Some(s),
		other => Some(other.to_string()),
	})
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
	Ok,
	Error,
}

impl ReplyStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			ReplyStatus::Ok => "ok",
			ReplyStatus::Error => "error",
		}
	}
}

impl Frame {
	pub fn parse(text: &str) -> Result<Self, ChannelError> {
		serde_json::from_str(text).map_err(|e| ChannelError::MalformedFrame(e.to_string()))
	}

	/// Server-originated frame with no `ref`.
	pub fn push(topic: impl Into<String>, event: &str, payload: Value) -> Self {
		Self {
			topic: topic.into(),
			event: event.to_string(),
			payload,
			reference: None,
		}
	}

	pub fn reply(request: &Frame, status: ReplyStatus, response: Value) -> Self {
		Self {
			topic: request.topic.clone(),
			event: event::REPLY.to_string(),
			payload: json!({
				"status": status.as_str(),
				"response": response,
			}),
			reference: request.reference.clone(),
		}
	}

	pub fn reply_ok(request: &Frame, response: Value) -> Self {
		Self::reply(request, ReplyStatus::Ok, response)
	}

	pub fn reply_error(request: &Frame, error: &ChannelError) -> Self {
		Self::reply(
			request,
			ReplyStatus::Error,
			json!({
				"reason": error.to_string(),
			}),
		)
	}

	pub fn to_text(&self) -> String {
		// A frame is strings and a `Value`; serialization cannot fail.
		serde_json::to_string(self).unwrap_or_default()
	}
}

/// Change subscription requested on join.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeFilterSpec {
	/// `INSERT`, `UPDATE`, `DELETE` or `*`, any case.
	#[serde(default = "any", alias = "operation")]
	pub event: String,
	#[serde(default)]
	pub schema: Option<String>,
	#[serde(default)]
	pub table: Option<String>,
	/// Single column filter, `column=op.value`.
	#[serde(default)]
	pub filter: Option<String>,
}

fn any() -> String {
	"*".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PresenceConfig {
	#[serde(default)]
	pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JoinConfig {
	#[serde(default)]
	pub presence: PresenceConfig,
	#[serde(default, alias = "changes")]
	pub postgres_changes: Vec<ChangeFilterSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JoinPayload {
	#[serde(default)]
	pub config: JoinConfig,
	#[serde(default)]
	pub access_token: Option<String>,
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
	Join(JoinPayload),
	Leave,
	Heartbeat,
	AccessToken(Option<String>),
	Track(Map<String, Value>),
	Untrack,
}

impl ClientEvent {
	pub fn from_frame(frame: &Frame) -> Result<Self, ChannelError> {
		match frame.event.as_str() {
			event::JOIN | "join" => {
				if frame.payload.is_null() {
					return Ok(ClientEvent::Join(JoinPayload::default()));
				}
				let payload = JoinPayload::deserialize(&frame.payload)
					.map_err(|e| ChannelError::MalformedFrame(e.to_string()))?;
				Ok(ClientEvent::Join(payload))
			}
			event::LEAVE | "leave" => Ok(ClientEvent::Leave),
			event::HEARTBEAT => Ok(ClientEvent::Heartbeat),
			event::ACCESS_TOKEN | "identity-attach" => Ok(ClientEvent::AccessToken(
				frame.payload.get("access_token").and_then(Value::as_str).map(str::to_string),
			)),
			event::PRESENCE => match frame.payload.get("event").and_then(Value::as_str) {
				Some("track") => Ok(ClientEvent::Track(presence_meta(&frame.payload))),
				Some("untrack") => Ok(ClientEvent::Untrack),
				other => Err(ChannelError::UnknownEvent(format!("presence/{}", other.unwrap_or("")))),
			},
			"presence-track" => Ok(ClientEvent::Track(presence_meta(&frame.payload))),
			"presence-untrack" => Ok(ClientEvent::Untrack),
			other => Err(ChannelError::UnknownEvent(other.to_string())),
		}
	}
}

/// Metadata of a track request: the nested `payload` object when present,
/// otherwise the payload itself without its envelope keys.
fn presence_meta(payload: &Value) -> Map<String, Value> {
	if let Some(Value::Object(meta)) = payload.get("payload") {
		return meta.clone();
	}
	match payload {
		Value::Object(map) => {
			let mut meta = map.clone();
			meta.remove("event");
			meta.remove("type");
			meta
		}
		_ => Map::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_frame_with_numeric_ref() {
		let frame = Frame::parse(r#"{"topic":"room:1","event":"heartbeat","payload":{},"ref":7}"#).unwrap();
		assert_eq!(frame.reference.as_deref(), Some("7"));
	}

	#[test]
	fn test_parse_frame_without_ref() {
		let frame = Frame::parse(r#"{"topic":"phoenix","event":"heartbeat","payload":{}}"#).unwrap();
		assert_eq!(frame.reference, None);
	}

	#[test]
	fn test_malformed_frame() {
		assert!(matches!(Frame::parse("{not json"), Err(ChannelError::MalformedFrame(_))));
		assert!(matches!(Frame::parse(r#"{"event":"heartbeat"}"#), Err(ChannelError::MalformedFrame(_))));
	}

	#[test]
	fn test_join_payload() {
		let frame = Frame::parse(
			r#"{"topic":"realtime:orders","event":"phx_join","ref":"1","payload":{
				"config":{
					"presence":{"key":"u1"},
					"postgres_changes":[{"event":"UPDATE","schema":"public","table":"orders","filter":"user_id=eq.u1"}]
				}
			}}"#,
		)
		.unwrap();

		let ClientEvent::Join(join) = ClientEvent::from_frame(&frame).unwrap() else {
			panic!("expected join");
		};
		assert_eq!(join.config.presence.key, "u1");
		assert_eq!(join.config.postgres_changes.len(), 1);
		assert_eq!(join.config.postgres_changes[0].filter.as_deref(), Some("user_id=eq.u1"));
	}

	#[test]
	fn test_aliases() {
		let frame = Frame::push("t", "join", Value::Null);
		assert_eq!(ClientEvent::from_frame(&frame).unwrap(), ClientEvent::Join(JoinPayload::default()));

		let frame = Frame::push("t", "identity-attach", json!({"access_token": "abc"}));
		assert_eq!(ClientEvent::from_frame(&frame).unwrap(), ClientEvent::AccessToken(Some("abc".to_string())));

		let frame = Frame::push("t", "presence-untrack", json!({}));
		assert_eq!(ClientEvent::from_frame(&frame).unwrap(), ClientEvent::Untrack);
	}

	#[test]
	fn test_presence_track_meta() {
		let frame = Frame::push("t", event::PRESENCE, json!({"type": "presence", "event": "track", "payload": {"name": "ann"}}));
		let ClientEvent::Track(meta) = ClientEvent::from_frame(&frame).unwrap() else {
			panic!("expected track");
		};
		assert_eq!(meta.get("name"), Some(&json!("ann")));

		let frame = Frame::push("t", "presence-track", json!({"name": "bob"}));
		let ClientEvent::Track(meta) = ClientEvent::from_frame(&frame).unwrap() else {
			panic!("expected track");
		};
		assert_eq!(Value::Object(meta), json!({"name": "bob"}));
	}

	#[test]
	fn test_unknown_event() {
		let frame = Frame::push("t", "broadcast", json!({}));
		assert_eq!(ClientEvent::from_frame(&frame), Err(ChannelError::UnknownEvent("broadcast".to_string())));
	}

	#[test]
	fn test_reply_echoes_ref() {
		let request = Frame::parse(r#"{"topic":"t","event":"heartbeat","payload":{},"ref":"9"}"#).unwrap();
		let reply = Frame::reply_ok(&request, json!({}));
		assert_eq!(reply.event, event::REPLY);
		assert_eq!(reply.reference.as_deref(), Some("9"));
		assert_eq!(reply.payload["status"], "ok");
		assert!(reply.to_text().contains(r#""ref":"9""#));
	}
}
