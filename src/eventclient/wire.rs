// Copyright 2024 pyke.io
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wire protocol (§6.5), grounded on `examples/original_source/src/providers/seventv/eventapi/Subscription.hpp`'s
//! `Opcode`/`SubscriptionType` enums. Frames are `{"op": <int>, "d": <object>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The full opcode table from the original `Opcode` enum. `Identify`/`Resume`/`Ack`/`Signal` have
/// no bespoke handling beyond being recognized (the source barely uses them beyond
/// acknowledgement bookkeeping), but are represented so an unrecognized-opcode path never fires
/// for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Opcode {
	Dispatch = 0,
	Hello = 1,
	Heartbeat = 2,
	Reconnect = 4,
	Ack = 5,
	Error = 6,
	EndOfStream = 7,
	Identify = 33,
	Resume = 34,
	Subscribe = 35,
	Unsubscribe = 36,
	Signal = 37
}

impl Opcode {
	pub fn from_i32(value: i32) -> Option<Self> {
		Some(match value {
			0 => Self::Dispatch,
			1 => Self::Hello,
			2 => Self::Heartbeat,
			4 => Self::Reconnect,
			5 => Self::Ack,
			6 => Self::Error,
			7 => Self::EndOfStream,
			33 => Self::Identify,
			34 => Self::Resume,
			35 => Self::Subscribe,
			36 => Self::Unsubscribe,
			37 => Self::Signal,
			_ => return None
		})
	}
}

/// A raw, not-yet-dispatched wire frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFrame {
	pub op: i32,
	#[serde(default)]
	pub d: Value
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelloPayload {
	pub heartbeat_interval_ms: u64
}

/// The dispatch `type` field on the wire. Named set is `EmoteSetAdd`/`EmoteSetRemove`/
/// `UserConnectionUpdate`/`CosmeticCreate`/`EntitlementCreateDelete` (§4.4) plus the
/// supplementary kinds from the original `SubscriptionType` enum that a complete client also
/// recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionType {
	#[serde(rename = "emote_set.create")]
	EmoteSetCreate,
	#[serde(rename = "emote_set.update")]
	EmoteSetUpdate,
	#[serde(rename = "user.update")]
	UserUpdate,
	#[serde(rename = "cosmetic.create")]
	CosmeticCreate,
	#[serde(rename = "cosmetic.update")]
	CosmeticUpdate,
	#[serde(rename = "cosmetic.delete")]
	CosmeticDelete,
	#[serde(rename = "entitlement.create")]
	EntitlementCreate,
	#[serde(rename = "entitlement.update")]
	EntitlementUpdate,
	#[serde(rename = "entitlement.delete")]
	EntitlementDelete,
	#[serde(rename = "entitlement.reset")]
	EntitlementReset
}

/// A `(condition, kind)` pair. Two subscriptions with the same wire encoding are the same
/// subscription (§3 Subscription invariant).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
	ObjectId(String),
	Channel(String)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
	pub condition: Condition,
	pub kind: SubscriptionType
}

impl Subscription {
	pub fn new(condition: Condition, kind: SubscriptionType) -> Self {
		Self { condition, kind }
	}

	pub fn to_payload(&self) -> Value {
		let condition = match &self.condition {
			Condition::ObjectId(id) => serde_json::json!({ "object_id": id }),
			Condition::Channel(id) => serde_json::json!({ "id": id })
		};
		serde_json::json!({ "type": self.kind, "condition": condition })
	}

	pub fn encode_frame(&self, op: Opcode) -> RawFrame {
		RawFrame { op: op as i32, d: self.to_payload() }
	}

	/// Parses a `Subscribe`/`Unsubscribe` payload back into a `Subscription`, the inverse of
	/// [`Self::to_payload`]. Used by the round-trip law in §8.
	pub fn from_payload(payload: &Value) -> Option<Self> {
		let kind: SubscriptionType = serde_json::from_value(payload.get("type")?.clone()).ok()?;
		let condition_obj = payload.get("condition")?;
		let condition = if let Some(object_id) = condition_obj.get("object_id").and_then(Value::as_str) {
			Condition::ObjectId(object_id.to_string())
		} else if let Some(id) = condition_obj.get("id").and_then(Value::as_str) {
			Condition::Channel(id.to_string())
		} else {
			return None;
		};
		Some(Self { condition, kind })
	}
}

/// A typed, decoded dispatch event (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
	EmoteSetAdd { emote_set_id: String, emote_id: String },
	EmoteSetRemove { emote_set_id: String, emote_id: String },
	UserConnectionUpdate { user_id: String },
	CosmeticCreate { cosmetic_id: String },
	EntitlementCreateDelete { entitlement_id: String, created: bool }
}

pub fn parse_dispatch(kind: &str, body: &Value) -> Option<Dispatch> {
	let get_str = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
	match kind {
		"emote_set.create" => Some(Dispatch::EmoteSetAdd { emote_set_id: get_str("emote_set_id")?, emote_id: get_str("emote_id")? }),
		"emote_set.delete" => Some(Dispatch::EmoteSetRemove { emote_set_id: get_str("emote_set_id")?, emote_id: get_str("emote_id")? }),
		"user.update" => Some(Dispatch::UserConnectionUpdate { user_id: get_str("user_id")? }),
		"cosmetic.create" => Some(Dispatch::CosmeticCreate { cosmetic_id: get_str("cosmetic_id")? }),
		"entitlement.create" => Some(Dispatch::EntitlementCreateDelete { entitlement_id: get_str("entitlement_id")?, created: true }),
		"entitlement.delete" => Some(Dispatch::EntitlementCreateDelete { entitlement_id: get_str("entitlement_id")?, created: false }),
		_ => None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn opcode_round_trips_known_values() {
		assert_eq!(Opcode::from_i32(0), Some(Opcode::Dispatch));
		assert_eq!(Opcode::from_i32(37), Some(Opcode::Signal));
		assert_eq!(Opcode::from_i32(99), None);
	}

	#[test]
	fn subscription_encode_decode_round_trips() {
		for (condition, kind) in [
			(Condition::ObjectId("abc".into()), SubscriptionType::EmoteSetUpdate),
			(Condition::Channel("123".into()), SubscriptionType::UserUpdate)
		] {
			let sub = Subscription::new(condition, kind);
			let payload = sub.to_payload();
			let decoded = Subscription::from_payload(&payload).unwrap();
			assert_eq!(decoded, sub);
		}
	}

	#[test]
	fn parse_dispatch_recognizes_named_kinds() {
		let body = serde_json::json!({ "emote_set_id": "a", "emote_id": "b" });
		assert_eq!(parse_dispatch("emote_set.create", &body), Some(Dispatch::EmoteSetAdd { emote_set_id: "a".into(), emote_id: "b".into() }));
	}

	#[test]
	fn parse_dispatch_drops_unknown_kind() {
		assert_eq!(parse_dispatch("something.unknown", &serde_json::json!({})), None);
	}
}
