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

use std::ops::{BitOr, BitOrAssign};

/// A single message flag bit.
///
/// These values are stable across versions: they're serialized in telemetry and logs, so the
/// numeric discriminants must never change once shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageFlag {
	System = 0,
	Timeout = 1,
	Highlighted = 2,
	DoNotTriggerNotification = 3,
	Centered = 4,
	Disabled = 5,
	DisableCompactEmotes = 6,
	Collapsed = 7,
	ConnectedMessage = 8,
	DisconnectedMessage = 9,
	Untimeout = 10,
	PubSub = 11,
	Subscription = 12,
	DoNotLog = 13,
	AutoMod = 14,
	RecentMessage = 15,
	Whisper = 16,
	HighlightedWhisper = 17,
	Action = 36,
	ClearChat = 39
}

impl MessageFlag {
	const fn bit(self) -> u64 {
		1u64 << (self as u8)
	}
}

impl BitOr for MessageFlag {
	type Output = MessageFlags;

	fn bitor(self, rhs: Self) -> Self::Output {
		MessageFlags(self.bit() | rhs.bit())
	}
}

/// A 64-bit set of [`MessageFlag`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageFlags(u64);

impl MessageFlags {
	pub const fn empty() -> Self {
		Self(0)
	}

	pub const fn from_bits(bits: u64) -> Self {
		Self(bits)
	}

	pub const fn bits(self) -> u64 {
		self.0
	}

	pub fn set(&mut self, flag: MessageFlag) {
		self.0 |= flag.bit();
	}

	pub fn unset(&mut self, flag: MessageFlag) {
		self.0 &= !flag.bit();
	}

	pub const fn has(self, flag: MessageFlag) -> bool {
		self.0 & flag.bit() != 0
	}

	pub fn with(mut self, flag: MessageFlag) -> Self {
		self.set(flag);
		self
	}

	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	pub const fn intersects(self, other: Self) -> bool {
		self.0 & other.0 != 0
	}
}

impl From<MessageFlag> for MessageFlags {
	fn from(value: MessageFlag) -> Self {
		Self(value.bit())
	}
}

impl BitOr<MessageFlag> for MessageFlags {
	type Output = Self;

	fn bitor(self, rhs: MessageFlag) -> Self::Output {
		Self(self.0 | rhs.bit())
	}
}

impl BitOrAssign<MessageFlag> for MessageFlags {
	fn bitor_assign(&mut self, rhs: MessageFlag) {
		self.0 |= rhs.bit();
	}
}

impl BitOr for MessageFlags {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self::Output {
		Self(self.0 | rhs.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flag_bits_are_stable() {
		assert_eq!(MessageFlag::System.bit(), 1);
		assert_eq!(MessageFlag::Timeout.bit(), 1 << 1);
		assert_eq!(MessageFlag::Action.bit(), 1 << 36);
		assert_eq!(MessageFlag::ClearChat.bit(), 1 << 39);
	}

	#[test]
	fn set_unset_has() {
		let mut flags = MessageFlags::empty();
		assert!(!flags.has(MessageFlag::Disabled));
		flags.set(MessageFlag::Disabled);
		assert!(flags.has(MessageFlag::Disabled));
		flags.unset(MessageFlag::Disabled);
		assert!(!flags.has(MessageFlag::Disabled));
	}

	#[test]
	fn combine_with_bitor() {
		let flags = MessageFlag::Highlighted | MessageFlag::Centered;
		assert!(flags.has(MessageFlag::Highlighted));
		assert!(flags.has(MessageFlag::Centered));
		assert!(!flags.has(MessageFlag::Timeout));
	}
}
