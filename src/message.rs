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

//! The message data model (§3): an immutable, shared-ownership [`Message`] made up of an ordered
//! sequence of [`Element`]s, built incrementally via [`MessageBuilder`].

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::flags::{MessageFlag, MessageFlags};

/// A single emote reference carried by an [`Element::Image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmoteRef {
	pub name: String,
	pub url: String
}

/// A badge reference carried by an [`Element::Badge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRef {
	pub name: String,
	pub url: String
}

/// A polymorphic unit of message content.
///
/// Re-expressed from the original's virtual `MessageElement` class hierarchy as a tagged enum
/// (see DESIGN.md, "dynamic dispatch via inheritance").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
	Text {
		text: String,
		flags: MessageFlags,
		link: Option<String>,
		tooltip: Option<String>
	},
	Image {
		emote: EmoteRef,
		flags: MessageFlags,
		link: Option<String>,
		tooltip: Option<String>
	},
	Timestamp {
		flags: MessageFlags
	},
	Badge {
		badge: BadgeRef,
		flags: MessageFlags,
		tooltip: Option<String>
	},
	ModerationButton {
		flags: MessageFlags
	}
}

impl Element {
	/// The render-context flags this element participates in.
	pub fn flags(&self) -> MessageFlags {
		match self {
			Self::Text { flags, .. } => *flags,
			Self::Image { flags, .. } => *flags,
			Self::Timestamp { flags } => *flags,
			Self::Badge { flags, .. } => *flags,
			Self::ModerationButton { flags } => *flags
		}
	}

	/// The element's searchable/printable text, used for similarity fingerprints and hit tests.
	pub fn text(&self) -> &str {
		match self {
			Self::Text { text, .. } => text,
			Self::Image { emote, .. } => &emote.name,
			Self::Badge { badge, .. } => &badge.name,
			Self::Timestamp { .. } | Self::ModerationButton { .. } => ""
		}
	}
}

/// An immutable chat message. Always held behind `Arc` once published — see DESIGN.md.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
	/// Provider-assigned identifier. May be empty for synthetic (system) messages.
	pub id: String,
	pub received_at: DateTime<Utc>,
	pub parsed_at: DateTime<Utc>,
	pub login_name: String,
	pub display_name: String,
	pub localized_name: Option<String>,
	pub flags: MessageFlags,
	/// A cheap rolling hash of element text, used for similarity filtering. Not cryptographic.
	pub fingerprint: u64,
	pub elements: Vec<Element>
}

impl Message {
	/// `true` if this message carries a provider-assigned, non-empty id (and can thus be found
	/// via [`crate::History::find_by_id`]).
	pub fn has_stable_id(&self) -> bool {
		!self.id.is_empty()
	}

	/// The plain-text contents of all elements concatenated, used for substring search/logging.
	pub fn plain_text(&self) -> String {
		self.elements.iter().map(Element::text).collect::<Vec<_>>().join("")
	}
}

fn fingerprint_of(elements: &[Element]) -> u64 {
	let mut hasher = std::collections::hash_map::DefaultHasher::new();
	for element in elements {
		element.text().hash(&mut hasher);
	}
	hasher.finish()
}

/// Incrementally constructs a [`Message`].
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
	id: String,
	received_at: Option<DateTime<Utc>>,
	parsed_at: Option<DateTime<Utc>>,
	login_name: String,
	display_name: String,
	localized_name: Option<String>,
	flags: MessageFlags,
	elements: Vec<Element>
}

impl MessageBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn id(mut self, id: impl Into<String>) -> Self {
		self.id = id.into();
		self
	}

	pub fn received_at(mut self, at: DateTime<Utc>) -> Self {
		self.received_at = Some(at);
		self
	}

	pub fn login_name(mut self, login_name: impl Into<String>) -> Self {
		self.login_name = login_name.into();
		self
	}

	pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
		self.display_name = display_name.into();
		self
	}

	pub fn localized_name(mut self, localized_name: impl Into<String>) -> Self {
		self.localized_name = Some(localized_name.into());
		self
	}

	pub fn flag(mut self, flag: MessageFlag) -> Self {
		self.flags.set(flag);
		self
	}

	pub fn flags(mut self, flags: MessageFlags) -> Self {
		self.flags = flags;
		self
	}

	pub fn element(mut self, element: Element) -> Self {
		self.elements.push(element);
		self
	}

	pub fn elements(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
		self.elements.extend(elements);
		self
	}

	pub fn text(self, text: impl Into<String>) -> Self {
		self.element(Element::Text {
			text: text.into(),
			flags: MessageFlags::empty(),
			link: None,
			tooltip: None
		})
	}

	/// Finalizes the builder into a [`Message`].
	pub fn build(self) -> Message {
		let now = self.received_at.unwrap_or_else(Utc::now);
		Message {
			id: self.id,
			received_at: now,
			parsed_at: self.parsed_at.unwrap_or(now),
			login_name: self.login_name,
			display_name: self.display_name,
			localized_name: self.localized_name,
			flags: self.flags,
			fingerprint: fingerprint_of(&self.elements),
			elements: self.elements
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builder_produces_stable_fingerprint_for_identical_text() {
		let a = MessageBuilder::new().login_name("pajlada").text("hello").build();
		let b = MessageBuilder::new().login_name("someone_else").text("hello").build();
		assert_eq!(a.fingerprint, b.fingerprint);
	}

	#[test]
	fn empty_id_is_not_stable() {
		let message = MessageBuilder::new().text("hi").build();
		assert!(!message.has_stable_id());
	}

	#[test]
	fn plain_text_concatenates_elements() {
		let message = MessageBuilder::new()
			.text("hello ")
			.element(Element::Image {
				emote: EmoteRef { name: "Kappa".into(), url: "https://example/Kappa".into() },
				flags: MessageFlags::empty(),
				link: None,
				tooltip: None
			})
			.build();
		assert_eq!(message.plain_text(), "hello Kappa");
	}
}
