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

//! Incremental per-message layout cache (§4.3).
//!
//! [`LayoutEntry`] retains laid-out element positions, a height, and (optionally) a painted
//! pixel buffer for a single [`crate::Message`], invalidating itself when any of the context it
//! was built against — width, scale, flag mask, or the theme/font/image generation counters —
//! changes. The actual measurement is delegated to a [`GlyphMetrics`] implementation supplied by
//! the caller: this crate has no font shaper or painter of its own, so it ships one reference
//! implementation ([`MonospaceMetrics`]) for tests and embedding examples.

pub mod wrap;

use std::sync::Arc;

use crate::{flags::MessageFlags, message::Message};

/// Measures text for layout purposes. The GUI/painting layer (out of scope here) supplies a real
/// font-shaping implementation; [`MonospaceMetrics`] is a reference implementation good enough
/// for tests.
pub trait GlyphMetrics {
	fn text_width(&self, s: &str) -> f32;
	fn line_height(&self) -> f32;
}

/// The theme/font/image generation counters an embedder bumps when its own caches invalidate,
/// checked as part of [`LayoutEntry::ensure_layout`]'s validity predicate (§4.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generations {
	pub theme: u64,
	pub font: u64,
	pub image: u64
}

/// A fixed-width reference [`GlyphMetrics`] implementation.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
	char_width: f32,
	line_height: f32
}

impl MonospaceMetrics {
	pub fn new(char_width: f32, line_height: f32) -> Self {
		Self { char_width, line_height }
	}
}

impl Default for MonospaceMetrics {
	fn default() -> Self {
		Self::new(8.0, 18.0)
	}
}

impl GlyphMetrics for MonospaceMetrics {
	fn text_width(&self, s: &str) -> f32 {
		s.chars().count() as f32 * self.char_width
	}

	fn line_height(&self) -> f32 {
		self.line_height
	}
}

/// A single positioned piece of a laid-out message, referencing its source element by index.
/// `element_index == usize::MAX` marks the synthetic collapsed-mode overflow indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutElement {
	pub element_index: usize,
	pub x: f32,
	pub y: f32,
	pub width: f32,
	pub height: f32
}

impl LayoutElement {
	fn contains(&self, px: f32, py: f32) -> bool {
		px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
	}
}

/// A `(message_index, char_index)` selection endpoint pair. Participates only in painting, never
/// in element positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
	pub start: (usize, usize),
	pub end: (usize, usize)
}

impl Selection {
	pub fn new(start: (usize, usize), end: (usize, usize)) -> Self {
		Self { start, end }
	}

	pub fn min(&self) -> (usize, usize) {
		self.start.min(self.end)
	}

	pub fn max(&self) -> (usize, usize) {
		self.start.max(self.end)
	}
}

/// The render context a [`LayoutEntry`] was last built against.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LayoutContext {
	width: u32,
	scale: u32,
	flag_mask: MessageFlags,
	generations: Generations,
	message_flags: MessageFlags
}

/// A retained, incrementally-revalidated layout for a single message.
///
/// Exclusively owned by a view; destroyed when the message scrolls out of the view's retention
/// window or the view itself is destroyed.
pub struct LayoutEntry {
	message: Arc<Message>,
	context: Option<LayoutContext>,
	elements: Vec<LayoutElement>,
	height: f32,
	pixels: Option<Vec<u8>>,
	buffer_valid: bool,
	expanded: bool,
	selection: Option<Selection>
}

impl LayoutEntry {
	pub fn new(message: Arc<Message>) -> Self {
		Self { message, context: None, elements: Vec::new(), height: 0.0, pixels: None, buffer_valid: false, expanded: false, selection: None }
	}

	pub fn message(&self) -> &Arc<Message> {
		&self.message
	}

	pub fn height(&self) -> f32 {
		self.height
	}

	pub fn elements(&self) -> &[LayoutElement] {
		&self.elements
	}

	pub fn is_expanded(&self) -> bool {
		self.expanded
	}

	/// Flips collapsed/expanded mode. The caller must re-run [`Self::ensure_layout`] afterward;
	/// this alone does not re-layout.
	pub fn toggle_expanded(&mut self) {
		self.expanded = !self.expanded;
		self.context = None;
	}

	pub fn set_selection(&mut self, selection: Option<Selection>) {
		self.selection = selection;
		self.buffer_valid = false;
	}

	pub fn selection(&self) -> Option<Selection> {
		self.selection
	}

	/// Returns whether a cached layout is valid for the given render context, per the §4.3
	/// validity predicate: width, scale, flag mask, theme/font/image generation, and message
	/// flags must all be unchanged.
	fn is_valid_for(&self, ctx: &LayoutContext) -> bool {
		self.context.as_ref() == Some(ctx)
	}

	/// Ensures this entry's element positions are valid for the given context, re-laying out if
	/// necessary. Returns `true` if a re-layout actually happened.
	pub fn ensure_layout(&mut self, metrics: &dyn GlyphMetrics, width: f32, scale: f32, flag_mask: MessageFlags, generations: Generations) -> bool {
		let ctx = LayoutContext {
			width: width as u32,
			scale: (scale * 1000.0) as u32,
			flag_mask,
			generations,
			message_flags: self.message.flags
		};

		if self.is_valid_for(&ctx) {
			return false;
		}

		let result = wrap::wrap(&self.message, metrics, width, 4.0, 4.0, self.expanded);
		self.elements = result.elements;
		self.height = result.height;
		self.context = Some(ctx);
		self.buffer_valid = false;
		self.pixels = None;
		true
	}

	/// Invalidates only the painted buffer (theme or selection change), preserving element
	/// positions.
	pub fn invalidate_buffer(&mut self) {
		self.buffer_valid = false;
		self.pixels = None;
	}

	pub fn buffer_valid(&self) -> bool {
		self.buffer_valid
	}

	pub fn set_pixels(&mut self, pixels: Vec<u8>) {
		self.pixels = Some(pixels);
		self.buffer_valid = true;
	}

	pub fn pixels(&self) -> Option<&[u8]> {
		self.pixels.as_deref()
	}

	/// Returns the index of the first element (in insertion order) whose rectangle contains
	/// `(px, py)`.
	pub fn hit_test(&self, px: f32, py: f32) -> Option<usize> {
		self.elements.iter().find(|el| el.contains(px, py)).map(|el| el.element_index)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::message::MessageBuilder;

	#[test]
	fn relayout_only_when_context_changes() {
		let message = Arc::new(MessageBuilder::new().text("hello world").build());
		let mut entry = LayoutEntry::new(message);
		let metrics = MonospaceMetrics::default();

		assert!(entry.ensure_layout(&metrics, 200.0, 1.0, MessageFlags::empty(), Generations::default()));
		assert!(!entry.ensure_layout(&metrics, 200.0, 1.0, MessageFlags::empty(), Generations::default()));
		assert!(entry.ensure_layout(&metrics, 100.0, 1.0, MessageFlags::empty(), Generations::default()));
	}

	#[test]
	fn buffer_invalidation_preserves_elements() {
		let message = Arc::new(MessageBuilder::new().text("hello").build());
		let mut entry = LayoutEntry::new(message);
		let metrics = MonospaceMetrics::default();
		entry.ensure_layout(&metrics, 200.0, 1.0, MessageFlags::empty(), Generations::default());
		entry.set_pixels(vec![0; 4]);
		let elements_before = entry.elements().to_vec();

		entry.invalidate_buffer();
		assert!(!entry.buffer_valid());
		assert_eq!(entry.elements(), elements_before.as_slice());
	}

	#[test]
	fn selection_min_max() {
		let selection = Selection::new((3, 2), (1, 9));
		assert_eq!(selection.min(), (1, 9));
		assert_eq!(selection.max(), (3, 2));
	}

	#[test]
	fn hit_test_prefers_first_match() {
		let message = Arc::new(MessageBuilder::new().text("ab").build());
		let mut entry = LayoutEntry::new(message);
		let metrics = MonospaceMetrics::new(10.0, 20.0);
		entry.ensure_layout(&metrics, 200.0, 1.0, MessageFlags::empty(), Generations::default());
		assert_eq!(entry.hit_test(5.0, 5.0), Some(0));
	}
}
