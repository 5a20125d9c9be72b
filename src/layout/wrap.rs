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

//! The line-wrapping algorithm (§4.3): left-to-right placement wrapping at word boundaries,
//! falling back to character-by-character breaks for over-wide words, with compact-emote and
//! centered-line post-processing.

use crate::{
	flags::MessageFlag,
	layout::{GlyphMetrics, LayoutElement},
	message::{Element, Message}
};

/// A fixed pixel height collapsed messages are truncated to, scaled by the render context.
pub const COLLAPSED_HEIGHT: f32 = 32.0;
/// Line-height reduction applied to lines made up only of image elements.
const COMPACT_EMOTE_OFFSET: f32 = 4.0;

pub struct WrapResult {
	pub elements: Vec<LayoutElement>,
	pub height: f32
}

/// Lays out `message`'s elements against `width`, honoring compact-emote and centered-message
/// rules. `expanded` controls whether a [`MessageFlag::Collapsed`] message is truncated.
pub fn wrap(message: &Message, metrics: &dyn GlyphMetrics, width: f32, margin_left: f32, margin_right: f32, expanded: bool) -> WrapResult {
	let usable_width = (width - margin_left - margin_right).max(1.0);
	let line_height = metrics.line_height();

	let mut lines: Vec<Vec<LayoutElement>> = vec![vec![]];
	let mut cursor_x = 0.0f32;

	for (index, element) in message.elements.iter().enumerate() {
		place_element(element, index, metrics, usable_width, &mut lines, &mut cursor_x, line_height);
	}

	let mut placed: Vec<LayoutElement> = Vec::new();
	let mut y = 0.0f32;
	let mut total_height = 0.0f32;

	for line in &lines {
		let is_compact = !line.is_empty() && line.iter().all(|el| matches!(message.elements[el.element_index], Element::Image { .. }));
		let this_line_height = if is_compact { (line_height - COMPACT_EMOTE_OFFSET).max(1.0) } else { line_height };

		for el in line {
			placed.push(LayoutElement { y, height: this_line_height, ..el.clone() });
		}
		y += this_line_height;
		total_height = y;
	}

	for el in &mut placed {
		el.x += margin_left;
	}

	if message.flags.has(MessageFlag::Centered) {
		if let Some(last_line_start) = placed.iter().rposition(|el| el.y == placed.last().map(|l| l.y).unwrap_or(0.0)) {
			recenter_last_line(&mut placed, last_line_start, usable_width);
		}
	}

	if message.flags.has(MessageFlag::Collapsed) && !expanded && total_height > COLLAPSED_HEIGHT {
		placed.retain(|el| el.y < COLLAPSED_HEIGHT);
		placed.push(LayoutElement { element_index: usize::MAX, x: margin_left, y: COLLAPSED_HEIGHT - line_height, width: usable_width, height: line_height });
		total_height = COLLAPSED_HEIGHT;
	}

	WrapResult { elements: placed, height: total_height }
}

fn place_element(
	element: &Element,
	index: usize,
	metrics: &dyn GlyphMetrics,
	usable_width: f32,
	lines: &mut Vec<Vec<LayoutElement>>,
	cursor_x: &mut f32,
	line_height: f32
) {
	let text = element.text();
	if text.is_empty() {
		push_to_line(lines, LayoutElement { element_index: index, x: *cursor_x, y: 0.0, width: 0.0, height: line_height });
		return;
	}

	for word in split_preserving_spaces(text) {
		let word_width = metrics.text_width(word);

		if word_width > usable_width {
			// character-by-character fallback: break at the widest prefix that still fits.
			let mut remaining = word;
			while !remaining.is_empty() {
				let mut taken = 0usize;
				let mut acc = 0.0f32;
				for ch in remaining.chars() {
					let ch_width = metrics.text_width(&ch.to_string());
					if *cursor_x + acc + ch_width > usable_width && taken > 0 {
						break;
					}
					acc += ch_width;
					taken += ch.len_utf8();
				}
				if taken == 0 {
					taken = remaining.chars().next().map(char::len_utf8).unwrap_or(remaining.len());
					acc = metrics.text_width(&remaining[..taken]);
				}
				push_to_line(lines, LayoutElement { element_index: index, x: *cursor_x, y: 0.0, width: acc, height: line_height });
				*cursor_x += acc;
				remaining = &remaining[taken..];
				if !remaining.is_empty() {
					new_line(lines, cursor_x);
				}
			}
			continue;
		}

		if *cursor_x + word_width > usable_width && *cursor_x > 0.0 {
			new_line(lines, cursor_x);
		}

		push_to_line(lines, LayoutElement { element_index: index, x: *cursor_x, y: 0.0, width: word_width, height: line_height });
		*cursor_x += word_width;
	}
}

fn push_to_line(lines: &mut [Vec<LayoutElement>], el: LayoutElement) {
	lines.last_mut().unwrap().push(el);
}

fn new_line(lines: &mut Vec<Vec<LayoutElement>>, cursor_x: &mut f32) {
	lines.push(vec![]);
	*cursor_x = 0.0;
}

/// Splits on whitespace while keeping each whitespace run attached to the following word, so
/// word-boundary wrapping doesn't eat spacing. Good enough for the monospace reference metrics;
/// real shaping is the caller's job.
fn split_preserving_spaces(text: &str) -> Vec<&str> {
	if text.is_empty() {
		return vec![];
	}
	text.split_inclusive(' ').collect()
}

fn recenter_last_line(placed: &mut [LayoutElement], start: usize, usable_width: f32) {
	let line = &placed[start..];
	if line.is_empty() {
		return;
	}
	let line_width: f32 = line.iter().map(|el| el.width).sum();
	let offset = ((usable_width - line_width) / 2.0).max(0.0);
	for el in &mut placed[start..] {
		el.x += offset;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layout::MonospaceMetrics;

	fn text_message(text: &str) -> Message {
		crate::message::MessageBuilder::new().text(text).build()
	}

	#[test]
	fn wraps_at_word_boundary() {
		let metrics = MonospaceMetrics::new(10.0, 20.0);
		let message = text_message("hello world foo");
		let result = wrap(&message, &metrics, 100.0, 0.0, 0.0, true);
		assert!(result.elements.iter().any(|el| el.y > 0.0), "expected a wrap onto a second line");
	}

	#[test]
	fn compact_emote_line_reduces_height() {
		let metrics = MonospaceMetrics::new(10.0, 20.0);
		let message = crate::message::MessageBuilder::new()
			.element(Element::Image {
				emote: crate::message::EmoteRef { name: "Kappa".into(), url: "u".into() },
				flags: crate::flags::MessageFlags::empty(),
				link: None,
				tooltip: None
			})
			.build();
		let result = wrap(&message, &metrics, 500.0, 0.0, 0.0, true);
		assert!(result.elements[0].height < 20.0);
	}

	#[test]
	fn collapsed_truncates_when_not_expanded() {
		let metrics = MonospaceMetrics::new(10.0, 20.0);
		let mut message = text_message(&"word ".repeat(50));
		message.flags.set(MessageFlag::Collapsed);
		let collapsed = wrap(&message, &metrics, 50.0, 0.0, 0.0, false);
		assert_eq!(collapsed.height, COLLAPSED_HEIGHT);
		let expanded = wrap(&message, &metrics, 50.0, 0.0, 0.0, true);
		assert!(expanded.height > collapsed.height);
	}
}
