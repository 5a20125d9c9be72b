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

//! Pluggable chat-input completion (§4.7): a [`CompletionSource`] owns a pool of candidate
//! strings and narrows it against a query via a [`CompletionStrategy`]. Grounded on Chatterino's
//! `src/providers/autocomplete/` strategy classes, re-expressed as traits instead of an
//! inheritance hierarchy (see DESIGN.md).

pub mod sources;
pub mod strategies;

pub use self::sources::{CommandSource, EmoteSource, SourceKind, UnifiedSource, UserSource};
pub use self::strategies::{ClassicEmoteStrategy, ClassicUserStrategy, CommandStrategy, PrefixOnlyEmoteStrategy};

/// Narrows a list of candidate strings against a raw query.
pub trait CompletionStrategy {
	fn apply<'a>(&self, query: &str, candidates: &[&'a str]) -> Vec<&'a str>;
}

/// A single completion candidate: what's shown in a popup, what it was matched against, and
/// what's actually inserted into the input on selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
	pub display: String,
	pub search: String,
	pub insert: String
}

/// A pool of completion candidates that knows how to match itself against a query and emit the
/// result either to a popup list view or as plain insertion strings for an inline tab-completer
/// (§4.7).
pub trait CompletionSource {
	/// Recomputes this source's matches against `query`. Must be called before either `emit_*`
	/// method to refresh the result for a new query.
	fn update(&mut self, query: &str);

	/// Pushes up to `cap` matched items onto `model`, for a popup list view.
	fn emit_listview(&self, model: &mut Vec<CompletionItem>, cap: usize);

	/// Pushes up to `cap` matched items' tab-insertion forms onto `list`, for an inline
	/// tab-completer. `is_first_word` controls sources (like [`sources::UserSource`]) that vary
	/// their insertion form depending on cursor position.
	fn emit_stringlist(&self, list: &mut Vec<String>, cap: usize, is_first_word: bool);
}
