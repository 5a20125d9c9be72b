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

//! Candidate sources (§4.7): each owns a pool of names and a [`super::CompletionStrategy`] to
//! narrow them against a query, remembering the last query's matches until the next `update`.

use super::{
	strategies::{ClassicEmoteStrategy, ClassicUserStrategy, CommandStrategy},
	CompletionItem, CompletionSource, CompletionStrategy
};

fn take_into<T>(out: &mut Vec<T>, items: impl IntoIterator<Item = T>, cap: usize) {
	for item in items {
		if out.len() >= cap {
			break;
		}
		out.push(item);
	}
}

/// Completes against a fixed pool of emote names.
pub struct EmoteSource {
	names: Vec<String>,
	strategy: Box<dyn CompletionStrategy + Send + Sync>,
	matches: Vec<String>
}

impl EmoteSource {
	pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self { names: names.into_iter().map(Into::into).collect(), strategy: Box::new(ClassicEmoteStrategy), matches: Vec::new() }
	}

	pub fn with_strategy(mut self, strategy: impl CompletionStrategy + Send + Sync + 'static) -> Self {
		self.strategy = Box::new(strategy);
		self
	}
}

impl CompletionSource for EmoteSource {
	fn update(&mut self, query: &str) {
		let refs: Vec<&str> = self.names.iter().map(String::as_str).collect();
		self.matches = self.strategy.apply(query, &refs).into_iter().map(String::from).collect();
	}

	fn emit_listview(&self, model: &mut Vec<CompletionItem>, cap: usize) {
		take_into(model, self.matches.iter().map(|name| CompletionItem { display: name.clone(), search: name.clone(), insert: name.clone() }), cap);
	}

	fn emit_stringlist(&self, list: &mut Vec<String>, cap: usize, _is_first_word: bool) {
		take_into(list, self.matches.iter().cloned(), cap);
	}
}

/// Completes against the live chatter set of a channel. The tab-insertion form prepends `@` and,
/// when not completing the first word of the input, appends `, ` so the mention reads naturally
/// mid-sentence.
pub struct UserSource<'a> {
	names: Vec<&'a str>,
	strategy: ClassicUserStrategy,
	matches: Vec<String>
}

impl<'a> UserSource<'a> {
	pub fn new(names: Vec<&'a str>) -> Self {
		Self { names, strategy: ClassicUserStrategy, matches: Vec::new() }
	}
}

impl CompletionSource for UserSource<'_> {
	fn update(&mut self, query: &str) {
		self.matches = self.strategy.apply(query, &self.names).into_iter().map(String::from).collect();
	}

	fn emit_listview(&self, model: &mut Vec<CompletionItem>, cap: usize) {
		take_into(model, self.matches.iter().map(|name| CompletionItem { display: name.clone(), search: name.clone(), insert: format!("@{name}") }), cap);
	}

	fn emit_stringlist(&self, list: &mut Vec<String>, cap: usize, is_first_word: bool) {
		take_into(
			list,
			self.matches.iter().map(|name| if is_first_word { format!("@{name}") } else { format!("@{name}, ") }),
			cap
		);
	}
}

/// Completes against a fixed pool of slash commands. The tab-insertion form preserves whichever
/// sigil (`/` or `.`) the query itself used.
pub struct CommandSource {
	names: Vec<String>,
	strategy: CommandStrategy,
	matches: Vec<String>,
	sigil: char
}

impl CommandSource {
	pub fn new(names: impl IntoIterator<Item = impl Into<String>>, starts_with_only: bool) -> Self {
		Self { names: names.into_iter().map(Into::into).collect(), strategy: CommandStrategy::new(starts_with_only), matches: Vec::new(), sigil: '/' }
	}
}

impl CompletionSource for CommandSource {
	fn update(&mut self, query: &str) {
		self.sigil = if query.starts_with('.') { '.' } else { '/' };
		let refs: Vec<&str> = self.names.iter().map(String::as_str).collect();
		self.matches = self.strategy.apply(query, &refs).into_iter().map(String::from).collect();
	}

	fn emit_listview(&self, model: &mut Vec<CompletionItem>, cap: usize) {
		take_into(
			model,
			self.matches.iter().map(|name| CompletionItem { display: name.clone(), search: name.clone(), insert: format!("{}{name}", self.sigil) }),
			cap
		);
	}

	fn emit_stringlist(&self, list: &mut Vec<String>, cap: usize, _is_first_word: bool) {
		take_into(list, self.matches.iter().map(|name| format!("{}{name}", self.sigil)), cap);
	}
}

/// Composes an emote source and a user source, interleaving their results. Used when the query
/// prefix is ambiguous (neither `@`, `:`, nor `/`) and inline user completion is permitted.
#[derive(Default)]
pub struct UnifiedSource<'a> {
	pub emotes: Option<EmoteSource>,
	pub users: Option<UserSource<'a>>
}

impl<'a> UnifiedSource<'a> {
	pub fn new(emotes: EmoteSource, users: UserSource<'a>) -> Self {
		Self { emotes: Some(emotes), users: Some(users) }
	}
}

/// Interleaves two already-capped result lists, alternating starting with `a`.
fn interleave<T>(out: &mut Vec<T>, a: Vec<T>, b: Vec<T>, cap: usize) {
	let mut a = a.into_iter();
	let mut b = b.into_iter();
	loop {
		if out.len() >= cap {
			break;
		}
		match (a.next(), b.next()) {
			(None, None) => break,
			(Some(x), None) => out.push(x),
			(None, Some(y)) => out.push(y),
			(Some(x), Some(y)) => {
				out.push(x);
				if out.len() < cap {
					out.push(y);
				}
			}
		}
	}
}

impl CompletionSource for UnifiedSource<'_> {
	fn update(&mut self, query: &str) {
		if let Some(emotes) = self.emotes.as_mut() {
			emotes.update(query);
		}
		if let Some(users) = self.users.as_mut() {
			users.update(query);
		}
	}

	fn emit_listview(&self, model: &mut Vec<CompletionItem>, cap: usize) {
		let mut emote_items = Vec::new();
		let mut user_items = Vec::new();
		if let Some(emotes) = &self.emotes {
			emotes.emit_listview(&mut emote_items, cap);
		}
		if let Some(users) = &self.users {
			users.emit_listview(&mut user_items, cap);
		}
		interleave(model, emote_items, user_items, cap);
	}

	fn emit_stringlist(&self, list: &mut Vec<String>, cap: usize, is_first_word: bool) {
		let mut emote_items = Vec::new();
		let mut user_items = Vec::new();
		if let Some(emotes) = &self.emotes {
			emotes.emit_stringlist(&mut emote_items, cap, is_first_word);
		}
		if let Some(users) = &self.users {
			users.emit_stringlist(&mut user_items, cap, is_first_word);
		}
		interleave(list, emote_items, user_items, cap);
	}
}

/// The kind of candidates a query is asking for, deduced from its leading sigil (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
	Emote,
	User,
	Command
}

impl SourceKind {
	/// Deduces the relevant source kind from a raw query string (including its sigil, if any).
	/// Queries shorter than two characters deduce no completion at all, matching the "don't
	/// trigger on a bare sigil" behavior of automatic completion.
	pub fn deduce(query: &str) -> Option<Self> {
		if query.chars().count() < 2 {
			return None;
		}
		Some(if query.starts_with('@') {
			Self::User
		} else if query.starts_with(':') {
			Self::Emote
		} else if query.starts_with('/') || query.starts_with('.') {
			Self::Command
		} else {
			Self::Emote
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn source_kind_deduces_from_sigil() {
		assert_eq!(SourceKind::deduce("@paj"), Some(SourceKind::User));
		assert_eq!(SourceKind::deduce("/ban"), Some(SourceKind::Command));
		assert_eq!(SourceKind::deduce(".timeout"), Some(SourceKind::Command));
		assert_eq!(SourceKind::deduce(":Kapp"), Some(SourceKind::Emote));
		assert_eq!(SourceKind::deduce("Kappa"), Some(SourceKind::Emote));
	}

	#[test]
	fn source_kind_deduces_none_below_two_chars() {
		assert_eq!(SourceKind::deduce(""), None);
		assert_eq!(SourceKind::deduce("@"), None);
	}

	#[test]
	fn emote_source_completes() {
		let mut source = EmoteSource::new(["Kappa", "PogChamp"]);
		source.update("Pog");
		let mut list = Vec::new();
		source.emit_stringlist(&mut list, 10, true);
		assert_eq!(list, vec!["PogChamp".to_string()]);
	}

	#[test]
	fn command_source_completes_and_preserves_sigil() {
		let mut source = CommandSource::new(["ban", "unban"], true);
		source.update(".ban");
		let mut list = Vec::new();
		source.emit_stringlist(&mut list, 10, true);
		assert_eq!(list, vec![".ban".to_string()]);
	}

	#[test]
	fn user_source_completes_and_appends_separator_mid_sentence() {
		let mut source = UserSource::new(vec!["pajlada", "forsen"]);
		source.update("@paj");

		let mut first_word = Vec::new();
		source.emit_stringlist(&mut first_word, 10, true);
		assert_eq!(first_word, vec!["@pajlada".to_string()]);

		let mut mid_sentence = Vec::new();
		source.emit_stringlist(&mut mid_sentence, 10, false);
		assert_eq!(mid_sentence, vec!["@pajlada, ".to_string()]);
	}

	#[test]
	fn unified_source_interleaves_emotes_and_users() {
		let mut source = UnifiedSource::new(EmoteSource::new(["paja", "pajb"]), UserSource::new(vec!["pajlada", "pajbot"]));
		source.update("paj");
		let mut list = Vec::new();
		source.emit_stringlist(&mut list, 10, true);
		assert_eq!(list, vec!["paja".to_string(), "@pajlada".to_string(), "pajb".to_string(), "@pajbot".to_string()]);
	}

	#[test]
	fn unified_source_caps_total_output() {
		let mut source = UnifiedSource::new(EmoteSource::new(["paja", "pajb", "pajc"]), UserSource::new(vec!["pajlada", "pajbot"]));
		source.update("paj");
		let mut list = Vec::new();
		source.emit_stringlist(&mut list, 3, true);
		assert_eq!(list.len(), 3);
	}
}
