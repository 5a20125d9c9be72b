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

//! Matching strategies (§4.7), grounded on Chatterino's
//! `src/providers/autocomplete/Autocomplete{Emote,User,Command}Strategies.cpp`.

use super::CompletionStrategy;

/// Filters emote names by case-insensitive substring match, then promotes an exact match (with
/// or without a leading `:`) to the front of the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicEmoteStrategy;

impl CompletionStrategy for ClassicEmoteStrategy {
	fn apply<'a>(&self, query: &str, candidates: &[&'a str]) -> Vec<&'a str> {
		let query = query.strip_prefix(':').unwrap_or(query);
		let lowered = query.to_lowercase();
		let mut matches: Vec<&str> = candidates.iter().copied().filter(|name| name.to_lowercase().contains(&lowered)).collect();

		if let Some(exact_idx) = matches.iter().position(|name| {
			let name_lower = name.to_lowercase();
			name_lower == lowered || name_lower == format!(":{lowered}")
		}) {
			let exact = matches.remove(exact_idx);
			matches.insert(0, exact);
		}

		matches
	}
}

/// Like [`ClassicEmoteStrategy`] but requires the match to be a prefix, not any substring, and
/// emits the (non-exact) matches in case-insensitive sorted order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixOnlyEmoteStrategy;

impl CompletionStrategy for PrefixOnlyEmoteStrategy {
	fn apply<'a>(&self, query: &str, candidates: &[&'a str]) -> Vec<&'a str> {
		let query = query.strip_prefix(':').unwrap_or(query);
		let lowered = query.to_lowercase();
		let mut matches: Vec<&str> = candidates.iter().copied().filter(|name| name.to_lowercase().starts_with(&lowered)).collect();
		matches.sort_by_key(|name| name.to_lowercase());

		if let Some(exact_idx) = matches.iter().position(|name| name.to_lowercase() == lowered) {
			let exact = matches.remove(exact_idx);
			matches.insert(0, exact);
		}

		matches
	}
}

/// Filters chatter names by case-insensitive prefix match, stripping a leading `@` from the
/// query first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicUserStrategy;

impl CompletionStrategy for ClassicUserStrategy {
	fn apply<'a>(&self, query: &str, candidates: &[&'a str]) -> Vec<&'a str> {
		let query = query.strip_prefix('@').unwrap_or(query);
		let lowered = query.to_lowercase();
		candidates.iter().copied().filter(|name| name.to_lowercase().starts_with(&lowered)).collect()
	}
}

/// Filters command names, stripping a leading `/` or `.`. When `starts_with_only` is set, only
/// prefix matches qualify; otherwise any substring match does.
#[derive(Debug, Clone, Copy)]
pub struct CommandStrategy {
	pub starts_with_only: bool
}

impl CommandStrategy {
	pub fn new(starts_with_only: bool) -> Self {
		Self { starts_with_only }
	}
}

impl CompletionStrategy for CommandStrategy {
	fn apply<'a>(&self, query: &str, candidates: &[&'a str]) -> Vec<&'a str> {
		let query = query.strip_prefix('/').or_else(|| query.strip_prefix('.')).unwrap_or(query);
		let lowered = query.to_lowercase();
		candidates
			.iter()
			.copied()
			.filter(|name| {
				let name_lower = name.to_lowercase();
				if self.starts_with_only { name_lower.starts_with(&lowered) } else { name_lower.contains(&lowered) }
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classic_emote_promotes_exact_match() {
		let strategy = ClassicEmoteStrategy;
		let candidates = ["Kappa", "KappaPride", "KappaRoss"];
		let result = strategy.apply("Kappa", &candidates);
		assert_eq!(result[0], "Kappa");
		assert_eq!(result.len(), 3);
	}

	#[test]
	fn prefix_only_emote_excludes_mid_string_matches() {
		let strategy = PrefixOnlyEmoteStrategy;
		let candidates = ["Kappa", "NotKappa"];
		let result = strategy.apply("Kappa", &candidates);
		assert_eq!(result, vec!["Kappa"]);
	}

	#[test]
	fn prefix_only_emote_sorts_non_exact_matches_case_insensitively() {
		let strategy = PrefixOnlyEmoteStrategy;
		let candidates = ["kappaRoss", "KappaPride", "KappaHD"];
		let result = strategy.apply("Kappa", &candidates);
		assert_eq!(result, vec!["KappaHD", "KappaPride", "kappaRoss"]);
	}

	#[test]
	fn classic_user_strips_at_sign() {
		let strategy = ClassicUserStrategy;
		let candidates = ["pajlada", "forsen"];
		let result = strategy.apply("@paj", &candidates);
		assert_eq!(result, vec!["pajlada"]);
	}

	#[test]
	fn command_strategy_respects_starts_with_only() {
		let candidates = ["ban", "unban", "timeout"];
		assert_eq!(CommandStrategy::new(true).apply("/ban", &candidates), vec!["ban"]);
		assert_eq!(CommandStrategy::new(false).apply("/ban", &candidates), vec!["ban", "unban"]);
	}
}
