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

//! Case-insensitive, ordered, prefix-indexed chatter set (§4.6), grounded directly on
//! Chatterino's `src/common/UsernameSet.hpp`/`.cpp`.
//!
//! Membership is ordered case-insensitively via a `BTreeSet` over a wrapper that compares and
//! hashes lowercased, while the displayed value keeps whatever case last inserted it. A second
//! index, keyed on the first two (lowercased) UTF-16 code units of each name, lets completion
//! narrow a `BTreeSet` range scan to just the matching prefix instead of a linear scan.

use std::collections::{BTreeSet, HashMap};

/// The first two (lowercased) UTF-16 code units of a chatter name, used to bucket the ordered
/// set for fast prefix lookups. Names shorter than two units pad with `'\0'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix(u16, u16);

impl Prefix {
	pub fn of(name: &str) -> Self {
		let lowered = name.to_lowercase();
		let mut units = lowered.encode_utf16().take(2);
		let first = units.next().unwrap_or(0);
		let second = units.next().unwrap_or(0);
		Self(first, second)
	}

	fn is_start_of(&self, name: &str) -> bool {
		*self == Self::of(name)
	}
}

/// A name ordered and compared case-insensitively, while remembering its originally-inserted
/// case for display.
#[derive(Debug, Clone)]
struct CaseInsensitiveName(String);

impl CaseInsensitiveName {
	fn key(&self) -> String {
		self.0.to_lowercase()
	}
}

impl PartialEq for CaseInsensitiveName {
	fn eq(&self, other: &Self) -> bool {
		self.key() == other.key()
	}
}
impl Eq for CaseInsensitiveName {}

impl PartialOrd for CaseInsensitiveName {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for CaseInsensitiveName {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.key().cmp(&other.key())
	}
}

/// A case-insensitive, ordered set of chatter names with O(1)-amortized prefix range queries.
#[derive(Debug, Clone, Default)]
pub struct ChatterIndex {
	names: BTreeSet<CaseInsensitiveName>,
	first_key_for_prefix: HashMap<Prefix, String>
}

impl ChatterIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	/// Inserts `name`. If an entry already exists that differs only in case, the
	/// lexicographically smaller casing becomes (or remains) canonical — e.g. inserting
	/// "Pajlada" then "pajlada" keeps "Pajlada", since `'P' < 'p'`.
	pub fn insert(&mut self, name: &str) {
		let wrapped = CaseInsensitiveName(name.to_string());
		let should_replace = match self.names.get(&wrapped) {
			Some(existing) => name < existing.0.as_str(),
			None => true
		};
		if should_replace {
			self.names.remove(&wrapped);
			self.names.insert(wrapped);
		}
		self.insert_prefix(name);
	}

	fn insert_prefix(&mut self, name: &str) {
		let prefix = Prefix::of(name);
		match self.first_key_for_prefix.get(&prefix) {
			Some(existing) if existing.to_lowercase() <= name.to_lowercase() => {}
			_ => {
				self.first_key_for_prefix.insert(prefix, name.to_string());
			}
		}
	}

	pub fn remove(&mut self, name: &str) -> bool {
		self.names.remove(&CaseInsensitiveName(name.to_string()))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.names.contains(&CaseInsensitiveName(name.to_string()))
	}

	/// Returns every stored name (in its last-inserted casing) whose lowercased form starts with
	/// `prefix`'s lowercased form, in case-insensitive ascending order.
	pub fn prefix_range(&self, prefix: &str) -> Vec<String> {
		if prefix.is_empty() {
			return self.names.iter().map(|n| n.0.clone()).collect();
		}
		let query_prefix = Prefix::of(prefix);
		let Some(start) = self.first_key_for_prefix.get(&query_prefix) else {
			return vec![];
		};
		let lowered = prefix.to_lowercase();
		self.names
			.range(CaseInsensitiveName(start.clone())..)
			.take_while(|n| query_prefix.is_start_of(&n.0) || n.key().starts_with(&lowered))
			.map(|n| n.0.clone())
			.filter(|n| n.to_lowercase().starts_with(&lowered))
			.collect()
	}

	/// Retains only names present in both `self` and `other`, adopting `other`'s prefix index
	/// for whatever survives. Used when narrowing a channel-wide set down to e.g. moderators.
	pub fn merge_intersection(&mut self, other: &ChatterIndex) {
		self.names.retain(|n| other.names.contains(n));
		self.first_key_for_prefix = other.first_key_for_prefix.clone();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insert_is_case_insensitive() {
		let mut index = ChatterIndex::new();
		index.insert("Pajlada");
		index.insert("pajlada");
		assert_eq!(index.len(), 1);
		assert!(index.contains("PAJLADA"));
	}

	#[test]
	fn prefix_range_matches_case_insensitively() {
		let mut index = ChatterIndex::new();
		for name in ["pajlada", "PajBot", "forsen", "Forsenlol"] {
			index.insert(name);
		}
		let mut matches = index.prefix_range("paj");
		matches.sort();
		assert_eq!(matches, vec!["PajBot".to_string(), "pajlada".to_string()]);
	}

	#[test]
	fn prefix_range_empty_prefix_returns_everything() {
		let mut index = ChatterIndex::new();
		index.insert("a");
		index.insert("b");
		assert_eq!(index.prefix_range("").len(), 2);
	}

	#[test]
	fn remove_drops_membership() {
		let mut index = ChatterIndex::new();
		index.insert("forsen");
		assert!(index.remove("FORSEN"));
		assert!(!index.contains("forsen"));
	}
}
