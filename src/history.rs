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

//! Bounded per-channel message history (§4.1), grounded on Chatterino's
//! `src/messages/LimitedQueue.hpp` chunked deque, plus the [`Channel`] writer/reader surface
//! (§6.1, §6.2) that wraps a [`History`] and a [`crate::ChatterIndex`].
//!
//! Unlike the original, every chunk mutation in this implementation is copy-on-write: a chunk is
//! genuinely shared-immutable for the lifetime it's reachable from any [`Snapshot`], so readers
//! never observe a write landing in a slot they've already bounded their iteration to. This
//! trades the original's in-place tail mutation for a small per-append copy (bounded by
//! `CHUNK_SIZE`), which is the safe translation of "shared-immutable once published" into Rust's
//! ownership model.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::{
	chatters::ChatterIndex,
	flags::MessageFlag,
	message::Message
};

const CHUNK_SIZE: usize = 100;

type ChunkData = Arc<Vec<Option<Arc<Message>>>>;

fn empty_chunk() -> ChunkData {
	Arc::new(vec![None; CHUNK_SIZE])
}

struct HistoryState {
	chunks: Arc<Vec<ChunkData>>,
	front_offset: usize,
	back_end: usize,
	size: usize
}

impl HistoryState {
	fn new() -> Self {
		Self {
			chunks: Arc::new(vec![empty_chunk()]),
			front_offset: 0,
			back_end: 0,
			size: 0
		}
	}

	/// Maps a logical index into `(chunk_index, slot_index)`, honoring `front_offset`.
	fn locate(&self, index: usize) -> Option<(usize, usize)> {
		if index >= self.size {
			return None;
		}
		let absolute = index + self.front_offset;
		Some((absolute / CHUNK_SIZE, absolute % CHUNK_SIZE))
	}
}

/// A bounded, ordered, append-oriented sequence of messages with capacity `C`.
///
/// See §4.1 for the full operation table and edge cases.
pub struct History {
	capacity: usize,
	state: Mutex<HistoryState>
}

impl History {
	/// The spec's stated default capacity.
	pub const DEFAULT_CAPACITY: usize = 1000;

	pub fn new(capacity: usize) -> Self {
		Self { capacity: capacity.max(1), state: Mutex::new(HistoryState::new()) }
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.state.lock().unwrap().size
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Appends `msg` at the logical tail. Returns the evicted message if the history was already
	/// at capacity.
	pub fn append(&self, msg: Arc<Message>) -> Option<Arc<Message>> {
		let mut state = self.state.lock().unwrap();

		let mut chunks: Vec<ChunkData> = (*state.chunks).clone();
		if state.back_end >= CHUNK_SIZE {
			chunks.push(empty_chunk());
			state.back_end = 0;
		}
		let last_idx = chunks.len() - 1;
		let mut new_last = (*chunks[last_idx]).clone();
		new_last[state.back_end] = Some(msg);
		chunks[last_idx] = Arc::new(new_last);
		state.back_end += 1;
		state.size += 1;

		let evicted = if state.size > self.capacity {
			let evicted = chunks[0][state.front_offset].clone();
			state.front_offset += 1;
			state.size -= 1;
			if chunks.len() > 1 && state.front_offset >= chunks[0].len() {
				chunks.remove(0);
				state.front_offset = 0;
			}
			evicted
		} else {
			None
		};

		state.chunks = Arc::new(chunks);
		evicted
	}

	/// Admits as many of `msgs` (taken as a *suffix* of the input when only partial space is
	/// available) at the logical head as remaining capacity allows. Returns the admitted items
	/// in forward order.
	///
	/// The admitted items plus whatever was still valid in the old first chunk are re-chunked
	/// from scratch rather than grown in place, since the combined length can exceed
	/// `CHUNK_SIZE`. Every chunk but the very first (which carries `front_offset`) and, only
	/// when it's also the last chunk in the whole history, the very last (which carries
	/// `back_end`) must stay exactly `CHUNK_SIZE` long — `locate`/`Snapshot::get` divide by
	/// `CHUNK_SIZE` to find a chunk and would silently read the wrong slot otherwise.
	pub fn prepend_batch(&self, msgs: &[Arc<Message>]) -> Vec<Arc<Message>> {
		if msgs.is_empty() {
			return vec![];
		}

		let mut state = self.state.lock().unwrap();
		let space = self.capacity - state.size;
		let admitted_n = space.min(msgs.len());
		if admitted_n == 0 {
			return vec![];
		}
		let admitted = &msgs[msgs.len() - admitted_n..];

		let mut chunks: Vec<ChunkData> = (*state.chunks).clone();
		let single_chunk = chunks.len() == 1;
		let old_first = chunks[0].clone();
		let valid_end = if single_chunk { state.back_end } else { old_first.len() };
		let valid_old = &old_first[state.front_offset..valid_end];

		let mut combined: Vec<Option<Arc<Message>>> = Vec::with_capacity(admitted_n + valid_old.len());
		combined.extend(admitted.iter().cloned().map(Some));
		combined.extend_from_slice(valid_old);
		let combined_len = combined.len();

		// When older chunks still follow behind this one, the rebuilt front must end flush on a
		// chunk boundary (they're already full and contiguous); when it doesn't, this rebuild
		// covers the entire history and the last produced chunk is allowed to end partway
		// through, same as any other tail chunk.
		let pad_front = if single_chunk { 0 } else { (CHUNK_SIZE - combined_len % CHUNK_SIZE) % CHUNK_SIZE };
		let mut padded = vec![None; pad_front];
		padded.append(&mut combined);

		let mut rebuilt: Vec<ChunkData> = padded
			.chunks(CHUNK_SIZE)
			.map(|slice| {
				let mut chunk = slice.to_vec();
				chunk.resize(CHUNK_SIZE, None);
				Arc::new(chunk)
			})
			.collect();
		if rebuilt.is_empty() {
			rebuilt.push(empty_chunk());
		}

		chunks.splice(0..1, rebuilt);
		state.front_offset = pad_front;
		if single_chunk {
			state.back_end = if combined_len > 0 && combined_len % CHUNK_SIZE == 0 { CHUNK_SIZE } else { combined_len % CHUNK_SIZE };
		}
		state.chunks = Arc::new(chunks);
		state.size += admitted_n;

		admitted.to_vec()
	}

	/// Replaces the message at logical index `i`. Returns `false` if `i` is out of range.
	pub fn replace_at(&self, i: usize, new: Arc<Message>) -> bool {
		let mut state = self.state.lock().unwrap();
		let Some((chunk_idx, slot_idx)) = state.locate(i) else {
			return false;
		};
		let mut chunks: Vec<ChunkData> = (*state.chunks).clone();
		let mut new_chunk = (*chunks[chunk_idx]).clone();
		new_chunk[slot_idx] = Some(new);
		chunks[chunk_idx] = Arc::new(new_chunk);
		state.chunks = Arc::new(chunks);
		true
	}

	/// Scans head to tail for the first message identical (by `Arc` identity) to `old` and
	/// replaces it. Returns the index of the replacement, if any.
	pub fn replace_where(&self, old: &Arc<Message>, new: Arc<Message>) -> Option<usize> {
		let snapshot = self.snapshot();
		for i in 0..snapshot.len() {
			if let Some(existing) = snapshot.get(i) {
				if Arc::ptr_eq(&existing, old) {
					self.replace_at(i, new);
					return Some(i);
				}
			}
		}
		None
	}

	/// Scans head to tail for the first message whose id matches `id` and replaces it. An empty
	/// `id` never matches anything.
	pub fn replace_by_id(&self, id: &str, new: Arc<Message>) -> Option<usize> {
		if id.is_empty() {
			return None;
		}
		let snapshot = self.snapshot();
		for i in 0..snapshot.len() {
			if let Some(existing) = snapshot.get(i) {
				if existing.id == id {
					self.replace_at(i, new);
					return Some(i);
				}
			}
		}
		None
	}

	/// Marks every enabled message as [`MessageFlag::Disabled`] by replacement. Remains a no-op
	/// if every message is already disabled.
	pub fn disable_all(&self) {
		let snapshot = self.snapshot();
		for i in 0..snapshot.len() {
			let Some(existing) = snapshot.get(i) else { continue };
			if existing.flags.has(MessageFlag::Disabled) {
				continue;
			}
			let mut disabled = (*existing).clone();
			disabled.flags.set(MessageFlag::Disabled);
			self.replace_at(i, Arc::new(disabled));
		}
	}

	/// Finds a message by its provider-assigned id. An empty `id` never matches.
	pub fn find_by_id(&self, id: &str) -> Option<Arc<Message>> {
		if id.is_empty() {
			return None;
		}
		let snapshot = self.snapshot();
		for i in 0..snapshot.len() {
			if let Some(msg) = snapshot.get(i) {
				if msg.id == id {
					return Some(msg);
				}
			}
		}
		None
	}

	/// Captures a point-in-time, read-only view of this history. O(1): shares chunk storage with
	/// the live history via reference counting.
	pub fn snapshot(&self) -> Snapshot {
		let state = self.state.lock().unwrap();
		Snapshot {
			chunks: Arc::clone(&state.chunks),
			front_offset: state.front_offset,
			size: state.size
		}
	}

	pub fn clear(&self) {
		let mut state = self.state.lock().unwrap();
		*state = HistoryState::new();
		debug!("history cleared");
	}
}

/// An immutable, point-in-time view of a [`History`]. Cheaply copyable: shares chunk storage
/// with the history it was taken from.
#[derive(Clone)]
pub struct Snapshot {
	chunks: Arc<Vec<ChunkData>>,
	front_offset: usize,
	size: usize
}

impl Snapshot {
	pub fn len(&self) -> usize {
		self.size
	}

	pub fn is_empty(&self) -> bool {
		self.size == 0
	}

	pub fn get(&self, index: usize) -> Option<Arc<Message>> {
		if index >= self.size {
			return None;
		}
		let absolute = index + self.front_offset;
		let chunk_idx = absolute / CHUNK_SIZE;
		let slot_idx = absolute % CHUNK_SIZE;
		self.chunks.get(chunk_idx)?.get(slot_idx)?.clone()
	}

	pub fn iter(&self) -> impl Iterator<Item = Arc<Message>> + '_ {
		(0..self.len()).filter_map(move |i| self.get(i))
	}
}

/// The number of items a [`History::prepend_batch`] call actually admitted.
pub type AdmittedCount = usize;

/// Signals emitted by a [`Channel`] for readers (views, search, logging) to observe mutations
/// without re-entering the writer path. See §6.2 and the no-reentrancy rule in §5.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
	Append { message: Arc<Message>, overriding_flags: Option<crate::flags::MessageFlags> },
	Replace { index: usize, old: Arc<Message>, new: Arc<Message> },
	Prepend { batch: Vec<Arc<Message>> },
	Clear
}

/// A named chat channel: a [`History`] plus a [`ChatterIndex`], exposing the writer API (§6.1)
/// consumed by the ingestion layer and the reader API (§6.2) consumed by views.
pub struct Channel {
	pub name: String,
	history: History,
	chatters: Mutex<ChatterIndex>,
	events: tokio::sync::broadcast::Sender<ChannelEvent>,
	stack_timeouts: bool
}

impl Channel {
	pub fn new(name: impl Into<String>, capacity: usize) -> Self {
		let (events, _) = tokio::sync::broadcast::channel(256);
		Self {
			name: name.into(),
			history: History::new(capacity),
			chatters: Mutex::new(ChatterIndex::new()),
			events,
			stack_timeouts: true
		}
	}

	pub fn history(&self) -> &History {
		&self.history
	}

	pub fn chatters(&self) -> std::sync::MutexGuard<'_, ChatterIndex> {
		self.chatters.lock().unwrap()
	}

	/// Subscribes to this channel's mutation signals.
	pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ChannelEvent> {
		self.events.subscribe()
	}

	pub fn append(&self, message: Arc<Message>) -> Option<Arc<Message>> {
		if !message.display_name.is_empty() {
			self.chatters.lock().unwrap().insert(&message.display_name);
		}
		let evicted = self.history.append(Arc::clone(&message));
		let _ = self.events.send(ChannelEvent::Append { message, overriding_flags: None });
		evicted
	}

	pub fn prepend_batch(&self, messages: &[Arc<Message>]) -> AdmittedCount {
		let admitted = self.history.prepend_batch(messages);
		let count = admitted.len();
		if count > 0 {
			let _ = self.events.send(ChannelEvent::Prepend { batch: admitted });
		}
		count
	}

	/// Replaces the latest matching timeout message for `target_user`, or appends a new one.
	/// When `stack_timeouts` is enabled (the default), consecutive timeouts for the same user
	/// collapse into a single message instead of accumulating one line per timeout.
	pub fn apply_timeout(&self, target_user: &str, duration_s: u64, reason: Option<&str>) {
		let snapshot = self.history.snapshot();
		if self.stack_timeouts {
			for i in (0..snapshot.len()).rev() {
				let Some(existing) = snapshot.get(i) else { continue };
				if existing.flags.has(MessageFlag::Timeout) && existing.login_name == target_user {
					let replacement = Arc::new(
						crate::message::MessageBuilder::new()
							.login_name(target_user)
							.display_name(target_user)
							.flag(MessageFlag::Timeout)
							.text(timeout_text(target_user, duration_s, reason))
							.build()
					);
					self.history.replace_at(i, Arc::clone(&replacement));
					let _ = self.events.send(ChannelEvent::Replace { index: i, old: existing, new: replacement });
					return;
				}
			}
		}
		let message = crate::message::MessageBuilder::new()
			.login_name(target_user)
			.display_name(target_user)
			.flag(MessageFlag::Timeout)
			.text(timeout_text(target_user, duration_s, reason))
			.build();
		self.append(Arc::new(message));
	}

	pub fn apply_clear_chat(&self, now: chrono::DateTime<chrono::Utc>) {
		let message = crate::message::MessageBuilder::new()
			.received_at(now)
			.flag(MessageFlag::ClearChat)
			.flag(MessageFlag::System)
			.text("Chat has been cleared by a moderator.")
			.build();
		self.append(Arc::new(message));
	}

	pub fn disable_messages_by_user(&self, user: &str) {
		let snapshot = self.history.snapshot();
		for i in 0..snapshot.len() {
			let Some(existing) = snapshot.get(i) else { continue };
			if existing.login_name != user || existing.flags.has(MessageFlag::Disabled) {
				continue;
			}
			let mut disabled = (*existing).clone();
			disabled.flags.set(MessageFlag::Disabled);
			self.history.replace_at(i, Arc::new(disabled));
		}
	}

	pub fn replace_by_id(&self, id: &str, new: Arc<Message>) -> bool {
		let old = self.history.find_by_id(id);
		match (old, self.history.replace_by_id(id, Arc::clone(&new))) {
			(Some(old), Some(index)) => {
				let _ = self.events.send(ChannelEvent::Replace { index, old, new });
				true
			}
			_ => false
		}
	}

	pub fn snapshot(&self) -> Snapshot {
		self.history.snapshot()
	}

	pub fn find_by_id(&self, id: &str) -> Option<Arc<Message>> {
		self.history.find_by_id(id)
	}
}

fn timeout_text(target_user: &str, duration_s: u64, reason: Option<&str>) -> String {
	match reason {
		Some(reason) if !reason.is_empty() => format!("{target_user} has been timed out for {duration_s}s ({reason})"),
		_ => format!("{target_user} has been timed out for {duration_s}s")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn msg(id: &str, text: &str) -> Arc<Message> {
		Arc::new(crate::message::MessageBuilder::new().id(id).text(text).build())
	}

	#[test]
	fn ring_buffer_eviction() {
		let h = History::new(3);
		assert_eq!(h.append(msg("1", "1")), None);
		assert_eq!(h.append(msg("2", "2")), None);
		assert_eq!(h.append(msg("3", "3")), None);
		let evicted = h.append(msg("4", "4"));
		assert_eq!(evicted.unwrap().id, "1");

		let snap = h.snapshot();
		assert_eq!(snap.len(), 3);
		assert_eq!(snap.get(0).unwrap().id, "2");
		assert_eq!(snap.get(1).unwrap().id, "3");
		assert_eq!(snap.get(2).unwrap().id, "4");
	}

	#[test]
	fn front_fill_partial_admit() {
		let h = History::new(5);
		h.append(msg("1", "1"));
		h.append(msg("2", "2"));
		let admitted = h.prepend_batch(&[msg("-2", "-2"), msg("-1", "-1"), msg("0", "0")]);
		assert_eq!(admitted.iter().map(|m| m.id.clone()).collect::<Vec<_>>(), vec!["-2", "-1", "0"]);

		let snap = h.snapshot();
		assert_eq!(snap.len(), 5);
		let ids: Vec<_> = snap.iter().map(|m| m.id.clone()).collect();
		assert_eq!(ids, vec!["-2", "-1", "0", "1", "2"]);
	}

	#[test]
	fn front_fill_past_a_full_chunk_keeps_chunk_boundaries_correct() {
		// Crosses a CHUNK_SIZE (100) boundary on both the write side (single full chunk,
		// back-filled until the rebuilt front spans two chunks) and the read side (more chunks
		// already exist behind the one being rebuilt), the two cases `prepend_batch` must keep
		// distinct.
		let h = History::new(1000);
		for i in 0..100 {
			h.append(msg(&i.to_string(), &i.to_string()));
		}
		let admitted = h.prepend_batch(&[msg("-1", "-1")]);
		assert_eq!(admitted.len(), 1);

		let snap = h.snapshot();
		assert_eq!(snap.len(), 101);
		assert_eq!(snap.get(0).unwrap().id, "-1");
		assert_eq!(snap.get(1).unwrap().id, "0");
		assert_eq!(snap.get(100).unwrap().id, "99");
	}

	#[test]
	fn front_fill_spanning_multiple_existing_chunks() {
		let h = History::new(300);
		for i in 0..150 {
			h.append(msg(&i.to_string(), &i.to_string()));
		}
		let batch: Vec<_> = (0..60).map(|i| msg(&format!("-{}", 60 - i), &i.to_string())).collect();
		let admitted = h.prepend_batch(&batch);
		assert_eq!(admitted.len(), 60);

		let snap = h.snapshot();
		assert_eq!(snap.len(), 210);
		assert_eq!(snap.get(0).unwrap().id, "-60");
		assert_eq!(snap.get(59).unwrap().id, "-1");
		assert_eq!(snap.get(60).unwrap().id, "0");
		assert_eq!(snap.get(159).unwrap().id, "99");
		assert_eq!(snap.get(160).unwrap().id, "100");
		assert_eq!(snap.get(209).unwrap().id, "149");
	}

	#[test]
	fn front_fill_rejected_when_full() {
		let h = History::new(2);
		h.append(msg("1", "1"));
		h.append(msg("2", "2"));
		let admitted = h.prepend_batch(&[msg("-1", "-1"), msg("0", "0")]);
		assert!(admitted.is_empty());
		let snap = h.snapshot();
		let ids: Vec<_> = snap.iter().map(|m| m.id.clone()).collect();
		assert_eq!(ids, vec!["1", "2"]);
	}

	#[test]
	fn replace_by_id_finds_and_replaces() {
		let h = History::new(10);
		h.append(msg("a", "a"));
		h.append(msg("b", "b"));
		h.append(msg("c", "c"));
		let replacement = msg("b", "b-edited");
		let index = h.replace_by_id("b", replacement);
		assert_eq!(index, Some(1));
		assert_eq!(h.snapshot().get(1).unwrap().plain_text(), "b-edited");
	}

	#[test]
	fn replace_by_id_empty_id_is_none() {
		let h = History::new(10);
		h.append(msg("a", "a"));
		assert_eq!(h.replace_by_id("", msg("x", "x")), None);
	}

	#[test]
	fn snapshot_is_unaffected_by_later_writes() {
		let h = History::new(3);
		h.append(msg("1", "1"));
		let snap = h.snapshot();
		h.append(msg("2", "2"));
		h.append(msg("3", "3"));
		h.append(msg("4", "4"));
		assert_eq!(snap.len(), 1);
		assert_eq!(snap.get(0).unwrap().id, "1");
	}

	#[test]
	fn prepend_batch_on_full_history_admits_nothing() {
		let h = History::new(2);
		h.append(msg("1", "1"));
		h.append(msg("2", "2"));
		assert!(h.prepend_batch(&[msg("x", "x")]).is_empty());
	}

	#[test]
	fn disable_all_is_noop_when_nothing_enabled() {
		let channel = Channel::new("forsen", 10);
		let mut m = crate::message::MessageBuilder::new().id("1").text("hi").build();
		m.flags.set(MessageFlag::Disabled);
		channel.append(Arc::new(m));
		channel.history.disable_all();
		assert!(channel.snapshot().get(0).unwrap().flags.has(MessageFlag::Disabled));
	}

	#[test]
	fn find_by_id_round_trips() {
		let channel = Channel::new("forsen", 10);
		let message = Arc::new(crate::message::MessageBuilder::new().id("abc").text("hi").build());
		channel.append(Arc::clone(&message));
		assert_eq!(channel.find_by_id("abc").unwrap().id, "abc");
	}

	#[test]
	fn apply_timeout_stacks_consecutive_timeouts() {
		let channel = Channel::new("forsen", 10);
		channel.apply_timeout("baduser", 60, None);
		channel.apply_timeout("baduser", 600, Some("spam"));
		let snap = channel.snapshot();
		assert_eq!(snap.len(), 1);
		assert!(snap.get(0).unwrap().plain_text().contains("600s"));
	}

	#[test]
	fn apply_timeout_broadcasts_the_stacked_message_as_new() {
		let channel = Channel::new("forsen", 10);
		let mut events = channel.subscribe();
		channel.apply_timeout("baduser", 60, None);
		let _ = events.try_recv().unwrap();

		channel.apply_timeout("baduser", 600, Some("spam"));
		let ChannelEvent::Replace { old, new, .. } = events.try_recv().unwrap() else { panic!("expected a Replace event") };
		assert!(old.plain_text().contains("60s"));
		assert!(new.plain_text().contains("600s"));
	}

	#[test]
	fn replace_by_id_broadcasts_the_true_old_and_new_messages() {
		let channel = Channel::new("forsen", 10);
		let mut events = channel.subscribe();
		channel.append(msg("a", "before"));
		let _ = events.try_recv().unwrap();

		channel.replace_by_id("a", msg("a", "after"));
		let ChannelEvent::Replace { old, new, .. } = events.try_recv().unwrap() else { panic!("expected a Replace event") };
		assert_eq!(old.plain_text(), "before");
		assert_eq!(new.plain_text(), "after");
	}
}
