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

//! Process-wide, content-addressed image/emote cache (§4.2).
//!
//! `ImageCache` is sharded by URL (grounded on the per-resource-kind sharded maps in
//! `examples/other_examples/70ca435c_vilgotf-twilight__cache-in-memory-src-lib.rs.rs`) so
//! unrelated URLs never contend on the same lock. Each entry is single-flight: the first
//! `pixels()` call on a fresh handle transitions it to `Loading` and spawns exactly one fetch,
//! so concurrent callers never issue duplicate requests.

pub mod fetch;

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc, Mutex, Weak
	},
	time::Instant
};

pub use self::fetch::{Frame, FetchError};

const SHARD_COUNT: usize = 16;
/// The cache-wide animation tick interval (≈30Hz), matching the source's `GIF_FRAME_LENGTH`.
pub const GIF_FRAME_LENGTH_MS: u64 = 33;

fn shard_index(url: &str, shard_count: usize) -> usize {
	use std::hash::{Hash, Hasher};
	let mut hasher = std::collections::hash_map::DefaultHasher::new();
	url.hash(&mut hasher);
	(hasher.finish() as usize) % shard_count
}

enum State {
	NotStarted,
	Loading,
	Loaded { frames: Vec<Frame>, current: usize, accumulator_ms: f32, last_advance: Option<Instant> },
	Failed
}

struct ImageResourceInner {
	url: String,
	state: Mutex<State>
}

/// A process-wide, lazily-populated content-addressed store of decoded images.
pub struct ImageCache {
	shards: Vec<Mutex<HashMap<String, Arc<ImageResourceInner>>>>,
	client: reqwest::Client,
	generation: Arc<AtomicU64>,
	registered: Mutex<Vec<Weak<ImageResourceInner>>>
}

impl Default for ImageCache {
	fn default() -> Self {
		Self::new()
	}
}

impl ImageCache {
	pub fn new() -> Self {
		Self {
			shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
			client: reqwest::Client::new(),
			generation: Arc::new(AtomicU64::new(0)),
			registered: Mutex::new(Vec::new())
		}
	}

	/// Returns the handle for `url`, creating one in state `NotStarted` if this is the first
	/// reference to that URL.
	pub fn get_or_create(&self, url: &str) -> Handle {
		let shard = &self.shards[shard_index(url, self.shards.len())];
		let mut guard = shard.lock().unwrap();
		let newly_created = !guard.contains_key(url);
		let inner = guard.entry(url.to_string()).or_insert_with(|| Arc::new(ImageResourceInner { url: url.to_string(), state: Mutex::new(State::NotStarted) })).clone();
		drop(guard);

		if newly_created {
			self.registered.lock().unwrap().push(Arc::downgrade(&inner));
		}

		Handle { inner, generation: Arc::clone(&self.generation), client: self.client.clone() }
	}

	/// Monotonic counter bumped whenever any image completes decoding.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Advances every currently-registered animated handle by `tick_ms`. Intended to be driven
	/// by a `tokio::time::interval(Duration::from_millis(GIF_FRAME_LENGTH_MS))` loop.
	pub fn tick(&self, now: Instant) {
		let mut registered = self.registered.lock().unwrap();
		registered.retain(|weak| weak.strong_count() > 0);
		for weak in registered.iter() {
			if let Some(inner) = weak.upgrade() {
				Handle::advance_inner(&inner, now);
			}
		}
	}

	/// Spawns the cache-wide animation ticker on the current tokio runtime.
	pub fn spawn_ticker(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
		let cache = Arc::clone(self);
		tokio::spawn(async move {
			let mut interval = tokio::time::interval(std::time::Duration::from_millis(GIF_FRAME_LENGTH_MS));
			loop {
				interval.tick().await;
				cache.tick(Instant::now());
			}
		})
	}
}

/// A sharable handle to an [`ImageResourceInner`]. The handle itself is the identity: once a
/// fetch completes, every clone observes the updated state on its next call.
#[derive(Clone)]
pub struct Handle {
	inner: Arc<ImageResourceInner>,
	generation: Arc<AtomicU64>,
	client: reqwest::Client
}

impl Handle {
	pub fn url(&self) -> &str {
		&self.inner.url
	}

	/// Returns the current frame's pixels, or `None` if nothing has decoded yet. The first call
	/// on a fresh handle triggers exactly one background fetch.
	pub fn pixels(&self) -> Option<Frame> {
		let mut state = self.inner.state.lock().unwrap();
		match &*state {
			State::NotStarted => {
				*state = State::Loading;
				drop(state);
				self.spawn_fetch();
				None
			}
			State::Loading | State::Failed => None,
			State::Loaded { frames, current, .. } => frames.get(*current).cloned()
		}
	}

	pub fn is_animated(&self) -> bool {
		matches!(&*self.inner.state.lock().unwrap(), State::Loaded { frames, .. } if frames.len() > 1)
	}

	pub fn is_failed(&self) -> bool {
		matches!(&*self.inner.state.lock().unwrap(), State::Failed)
	}

	/// Advances the animation cursor. Calling this twice with the same `now` is a no-op the
	/// second time (idempotent within a tick).
	pub fn advance(&self, now: Instant) {
		Self::advance_inner(&self.inner, now);
	}

	fn advance_inner(inner: &Arc<ImageResourceInner>, now: Instant) {
		let mut state = inner.state.lock().unwrap();
		if let State::Loaded { frames, current, accumulator_ms, last_advance } = &mut *state {
			if frames.len() <= 1 {
				return;
			}
			let elapsed_ms = last_advance.map(|prev| now.saturating_duration_since(prev).as_secs_f32() * 1000.0).unwrap_or(0.0);
			*last_advance = Some(now);
			*accumulator_ms += elapsed_ms;
			while *accumulator_ms >= frames[*current].delay_ms as f32 {
				*accumulator_ms -= frames[*current].delay_ms as f32;
				*current = (*current + 1) % frames.len();
			}
		}
	}

	fn spawn_fetch(&self) {
		let inner = Arc::clone(&self.inner);
		let generation = Arc::clone(&self.generation);
		let client = self.client.clone();
		let url = inner.url.clone();
		tokio::spawn(async move {
			match fetch::fetch_and_decode(&client, &url).await {
				Ok(frames) => {
					*inner.state.lock().unwrap() = State::Loaded { frames, current: 0, accumulator_ms: 0.0, last_advance: None };
					generation.fetch_add(1, Ordering::AcqRel);
				}
				Err(error) => {
					tracing::warn!(url, %error, "image fetch/decode failed, giving up");
					*inner.state.lock().unwrap() = State::Failed;
				}
			}
		});
	}
}

/// A fully-decoded image resource, as observed by a reader once loading completes. Constructed
/// only for documentation/public-API purposes — state actually lives behind [`Handle`].
pub struct ImageResource {
	pub url: String,
	pub is_animated: bool,
	pub width: u32,
	pub height: u32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn get_or_create_returns_same_handle_identity() {
		let cache = ImageCache::new();
		let a = cache.get_or_create("https://example/a.png");
		let b = cache.get_or_create("https://example/a.png");
		assert!(Arc::ptr_eq(&a.inner, &b.inner));
	}

	#[tokio::test]
	async fn pixels_is_none_until_decoded_and_transitions_to_loading() {
		let cache = ImageCache::new();
		let handle = cache.get_or_create("not-a-real-url-scheme");
		assert!(handle.pixels().is_none());
		assert!(matches!(*handle.inner.state.lock().unwrap(), State::Loading));
	}

	#[test]
	fn generation_starts_at_zero() {
		let cache = ImageCache::new();
		assert_eq!(cache.generation(), 0);
	}

	#[test]
	fn failed_handle_never_returns_pixels() {
		let inner = Arc::new(ImageResourceInner { url: "x".into(), state: Mutex::new(State::Failed) });
		let handle = Handle { inner, generation: Arc::new(AtomicU64::new(0)), client: reqwest::Client::new() };
		assert!(handle.pixels().is_none());
		assert!(handle.is_failed());
	}
}
