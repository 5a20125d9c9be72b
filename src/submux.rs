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

//! Subscription multiplexing across a pool of [`EventClient`]s (§4.5).
//!
//! Coalesces subscription requests from many callers into the minimum set of wire
//! subscriptions, sharding load across connections by the server-enforced per-connection
//! subscription cap, and replaying the live set on reconnect (handled per-connection by
//! [`EventClient`] itself since it keeps its own owned set across reconnects).

use std::{collections::HashSet, sync::Mutex};

use tracing::debug;

use crate::eventclient::{EventClient, EventClientConfig, Subscription};

/// The server-enforced per-connection subscription cap (§4.5: "typically 100 topics").
pub const SUBSCRIPTION_CAP: usize = 100;

/// Coalesces subscriptions across a sharded pool of [`EventClient`] connections.
pub struct SubscriptionMultiplexer {
	config_template: EventClientConfig,
	live: Mutex<HashSet<Subscription>>,
	clients: Mutex<Vec<EventClient>>
}

impl SubscriptionMultiplexer {
	pub fn new(config_template: EventClientConfig) -> Self {
		Self { config_template, live: Mutex::new(HashSet::new()), clients: Mutex::new(Vec::new()) }
	}

	pub fn live_count(&self) -> usize {
		self.live.lock().unwrap().len()
	}

	pub fn client_count(&self) -> usize {
		self.clients.lock().unwrap().len()
	}

	/// Adds `sub` to the live set, routing it to the first client with spare capacity or
	/// spawning a new one. No-ops if `sub` is already live.
	pub fn subscribe(&self, sub: Subscription) {
		let mut live = self.live.lock().unwrap();
		if !live.insert(sub.clone()) {
			return;
		}
		drop(live);

		let mut clients = self.clients.lock().unwrap();
		if let Some(client) = clients.iter().find(|client| client.owned_count() < SUBSCRIPTION_CAP) {
			client.subscribe(sub);
			return;
		}

		debug!("subscription pool exhausted, spawning a new connection");
		let client = EventClient::spawn(self.config_template.clone());
		client.subscribe(sub);
		clients.push(client);
	}

	/// Removes `sub` from its owning client and the live set. If that client's owned set becomes
	/// empty and more than one client remains, the empty client is retired.
	pub fn unsubscribe(&self, sub: &Subscription) {
		if !self.live.lock().unwrap().remove(sub) {
			return;
		}

		let mut clients = self.clients.lock().unwrap();
		let Some(owner_idx) = clients.iter().position(|client| client.owned_subscriptions().contains(sub)) else {
			return;
		};
		clients[owner_idx].unsubscribe(sub.clone());

		if clients.len() > 1 && clients[owner_idx].owned_count() == 0 {
			let retired = clients.remove(owner_idx);
			retired.stop();
		}
	}

	pub fn is_live(&self, sub: &Subscription) -> bool {
		self.live.lock().unwrap().contains(sub)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::eventclient::{Condition, SubscriptionType};

	fn sub(id: &str) -> Subscription {
		Subscription::new(Condition::Channel(id.to_string()), SubscriptionType::UserUpdate)
	}

	#[tokio::test]
	async fn resubscribing_the_same_subscription_is_a_noop() {
		let mux = SubscriptionMultiplexer::new(EventClientConfig::new("ws://127.0.0.1:1"));
		mux.subscribe(sub("1"));
		mux.subscribe(sub("1"));
		assert_eq!(mux.live_count(), 1);
		assert_eq!(mux.client_count(), 1);
	}

	#[tokio::test]
	async fn unsubscribing_unknown_subscription_is_a_noop() {
		let mux = SubscriptionMultiplexer::new(EventClientConfig::new("ws://127.0.0.1:1"));
		mux.unsubscribe(&sub("ghost"));
		assert_eq!(mux.client_count(), 0);
	}

	#[tokio::test]
	async fn new_client_spawned_once_cap_is_exhausted() {
		let mux = SubscriptionMultiplexer::new(EventClientConfig::new("ws://127.0.0.1:1"));
		for i in 0..SUBSCRIPTION_CAP {
			mux.subscribe(sub(&i.to_string()));
		}
		assert_eq!(mux.client_count(), 1);
		mux.subscribe(sub("overflow"));
		assert_eq!(mux.client_count(), 2);
	}
}
