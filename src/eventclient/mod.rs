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

//! Real-time event ingress (§4.4), generalized from Chatterino's 7TV EventAPI client
//! (`examples/original_source/src/providers/seventv/eventapi/Client.cpp`). Connects over
//! WebSocket (via `tokio-tungstenite`, grounded on
//! `examples/other_examples/84b47cd4_bolshoytoster-twitch-tui-client__src-irc.rs.rs`, the only
//! pack example opening a Twitch-adjacent WebSocket), enforces heartbeats, and reconnects with
//! exponential back-off.

pub mod wire;

use std::{
	collections::HashSet,
	sync::{
		atomic::{AtomicU32, Ordering},
		Arc, Mutex
	},
	time::Duration
};

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};

pub use self::wire::{Condition, Dispatch, Opcode, Subscription, SubscriptionType};

/// Errors recovered locally by the reconnect loop (§7 item 1); never surfaced to callers except
/// as an in-channel system message.
#[derive(Debug, Error)]
pub enum Error {
	#[error("websocket transport error: {0}")]
	Transport(#[from] tokio_tungstenite::tungstenite::Error),
	#[error("failed to decode wire frame: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("no heartbeat or server message received within the timeout window")]
	MissedHeartbeat,
	#[error("connection closed")]
	Closed,
	/// The server asked us to reconnect (`Opcode::Reconnect`). Distinct from a generic drop so the
	/// outer loop can reopen immediately without bumping the backoff falloff (§4.4).
	#[error("server requested reconnect")]
	ServerReconnect
}

/// Per-connection state machine (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Disconnected,
	Connecting,
	Open,
	Closing
}

#[derive(Debug, Clone)]
pub struct EventClientConfig {
	pub url: String,
	/// Base reconnect interval in ms. Spec default: 2000.
	pub base_interval_ms: u64,
	/// Falloff cap. Spec default: 60.
	pub max_falloff: u32,
	/// Heartbeat interval in ms, overridden by the server's `Hello` payload. Spec default: 25000.
	pub heartbeat_interval_ms: u64
}

impl EventClientConfig {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into(), ..Default::default() }
	}
}

impl Default for EventClientConfig {
	fn default() -> Self {
		Self { url: String::new(), base_interval_ms: 2000, max_falloff: 60, heartbeat_interval_ms: 25000 }
	}
}

/// Computes the reconnect delay for a given falloff multiplier, per §4.4:
/// `min(base_interval * falloff, base_interval * max_falloff)`.
pub fn reconnect_delay(config: &EventClientConfig, falloff: u32) -> Duration {
	let capped = falloff.min(config.max_falloff);
	Duration::from_millis(config.base_interval_ms * capped as u64)
}

enum Command {
	Subscribe(Subscription),
	Unsubscribe(Subscription),
	Stop
}

/// A persistent WebSocket connection to an event service.
pub struct EventClient {
	state: Arc<Mutex<ConnectionState>>,
	falloff: Arc<AtomicU32>,
	owned: Arc<Mutex<HashSet<Subscription>>>,
	dispatches: broadcast::Sender<Dispatch>,
	command_tx: mpsc::UnboundedSender<Command>
}

impl EventClient {
	/// Spawns the connection loop on the current tokio runtime and returns a handle immediately;
	/// the socket itself connects asynchronously.
	pub fn spawn(config: EventClientConfig) -> Self {
		let state = Arc::new(Mutex::new(ConnectionState::Disconnected));
		let falloff = Arc::new(AtomicU32::new(1));
		let owned = Arc::new(Mutex::new(HashSet::new()));
		let (dispatches, _) = broadcast::channel(256);
		let (command_tx, command_rx) = mpsc::unbounded_channel();

		let task_state = Arc::clone(&state);
		let task_falloff = Arc::clone(&falloff);
		let task_owned = Arc::clone(&owned);
		let task_dispatches = dispatches.clone();
		tokio::spawn(run(config, task_state, task_falloff, task_owned, task_dispatches, command_rx));

		Self { state, falloff, owned, dispatches, command_tx }
	}

	pub fn state(&self) -> ConnectionState {
		*self.state.lock().unwrap()
	}

	pub fn falloff(&self) -> u32 {
		self.falloff.load(Ordering::Acquire)
	}

	pub fn owned_subscriptions(&self) -> HashSet<Subscription> {
		self.owned.lock().unwrap().clone()
	}

	pub fn owned_count(&self) -> usize {
		self.owned.lock().unwrap().len()
	}

	pub fn subscribe_dispatches(&self) -> broadcast::Receiver<Dispatch> {
		self.dispatches.subscribe()
	}

	pub fn subscribe(&self, sub: Subscription) {
		self.owned.lock().unwrap().insert(sub.clone());
		let _ = self.command_tx.send(Command::Subscribe(sub));
	}

	pub fn unsubscribe(&self, sub: Subscription) {
		self.owned.lock().unwrap().remove(&sub);
		let _ = self.command_tx.send(Command::Unsubscribe(sub));
	}

	pub fn stop(&self) {
		let _ = self.command_tx.send(Command::Stop);
	}
}

async fn run(
	config: EventClientConfig,
	state: Arc<Mutex<ConnectionState>>,
	falloff: Arc<AtomicU32>,
	owned: Arc<Mutex<HashSet<Subscription>>>,
	dispatches: broadcast::Sender<Dispatch>,
	mut command_rx: mpsc::UnboundedReceiver<Command>
) {
	loop {
		*state.lock().unwrap() = ConnectionState::Connecting;
		match connect_and_run(&config, &state, &falloff, &owned, &dispatches, &mut command_rx).await {
			Ok(()) => {
				debug!("event client stopped");
				return;
			}
			Err(Error::Closed) => return,
			Err(Error::ServerReconnect) => {
				debug!("server requested reconnect, reopening without backoff");
				*state.lock().unwrap() = ConnectionState::Disconnected;
				continue;
			}
			Err(error) => {
				warn!(%error, "event client disconnected, scheduling reconnect");
				*state.lock().unwrap() = ConnectionState::Disconnected;
				let current_falloff = falloff.load(Ordering::Acquire);
				let delay = reconnect_delay(&config, current_falloff);
				falloff.store((current_falloff + 1).min(config.max_falloff), Ordering::Release);
				tokio::time::sleep(delay).await;
			}
		}
	}
}

async fn connect_and_run(
	config: &EventClientConfig,
	state: &Arc<Mutex<ConnectionState>>,
	falloff: &Arc<AtomicU32>,
	owned: &Arc<Mutex<HashSet<Subscription>>>,
	dispatches: &broadcast::Sender<Dispatch>,
	command_rx: &mut mpsc::UnboundedReceiver<Command>
) -> Result<(), Error> {
	let (ws_stream, _) = tokio_tungstenite::connect_async(&config.url).await?;
	let (mut write, mut read) = ws_stream.split();

	*state.lock().unwrap() = ConnectionState::Open;
	falloff.store(1, Ordering::Release);

	let initial_subs: Vec<Subscription> = owned.lock().unwrap().iter().cloned().collect();
	for sub in initial_subs {
		let frame = sub.encode_frame(Opcode::Subscribe);
		let _ = write.send(WsMessage::text(serde_json::to_string(&frame)?)).await;
	}

	let mut heartbeat_interval_ms = config.heartbeat_interval_ms;
	let mut deadline = Box::pin(tokio::time::sleep(Duration::from_millis(heartbeat_interval_ms * 3)));

	loop {
		tokio::select! {
			_ = &mut deadline => {
				let _ = write.close().await;
				return Err(Error::MissedHeartbeat);
			}
			command = command_rx.recv() => {
				match command {
					Some(Command::Subscribe(sub)) => {
						let frame = sub.encode_frame(Opcode::Subscribe);
						let _ = write.send(WsMessage::text(serde_json::to_string(&frame)?)).await;
					}
					Some(Command::Unsubscribe(sub)) => {
						let frame = sub.encode_frame(Opcode::Unsubscribe);
						let _ = write.send(WsMessage::text(serde_json::to_string(&frame)?)).await;
					}
					Some(Command::Stop) | None => {
						*state.lock().unwrap() = ConnectionState::Closing;
						let _ = write.close().await;
						return Err(Error::Closed);
					}
				}
			}
			message = read.next() => {
				let Some(message) = message else {
					return Err(Error::Closed);
				};
				let message = message?;
				if !message.is_text() {
					continue;
				}
				deadline.as_mut().reset(tokio::time::Instant::now() + Duration::from_millis(heartbeat_interval_ms * 3));

				let frame: wire::RawFrame = match serde_json::from_str(message.to_text().unwrap_or_default()) {
					Ok(frame) => frame,
					Err(error) => {
						warn!(%error, "dropping malformed event frame");
						continue;
					}
				};
				let Some(opcode) = Opcode::from_i32(frame.op) else {
					continue;
				};

				match opcode {
					Opcode::Hello => {
						if let Ok(hello) = serde_json::from_value::<wire::HelloPayload>(frame.d) {
							heartbeat_interval_ms = hello.heartbeat_interval_ms;
							deadline.as_mut().reset(tokio::time::Instant::now() + Duration::from_millis(heartbeat_interval_ms * 3));
						}
					}
					Opcode::Heartbeat => {}
					Opcode::Dispatch => {
						if let Some(kind) = frame.d.get("type").and_then(|v| v.as_str()) {
							if let Some(body) = frame.d.get("body") {
								if let Some(dispatch) = wire::parse_dispatch(kind, body) {
									let _ = dispatches.send(dispatch);
								} else {
									debug!(kind, "dropping unrecognized dispatch kind");
								}
							}
						}
					}
					Opcode::Reconnect => {
						let _ = write.close().await;
						return Err(Error::ServerReconnect);
					}
					Opcode::EndOfStream => {
						falloff.store(1, Ordering::Release);
						return Err(Error::Closed);
					}
					Opcode::Error => {
						warn!(?frame.d, "event service reported an error");
					}
					Opcode::Ack | Opcode::Identify | Opcode::Resume | Opcode::Signal | Opcode::Subscribe | Opcode::Unsubscribe => {}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reconnect_delay_follows_falloff_schedule() {
		let config = EventClientConfig { base_interval_ms: 2000, max_falloff: 60, ..Default::default() };
		assert_eq!(reconnect_delay(&config, 1), Duration::from_millis(2000));
		assert_eq!(reconnect_delay(&config, 2), Duration::from_millis(4000));
		assert_eq!(reconnect_delay(&config, 3), Duration::from_millis(6000));
	}

	#[test]
	fn reconnect_delay_caps_at_max_falloff() {
		let config = EventClientConfig { base_interval_ms: 2000, max_falloff: 60, ..Default::default() };
		assert_eq!(reconnect_delay(&config, 1000), reconnect_delay(&config, 60));
	}

	#[tokio::test]
	async fn hello_adopts_server_heartbeat_interval_and_open_resets_falloff() {
		use tokio::net::TcpListener;

		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();

		let server = tokio::spawn(async move {
			let (stream, _) = listener.accept().await.unwrap();
			let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
			let hello = wire::RawFrame { op: Opcode::Hello as i32, d: serde_json::json!({ "heartbeat_interval_ms": 5000 }) };
			ws.send(WsMessage::text(serde_json::to_string(&hello).unwrap())).await.unwrap();
			tokio::time::sleep(Duration::from_millis(200)).await;
		});

		let client = EventClient::spawn(EventClientConfig::new(format!("ws://{addr}")));
		tokio::time::sleep(Duration::from_millis(100)).await;
		assert_eq!(client.state(), ConnectionState::Open);
		assert_eq!(client.falloff(), 1);

		server.abort();
	}

	#[tokio::test]
	async fn server_reconnect_reopens_without_bumping_falloff() {
		use tokio::net::TcpListener;

		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();

		let server = tokio::spawn(async move {
			for _ in 0..2 {
				let (stream, _) = listener.accept().await.unwrap();
				let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
				let hello = wire::RawFrame { op: Opcode::Hello as i32, d: serde_json::json!({ "heartbeat_interval_ms": 5000 }) };
				ws.send(WsMessage::text(serde_json::to_string(&hello).unwrap())).await.unwrap();
				tokio::time::sleep(Duration::from_millis(150)).await;
				let reconnect = wire::RawFrame { op: Opcode::Reconnect as i32, d: serde_json::Value::Null };
				let _ = ws.send(WsMessage::text(serde_json::to_string(&reconnect).unwrap())).await;
			}
		});

		let client = EventClient::spawn(EventClientConfig::new(format!("ws://{addr}")));
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(client.state(), ConnectionState::Open);
		assert_eq!(client.falloff(), 1);

		// past the first reconnect (~150ms in) but well before the second (~300ms in)
		tokio::time::sleep(Duration::from_millis(170)).await;
		assert_eq!(client.state(), ConnectionState::Open);
		assert_eq!(client.falloff(), 1);

		server.abort();
	}
}
