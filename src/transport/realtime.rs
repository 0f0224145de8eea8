//! Realtime channel: one shared Socket.IO connection and its subscribers.
//!
//! The channel runs on its own thread, reconnecting with exponential backoff
//! until shut down. Decoded events are dispatched through a
//! [`SubscriptionRegistry`] to every handler registered for that event name,
//! in receipt order. Handlers are released by dropping their
//! [`Subscription`] guard, so a torn-down view can never leave a duplicate
//! handler behind.
//!
//! Besides server events, the channel emits the reserved names `connect`,
//! `disconnect` and `connect_error` like the browser client does.

use crate::model::ChannelError;
use crate::transport::socketio::Packet;
use reqwest::Url;
use std::collections::BTreeMap;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{HandshakeError, Message, WebSocket};

/// Reserved event: namespace connected.
pub const EVENT_CONNECT: &str = "connect";
/// Reserved event: established connection lost. Payload is the reason string.
pub const EVENT_DISCONNECT: &str = "disconnect";
/// Reserved event: connection attempt failed. Payload is the reason string.
pub const EVENT_CONNECT_ERROR: &str = "connect_error";

/// How often a blocked read wakes up to check for shutdown and heartbeat.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Heartbeat window used until the server's handshake says otherwise.
const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(45);

type Handler = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

// ===== SubscriptionRegistry =====

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    handlers: BTreeMap<String, Vec<(u64, Handler)>>,
    /// Total channel bindings ever made; one per event name per 0→1 transition.
    bindings_made: u64,
}

/// Reference-counted table of event handlers.
///
/// The first subscriber to an event binds the event on the channel; later
/// subscribers share that binding; the last one to leave releases it.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SubscriptionRegistry")
            .field("events", &inner.handlers.keys().collect::<Vec<_>>())
            .field("bindings_made", &inner.bindings_made)
            .finish()
    }
}

impl SubscriptionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler` for `event`. Dropping the returned guard unsubscribes.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;

        let is_first = !inner.handlers.contains_key(event);
        if is_first {
            inner.bindings_made += 1;
            debug!(event, "Binding channel handler");
        }
        inner
            .handlers
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(handler)));

        Subscription {
            registry: Arc::downgrade(&self.inner),
            event: event.to_string(),
            id,
        }
    }

    /// Invoke every handler for `event`. Returns how many ran.
    ///
    /// Handlers run outside the registry lock so they may subscribe or
    /// unsubscribe themselves.
    pub fn dispatch(&self, event: &str, payload: &serde_json::Value) -> usize {
        let handlers: Vec<Handler> = {
            let inner = self.lock();
            match inner.handlers.get(event) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return 0,
            }
        };
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    /// Live handlers for `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.lock().handlers.get(event).map_or(0, Vec::len)
    }

    /// Event names currently bound on the channel.
    pub fn bound_events(&self) -> Vec<String> {
        self.lock().handlers.keys().cloned().collect()
    }

    /// Channel bindings made; one each time an event goes from zero handlers to one.
    pub fn bindings_made(&self) -> u64 {
        self.lock().bindings_made
    }
}

fn unsubscribe(inner: &Mutex<RegistryInner>, event: &str, id: u64) {
    let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
    let now_empty = match inner.handlers.get_mut(event) {
        Some(list) => {
            list.retain(|(handler_id, _)| *handler_id != id);
            list.is_empty()
        }
        None => false,
    };
    if now_empty {
        inner.handlers.remove(event);
        debug!(event, "Releasing channel handler");
    }
}

/// Scoped handler registration. Unsubscribes on drop, including during unwinding.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Mutex<RegistryInner>>,
    event: String,
    id: u64,
}

impl Subscription {
    /// Event this subscription listens to.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Explicit release; equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            unsubscribe(&inner, &self.event, self.id);
        }
    }
}

// ===== RealtimeChannel =====

/// Connection parameters for the channel thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    /// Websocket URL including the Engine.IO query.
    pub url: Url,
    /// Delay before the first reconnect attempt.
    pub reconnect_delay: Duration,
    /// Cap for the doubled reconnect delay.
    pub max_reconnect_delay: Duration,
    /// Bound on the TCP connect and, separately, on the websocket upgrade.
    pub connect_timeout: Duration,
}

/// Delay before reconnect attempt number `attempt` (0-based).
pub fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(max)
}

/// Handle to the channel thread. Shuts the thread down on drop.
#[derive(Debug)]
pub struct RealtimeChannel {
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeChannel {
    /// Start the channel thread.
    pub fn spawn(settings: ChannelSettings, registry: SubscriptionRegistry) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);
        let handle = std::thread::Builder::new()
            .name("argus-realtime".to_string())
            .spawn(move || run_channel(&settings, &registry, &thread_shutdown))?;
        Ok(Self {
            shutdown,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// A channel that never connects, for REST-only runs and tests.
    pub fn detached() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(true)),
            handle: Mutex::new(None),
        }
    }

    /// False once [`shutdown`](Self::shutdown) was called, or for a detached channel.
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst)
    }

    /// Stop the thread and wait for it. Idempotent.
    ///
    /// Returns within one poll interval once connected, and within the
    /// connect timeout while a TCP connect is still pending.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Realtime thread panicked");
            }
        }
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_channel(settings: &ChannelSettings, registry: &SubscriptionRegistry, shutdown: &AtomicBool) {
    let mut attempt: u32 = 0;

    while !shutdown.load(Ordering::SeqCst) {
        info!(url = %settings.url, attempt, "Connecting realtime channel");
        let mut connected = false;
        let result = run_session(settings, registry, shutdown, &mut connected);

        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let reason = match result {
            Ok(()) => "connection closed".to_string(),
            Err(e) => e.to_string(),
        };
        let payload = serde_json::Value::String(reason.clone());
        if connected {
            warn!(reason = %reason, "Realtime channel disconnected");
            registry.dispatch(EVENT_DISCONNECT, &payload);
            attempt = 0;
        } else {
            warn!(reason = %reason, attempt, "Realtime connection attempt failed");
            registry.dispatch(EVENT_CONNECT_ERROR, &payload);
        }

        let delay = backoff_delay(settings.reconnect_delay, settings.max_reconnect_delay, attempt);
        attempt = attempt.saturating_add(1);
        sleep_unless_shutdown(delay, shutdown);
    }
    debug!("Realtime channel thread exiting");
}

fn sleep_unless_shutdown(total: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + total;
    while !shutdown.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep((deadline - now).min(POLL_INTERVAL));
    }
}

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

fn connect_error(error: impl std::fmt::Display) -> ChannelError {
    ChannelError::Connect(error.to_string())
}

fn connect_tcp(url: &Url, timeout: Duration) -> Result<TcpStream, ChannelError> {
    let addrs = url.socket_addrs(|| None).map_err(connect_error)?;
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(match last_error {
        Some(e) => connect_error(e),
        None => connect_error(format!("no address for {url}")),
    })
}

/// TCP connect plus websocket upgrade, both bounded by `connect_timeout`.
///
/// Reads time out after [`POLL_INTERVAL`] from the start, so a server that
/// accepts but never answers the upgrade cannot hold off shutdown.
fn open_socket(settings: &ChannelSettings, shutdown: &AtomicBool) -> Result<Socket, ChannelError> {
    let stream = connect_tcp(&settings.url, settings.connect_timeout)?;
    stream
        .set_read_timeout(Some(POLL_INTERVAL))
        .map_err(connect_error)?;
    stream
        .set_write_timeout(Some(settings.connect_timeout))
        .map_err(connect_error)?;

    let deadline = Instant::now() + settings.connect_timeout;
    let mut attempt = tungstenite::client_tls_with_config(settings.url.as_str(), stream, None, None);
    loop {
        match attempt {
            Ok((socket, _response)) => return Ok(socket),
            Err(HandshakeError::Interrupted(mid)) => {
                if shutdown.load(Ordering::SeqCst) {
                    return Err(connect_error("shut down during handshake"));
                }
                if Instant::now() >= deadline {
                    return Err(connect_error("websocket upgrade timed out"));
                }
                attempt = mid.handshake();
            }
            Err(HandshakeError::Failure(e)) => return Err(connect_error(e)),
        }
    }
}

fn send(socket: &mut Socket, packet: &Packet) -> Result<(), ChannelError> {
    socket
        .send(Message::Text(packet.encode()))
        .map_err(|e| ChannelError::Lost(e.to_string()))
}

/// One connection lifetime. Returns when the connection ends or on shutdown.
fn run_session(
    settings: &ChannelSettings,
    registry: &SubscriptionRegistry,
    shutdown: &AtomicBool,
    connected: &mut bool,
) -> Result<(), ChannelError> {
    let mut socket = open_socket(settings, shutdown)?;

    let mut heartbeat = DEFAULT_HEARTBEAT;
    let mut last_seen = Instant::now();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            let _ = socket.close(None);
            return Ok(());
        }

        match socket.read() {
            Ok(Message::Text(frame)) => {
                last_seen = Instant::now();
                match Packet::decode(&frame) {
                    Ok(Packet::Open(handshake)) => {
                        heartbeat = handshake.heartbeat_deadline();
                        debug!(sid = %handshake.sid, ?heartbeat, "Engine open");
                        send(&mut socket, &Packet::Connected)?;
                    }
                    Ok(Packet::Ping) => send(&mut socket, &Packet::Pong)?,
                    Ok(Packet::Connected) => {
                        *connected = true;
                        info!("Realtime channel connected");
                        registry.dispatch(EVENT_CONNECT, &serde_json::Value::Null);
                    }
                    Ok(Packet::Disconnected) => {
                        return Err(ChannelError::Lost("server disconnected namespace".to_string()))
                    }
                    Ok(Packet::Close) => {
                        return Err(ChannelError::Lost("server closed session".to_string()))
                    }
                    Ok(Packet::ConnectError(message)) => return Err(ChannelError::Rejected(message)),
                    Ok(Packet::Event { name, payload }) => {
                        let delivered = registry.dispatch(&name, &payload);
                        debug!(event = %name, delivered, "Realtime event");
                    }
                    Ok(Packet::Pong) | Ok(Packet::Other(_)) => {}
                    Err(e) => warn!(error = %ChannelError::Frame(e.to_string()), "Skipping frame"),
                }
            }
            Ok(Message::Close(_)) => return Err(ChannelError::Lost("websocket closed".to_string())),
            Ok(_) => last_seen = Instant::now(),
            Err(tungstenite::Error::Io(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                if last_seen.elapsed() > heartbeat {
                    return Err(ChannelError::HeartbeatTimeout);
                }
            }
            Err(e) => return Err(ChannelError::Lost(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "realtime_tests.rs"]
mod tests;
