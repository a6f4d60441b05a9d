// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-healing WebSocket event stream.
//!
//! One background loop per [`EventStream`]: resolve credentials, connect
//! with the `wamp` subprotocol, subscribe to `OnJsonApiEvent`, pump frames
//! into listeners and the hub, and reconnect with capped backoff. A
//! watchdog forces a reconnect when the connection goes silent.

pub mod backoff;
pub mod envelope;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use regex::Regex;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LcuConfig;
use crate::credential::resolver::CredentialResolver;
use crate::credential::Credentials;
use crate::error::{ErrorKind, LcuError};
use crate::http::client::LcuHttpClient;
use crate::http::{preview, tls, PREVIEW_CHARS};
use crate::hub::{panic_message, Listeners, Subscription, SubscriptionHub};
use crate::metrics::MetricsSink;

use self::backoff::Backoff;
use self::envelope::{decode_envelope, message_text, Envelope, MAX_MESSAGE_BYTES, SUBSCRIBE_FRAME};

/// WebSocket subprotocol the LCU speaks.
pub const WAMP_PROTOCOL: &str = "wamp";

/// Upper bound on the close handshake during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a live connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ended {
    Closed,
    /// A message exceeded the transport ceiling; reopen without backoff.
    Oversized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
        }
    }
}

struct Inner {
    config: LcuConfig,
    resolver: Arc<CredentialResolver>,
    http: Arc<LcuHttpClient>,
    metrics: Arc<dyn MetricsSink>,
    tls: Arc<rustls::ClientConfig>,
    hub: SubscriptionHub,
    raw: Listeners<str>,
    messages: Listeners<Envelope>,
    reconnected: Listeners<()>,
    state: AtomicU8,
    last_message_ms: AtomicU64,
    connected: watch::Sender<bool>,
    cancel: CancellationToken,
}

/// Long-lived connection to the LCU event feed.
///
/// Dropping the stream cancels its loop; [`EventStream::shutdown`] also
/// waits for the loop to finish.
pub struct EventStream {
    inner: Arc<Inner>,
    started: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl EventStream {
    pub fn new(
        config: &LcuConfig,
        resolver: Arc<CredentialResolver>,
        http: Arc<LcuHttpClient>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, LcuError> {
        let tls = Arc::new(tls::client_config(config.ws_accept_self_signed)?);
        let (connected, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(Inner {
                config: config.clone(),
                resolver,
                http,
                metrics,
                tls,
                hub: SubscriptionHub::new(),
                raw: Listeners::default(),
                messages: Listeners::default(),
                reconnected: Listeners::default(),
                state: AtomicU8::new(ConnectionState::Disconnected as u8),
                last_message_ms: AtomicU64::new(0),
                connected,
                cancel: CancellationToken::new(),
            }),
            started: AtomicBool::new(false),
            task: Mutex::new(None),
        })
    }

    /// Start the connection loop. Later calls do nothing. Outside a tokio
    /// runtime this logs and leaves the stream unstarted.
    pub fn connect(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.started.store(false, Ordering::Release);
            warn!("connect called outside a tokio runtime; stream not started");
            return;
        };
        let inner = Arc::clone(&self.inner);
        *self.task.lock() = Some(runtime.spawn(run(inner)));
    }

    /// Wait until the stream is connected. `false` on timeout.
    pub async fn wait_until_connected(&self, timeout: Duration) -> bool {
        let mut rx = self.inner.connected.subscribe();
        let up = matches!(tokio::time::timeout(timeout, rx.wait_for(|up| *up)).await, Ok(Ok(_)));
        up
    }

    /// [`connect`](Self::connect) then [`wait_until_connected`](Self::wait_until_connected).
    pub async fn connect_and_wait(&self, timeout: Duration) -> bool {
        self.connect();
        self.wait_until_connected(timeout).await
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// When the last message arrived (or the current connection opened).
    pub fn last_message_at(&self) -> Option<SystemTime> {
        match self.inner.last_message_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Some(UNIX_EPOCH + Duration::from_millis(ms)),
        }
    }

    /// Every complete text message, before decoding.
    pub fn on_raw_message(&self, f: impl Fn(&str) + Send + Sync + 'static) -> Subscription {
        self.inner.raw.add(f)
    }

    /// Every decoded envelope, before hub dispatch.
    pub fn on_message(&self, f: impl Fn(&Envelope) + Send + Sync + 'static) -> Subscription {
        self.inner.messages.add(f)
    }

    /// Each time a connection opens, including the first.
    pub fn on_reconnected(&self, f: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.inner.reconnected.add(move |_: &()| f())
    }

    pub fn subscribe(
        &self,
        uri: impl Into<String>,
        callback: impl Fn(&Envelope) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.hub.subscribe(uri, callback)
    }

    pub fn subscribe_pattern(
        &self,
        pattern: Regex,
        callback: impl Fn(&Envelope) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.hub.subscribe_pattern(pattern, callback)
    }

    /// Typed subscription. With `with_snapshot`, the current value is also
    /// fetched over HTTP and delivered through the same callback; it may
    /// arrive before or after live events.
    pub fn subscribe_typed<T, F>(&self, uri: &str, callback: F, with_snapshot: bool) -> Subscription
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let live = Arc::clone(&callback);
        let sub = self.inner.hub.subscribe_typed(uri, move |value: T| live(value));
        if with_snapshot {
            self.spawn_snapshot(uri.to_owned(), callback);
        }
        sub
    }

    pub fn hub(&self) -> &SubscriptionHub {
        &self.inner.hub
    }

    /// Feed one text frame through the same path as a received message.
    /// Used to replay recorded sessions.
    pub fn inject_frame(&self, text: &str) {
        self.inner.process_text(text);
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(err = %e, "ws loop ended abnormally");
            }
        }
    }

    fn spawn_snapshot<T, F>(&self, uri: String, callback: Arc<F>)
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(uri = %uri, "no runtime; snapshot skipped");
            return;
        };
        let http = Arc::clone(&self.inner.http);
        let cancel = self.inner.cancel.clone();
        runtime.spawn(async move {
            let fetched = tokio::select! {
                _ = cancel.cancelled() => return,
                r = http.get::<T>(&uri) => r,
            };
            match fetched {
                Ok(Some(value)) => {
                    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(value))) {
                        warn!(uri = %uri, panic = %panic_message(payload.as_ref()), "snapshot callback panicked");
                    }
                }
                Ok(None) => debug!(uri = %uri, "snapshot empty"),
                Err(e) => debug!(uri = %uri, err = %e, "snapshot failed"),
            }
        });
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

// -- Connection loop ----------------------------------------------------------

async fn run(inner: Arc<Inner>) {
    let mut backoff = Backoff::new(inner.config.base_retry_delay(), inner.config.ws_max_backoff());

    loop {
        if inner.cancel.is_cancelled() {
            break;
        }
        inner.set_state(ConnectionState::Connecting);

        match inner.open().await {
            Ok(Some(ws)) => {
                backoff.reset();
                if Arc::clone(&inner).serve(ws).await == Ended::Oversized {
                    continue;
                }
            }
            Ok(None) => break,
            Err(e) => {
                inner.set_state(ConnectionState::Disconnected);
                warn!(err = %e, "ws connect failed");
            }
        }

        if inner.cancel.is_cancelled() {
            break;
        }
        let delay = backoff.next_delay();
        debug!(delay_ms = delay.as_millis() as u64, "ws reconnect scheduled");
        tokio::select! {
            _ = inner.cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    inner.set_state(ConnectionState::Disconnected);
    inner.connected.send_replace(false);
    debug!("ws loop stopped");
}

impl Inner {
    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn touch(&self) {
        self.last_message_ms.store(epoch_ms(), Ordering::Release);
    }

    fn silence(&self) -> Duration {
        let last = self.last_message_ms.load(Ordering::Acquire);
        Duration::from_millis(epoch_ms().saturating_sub(last))
    }

    /// Resolve credentials and open the socket. `Ok(None)` when cancelled.
    async fn open(&self) -> Result<Option<WsStream>, LcuError> {
        let creds = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(None),
            r = self.resolver.resolve(&self.cancel) => r?,
        };
        let request = build_request(&creds)?;
        info!(port = creds.port, "ws connecting");

        let ceiling = self.config.ws_transport_max_bytes;
        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(ceiling);
        ws_config.max_frame_size = Some(ceiling);
        let connecting = tokio_tungstenite::connect_async_tls_with_config(
            request,
            Some(ws_config),
            true,
            Some(Connector::Rustls(Arc::clone(&self.tls))),
        );

        tokio::select! {
            _ = self.cancel.cancelled() => Ok(None),
            r = tokio::time::timeout(self.config.http_timeout(), connecting) => match r {
                Ok(Ok((ws, _))) => Ok(Some(ws)),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => Err(LcuError::connection("ws connect timed out")),
            },
        }
    }

    /// Run one live connection until it fails, goes silent, or is cancelled.
    async fn serve(self: Arc<Self>, mut ws: WsStream) -> Ended {
        self.touch();
        self.metrics.connection_opened();
        self.metrics.reconnect();
        self.set_state(ConnectionState::Connected);
        self.connected.send_replace(true);
        info!("ws connected");
        self.reconnected.emit(&(), "reconnected");

        let scope = self.cancel.child_token();
        let watchdog = spawn_watchdog(Arc::clone(&self), scope.clone());

        if let Err(e) = ws.send(Message::text(SUBSCRIBE_FRAME)).await {
            warn!(err = %e, "ws subscribe failed");
            scope.cancel();
        }

        let mut ended = Ended::Closed;
        loop {
            let msg = tokio::select! {
                _ = scope.cancelled() => break,
                msg = ws.next() => msg,
            };
            match msg {
                Some(Ok(msg)) => {
                    self.touch();
                    match msg {
                        Message::Text(text) => self.on_data(text.as_bytes()),
                        Message::Binary(data) => self.on_data(&data),
                        Message::Close(frame) => {
                            debug!(?frame, "ws close received");
                            break;
                        }
                        _ => {}
                    }
                }
                Some(Err(e)) => {
                    let e = LcuError::from(e);
                    if e.kind() == ErrorKind::FrameTooLarge {
                        // tungstenite cannot resume after a capacity error.
                        self.metrics.parse_failure();
                        ended = Ended::Oversized;
                    }
                    warn!(err = %e, "ws receive failed");
                    break;
                }
                None => break,
            }
        }

        scope.cancel();
        let _ = watchdog.await;
        let _ = tokio::time::timeout(CLOSE_TIMEOUT, ws.close(None)).await;

        self.connected.send_replace(false);
        self.set_state(ConnectionState::Disconnected);
        self.metrics.connection_closed();
        info!("ws disconnected");
        ended
    }

    fn on_data(&self, bytes: &[u8]) {
        match message_text(bytes, MAX_MESSAGE_BYTES) {
            Ok(text) => self.process_text(&text),
            Err(size) => {
                self.metrics.parse_failure();
                warn!(size, max = MAX_MESSAGE_BYTES, "ws message too large, dropped");
            }
        }
    }

    /// Raw listeners, then decode, then message listeners and the hub.
    fn process_text(&self, text: &str) {
        self.raw.emit(text, "raw");
        match decode_envelope(text) {
            Ok(env) => {
                self.metrics.message_received();
                self.messages.emit(&env, "message");
                self.hub.dispatch(&env);
            }
            Err(e) => {
                self.metrics.parse_failure();
                warn!(err = %e, frame = %preview(text, PREVIEW_CHARS), "ws frame not decoded");
            }
        }
    }
}

/// Cancel `scope` once no message has arrived for the silence threshold.
fn spawn_watchdog(inner: Arc<Inner>, scope: CancellationToken) -> JoinHandle<()> {
    let threshold = inner.config.ws_silence_threshold();
    let period = inner.config.ws_watchdog_interval().max(Duration::from_millis(1));
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = scope.cancelled() => break,
                _ = timer.tick() => {}
            }
            let silent = inner.silence();
            if silent > threshold {
                warn!(silent_ms = silent.as_millis() as u64, "ws silent, forcing reconnect");
                scope.cancel();
                break;
            }
        }
    })
}

fn build_request(creds: &Credentials) -> Result<Request, LcuError> {
    let mut request = creds.ws_url().into_client_request()?;
    let auth = HeaderValue::from_str(&creds.authorization_header())
        .map_err(|e| LcuError::bad_request(format!("authorization header: {e}")))?;
    let headers = request.headers_mut();
    headers.insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(WAMP_PROTOCOL));
    headers.insert(AUTHORIZATION, auth);
    Ok(request)
}

fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
