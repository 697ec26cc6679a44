//! Realtime socket transport.
//!
//! The backend speaks Socket.IO v5 over Engine.IO v4 on a plain WebSocket.
//! This module owns the wire side only: URL construction, the packet codec,
//! the [`Connector`]/[`Connection`] seam, and reconnect backoff math. Topic
//! bookkeeping and reconnection policy live in `vigil-core`.

pub mod codec;
mod websocket;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use crate::error::Error;

pub use websocket::{EngineIoConnection, WsConnector};

// ── SocketEvent ──────────────────────────────────────────────────────

/// One inbound event: the topic it was emitted on and its payload.
///
/// A single emitted argument becomes the payload as-is. Several arguments
/// are kept together as a JSON array, so a `[meta, jsonString]` emission
/// reaches consumers in that shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketEvent {
    pub topic: String,
    pub payload: Value,
}

impl SocketEvent {
    pub fn from_args(topic: String, mut args: Vec<Value>) -> Self {
        let payload = match args.len() {
            0 => Value::Null,
            1 => args.remove(0),
            _ => Value::Array(args),
        };
        Self { topic, payload }
    }
}

// ── Connector seam ───────────────────────────────────────────────────

/// Opens authenticated socket connections.
///
/// Each successful call is one underlying socket construction. Tests
/// substitute an in-memory implementation to count and script them.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Connection>, Error>;
}

/// A live, handshaken socket.
#[async_trait]
pub trait Connection: Send {
    /// Next inbound event. `None` means the connection ended cleanly.
    ///
    /// Must be cancel-safe: callers race it against outbound sends in
    /// `select!` and drop it whenever the other branch wins.
    async fn recv(&mut self) -> Option<Result<SocketEvent, Error>>;

    /// Emit one event. At-most-once: no buffering or retry.
    async fn send(&mut self, event: &str, payload: Value) -> Result<(), Error>;

    /// Close the connection, best-effort.
    async fn close(&mut self);
}

/// Build the socket URL for a backend, carrying the bearer token as a
/// `token` query parameter.
///
/// `http`/`https` base URLs are mapped to `ws`/`wss`.
pub fn socket_url(base: &Url, path: &str, token: &SecretString) -> Result<Url, Error> {
    let mut url = base.join(path)?;

    let scheme = match url.scheme() {
        "http" => Some("ws"),
        "https" => Some("wss"),
        "ws" | "wss" => None,
        other => {
            return Err(Error::SocketConnect(format!(
                "unsupported socket scheme '{other}'"
            )));
        }
    };
    if let Some(scheme) = scheme {
        url.set_scheme(scheme)
            .map_err(|()| Error::SocketConnect("cannot switch URL scheme".into()))?;
    }

    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket")
        .append_pair("token", token.expose_secret());

    Ok(url)
}

/// Strip the query string so URLs can be logged without leaking the token.
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for socket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 5s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever. Default: 5.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            max_retries: Some(5),
        }
    }
}

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
pub fn backoff_delay(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}
