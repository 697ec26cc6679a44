// ── Runtime connection configuration ──
//
// These types describe *how* to reach a Vigil backend. They carry
// connection tuning only, never credentials, and never touch disk.
// The CLI constructs a `BackendConfig` and hands it in; tokens come
// from a `TokenSource`.

use std::time::Duration;

use url::Url;
use vigil_api::ReconnectConfig;

/// Topics whose messages are discrete events kept under unique keys.
pub const DEFAULT_APPEND_TOPICS: &[&str] = &["alert", "theft_detection"];

/// Entries retained per append-keyed topic before the oldest are evicted.
pub const DEFAULT_APPEND_RETENTION: usize = 500;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs on a lab backend).
    DangerAcceptInvalid,
}

/// Configuration for talking to a single backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// REST API root (e.g. `https://api.vigil.local/api`).
    pub api_url: Url,
    /// Socket server origin (e.g. `https://api.vigil.local`).
    pub socket_url: Url,
    /// Socket.IO endpoint path joined onto `socket_url`.
    pub socket_path: String,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How often polling readers re-read the state store.
    pub poll_interval: Duration,
    /// Topics stored as append logs rather than merged state.
    pub append_topics: Vec<String>,
    /// Cap on entries per append-keyed topic.
    pub append_retention: usize,
    /// Backoff policy for re-establishing a dropped socket.
    pub reconnect: ReconnectConfig,
}

impl BackendConfig {
    /// Defaults for everything but the two endpoints.
    pub fn new(api_url: Url, socket_url: Url) -> Self {
        Self {
            api_url,
            socket_url,
            socket_path: "/socket.io/".into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            append_topics: DEFAULT_APPEND_TOPICS
                .iter()
                .map(|t| (*t).to_owned())
                .collect(),
            append_retention: DEFAULT_APPEND_RETENTION,
            reconnect: ReconnectConfig::default(),
        }
    }

    pub(crate) fn transport(&self) -> vigil_api::TransportConfig {
        use vigil_api::TlsMode;

        vigil_api::TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
