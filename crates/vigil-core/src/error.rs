// ── Core error types ──
//
// User-facing errors from vigil-core. Transport details are flattened to
// strings so the type is `Clone`: a single connect outcome is shared by
// every caller awaiting the same in-flight attempt.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Not connected to the backend")]
    Disconnected,

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("{message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vigil_api::Error> for CoreError {
    fn from(err: vigil_api::Error) -> Self {
        use vigil_api::Error as E;

        match err {
            E::Unauthorized { message } => CoreError::Unauthorized { message },
            E::Api {
                status: 401 | 403,
                message,
            } => CoreError::Unauthorized { message },
            E::Api {
                status: 404,
                message,
            } => CoreError::NotFound {
                identifier: message,
            },
            E::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            E::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            E::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            E::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            E::SocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("socket connection failed: {reason}"),
            },
            E::Handshake(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("socket handshake failed: {reason}"),
            },
            E::SocketClosed { reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("socket closed: {reason}"),
            },
            E::Protocol(msg) => CoreError::Internal(format!("Protocol error: {msg}")),
            E::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_maps_to_domain_variants() {
        let unauthorized = CoreError::from(vigil_api::Error::Api {
            status: 401,
            message: "HTTP 401: expired".into(),
        });
        assert!(unauthorized.is_unauthorized());

        let missing = CoreError::from(vigil_api::Error::Api {
            status: 404,
            message: "HTTP 404: no zone".into(),
        });
        assert!(matches!(missing, CoreError::NotFound { .. }));

        let server = CoreError::from(vigil_api::Error::Api {
            status: 503,
            message: "HTTP 503: maintenance".into(),
        });
        assert_eq!(server.to_string(), "HTTP 503: maintenance");
    }

    #[test]
    fn socket_errors_are_connection_failures() {
        let err = CoreError::from(vigil_api::Error::SocketConnect("refused".into()));
        assert!(matches!(err, CoreError::ConnectionFailed { .. }));
        assert!(err.to_string().contains("refused"));
    }
}
