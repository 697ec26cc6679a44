// ── Bearer token sources ──
//
// The realtime client and REST backend never read credentials from disk
// themselves. A `TokenSource` is asked for the current token at connect
// time, so a re-login between connects is picked up without rebuilding
// the client.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::CoreError;

/// Supplies the bearer token from persisted auth state.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The current token, or `None` when the user is logged out.
    async fn token(&self) -> Result<Option<SecretString>, CoreError>;
}

/// A token fixed at construction time.
#[derive(Clone, Default)]
pub struct StaticToken(Option<SecretString>);

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self(Some(token))
    }

    /// A source that always reports "logged out".
    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<SecretString>, CoreError> {
        Ok(self.0.clone())
    }
}

/// Resolve a token or fail with [`CoreError::Unauthorized`].
pub(crate) async fn require_token(source: &dyn TokenSource) -> Result<SecretString, CoreError> {
    source.token().await?.ok_or_else(|| CoreError::Unauthorized {
        message: "no auth token found; run `vigil auth login`".into(),
    })
}
