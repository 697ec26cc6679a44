//! Shared configuration for the Vigil CLI.
//!
//! TOML profiles, persisted session storage, token resolution
//! (env + keyring + stored login), and translation to
//! `vigil_core::BackendConfig`. The CLI layers `GlobalOpts` overrides on top.

pub mod storage;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use vigil_core::{BackendConfig, CoreError, ReconnectConfig, TlsVerification, TokenSource};

pub use storage::{LocalStorage, UserData};

/// Keyring service name for stored tokens.
pub const KEYRING_SERVICE: &str = "vigil";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("storage is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Store poll interval for `watch`, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval_ms() -> u64 {
    1000
}

/// A named backend profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// REST API root (e.g., "https://vigil.local/api").
    pub api_url: String,

    /// Socket server origin. Derived from `api_url` when unset.
    pub socket_url: Option<String>,

    /// Socket.IO path override.
    pub socket_path: Option<String>,

    /// Environment variable name containing the bearer token.
    pub token_env: Option<String>,

    /// Topics stored as append logs instead of merged state.
    pub append_topics: Option<Vec<String>>,

    /// Entries kept per append topic.
    pub append_retention: Option<usize>,

    /// Reconnect attempts before giving up.
    pub reconnect_attempts: Option<u32>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override store poll interval (ms).
    pub poll_interval_ms: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "vigil", "vigil").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vigil");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("VIGIL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Store a token in the system keyring for `profile_name`.
pub fn store_keyring_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?
        .set_password(token)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Remove a keyring token. Missing entries are not an error.
pub fn delete_keyring_token(profile_name: &str) -> Result<(), ConfigError> {
    match keyring_entry(profile_name)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(ConfigError::Keyring(e.to_string())),
    }
}

fn keyring_token(profile_name: &str) -> Option<String> {
    let entry = keyring_entry(profile_name).ok()?;
    entry.get_password().ok().filter(|t| !t.is_empty())
}

// ── Token resolution ────────────────────────────────────────────────

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Env,
    Keyring,
    Storage,
}

/// Resolve a token from the chain: `token_env` var, keyring, stored login.
pub fn resolve_token(
    profile: &Profile,
    profile_name: &str,
    storage: &LocalStorage,
) -> Result<Option<(SecretString, TokenOrigin)>, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Ok(Some((SecretString::from(val), TokenOrigin::Env)));
            }
        }
    }

    // 2. System keyring
    if let Some(secret) = keyring_token(profile_name) {
        return Ok(Some((SecretString::from(secret), TokenOrigin::Keyring)));
    }

    // 3. Persisted login session
    Ok(storage
        .token()?
        .map(|t| (SecretString::from(t), TokenOrigin::Storage)))
}

/// `TokenSource` backed by a profile's resolution chain.
///
/// Re-resolves on every call so a fresh `vigil auth login` is picked up
/// by the next reconnect.
#[derive(Debug)]
pub struct ProfileTokenSource {
    profile_name: String,
    token_env: Option<String>,
    storage: LocalStorage,
}

impl ProfileTokenSource {
    pub fn new(profile: &Profile, profile_name: &str, storage: LocalStorage) -> Self {
        Self {
            profile_name: profile_name.into(),
            token_env: profile.token_env.clone(),
            storage,
        }
    }
}

#[async_trait]
impl TokenSource for ProfileTokenSource {
    async fn token(&self) -> Result<Option<SecretString>, CoreError> {
        let profile = Profile {
            token_env: self.token_env.clone(),
            ..Profile::default()
        };
        let resolved = resolve_token(&profile, &self.profile_name, &self.storage)
            .map_err(|e| CoreError::Config {
                message: e.to_string(),
            })?;
        if let Some((_, origin)) = &resolved {
            tracing::trace!(?origin, profile = %self.profile_name, "resolved token");
        }
        Ok(resolved.map(|(secret, _)| secret))
    }
}

// ── Profile → BackendConfig ─────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Origin (`scheme://host[:port]`) of `url`.
fn origin_of(url: &Url) -> Result<Url, ConfigError> {
    let origin = url.origin().ascii_serialization();
    parse_url("api_url", &origin)
}

/// Build a `BackendConfig` from a profile and global defaults.
pub fn profile_to_backend_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<BackendConfig, ConfigError> {
    let api_url = parse_url("api_url", &profile.api_url)?;
    let socket_url = match profile.socket_url {
        Some(ref raw) => parse_url("socket_url", raw)?,
        None => origin_of(&api_url)?,
    };

    let mut config = BackendConfig::new(api_url, socket_url);

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.poll_interval =
        Duration::from_millis(profile.poll_interval_ms.unwrap_or(defaults.poll_interval_ms));

    if let Some(ref path) = profile.socket_path {
        config.socket_path.clone_from(path);
    }
    if let Some(ref topics) = profile.append_topics {
        config.append_topics.clone_from(topics);
    }
    if let Some(retention) = profile.append_retention {
        if retention == 0 {
            return Err(ConfigError::Validation {
                field: "append_retention".into(),
                reason: "must be at least 1".into(),
            });
        }
        config.append_retention = retention;
    }
    if let Some(attempts) = profile.reconnect_attempts {
        config.reconnect = ReconnectConfig {
            max_retries: Some(attempts),
            ..ReconnectConfig::default()
        };
    }

    Ok(config)
}
