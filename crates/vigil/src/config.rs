//! CLI-side configuration: `GlobalOpts` overrides on top of `vigil-config`.
//!
//! Core never sees these types -- it receives a pre-built `BackendConfig`
//! and a `TokenSource`.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use vigil_config::{Config, Defaults, LocalStorage, Profile, ProfileTokenSource};
use vigil_core::{BackendConfig, StaticToken, TlsVerification, TokenSource};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use vigil_config::{config_path, load_config_or_default, save_config};

/// Everything a backend-bound command needs.
pub struct Resolved {
    pub profile_name: String,
    pub backend: BackendConfig,
    pub tokens: Arc<dyn TokenSource>,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `BackendConfig` and token source from config, profile and flags.
///
/// With no matching profile, `--api-url` alone is enough.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let fallback;
    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile,
        None if global.api_url.is_some() => {
            fallback = Profile::default();
            &fallback
        }
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let backend = backend_config(profile, &cfg.defaults, global)?;

    let tokens: Arc<dyn TokenSource> = match global.token {
        Some(ref token) => Arc::new(StaticToken::new(SecretString::from(token.clone()))),
        None => Arc::new(ProfileTokenSource::new(
            profile,
            &profile_name,
            LocalStorage::open_default(),
        )),
    };

    Ok(Resolved {
        profile_name,
        backend,
        tokens,
    })
}

/// Apply flag overrides (flag > env > profile) and translate.
fn backend_config(
    profile: &Profile,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<BackendConfig, CliError> {
    let merged = Profile {
        api_url: global
            .api_url
            .clone()
            .unwrap_or_else(|| profile.api_url.clone()),
        socket_url: global.socket_url.clone().or_else(|| profile.socket_url.clone()),
        socket_path: profile.socket_path.clone(),
        token_env: profile.token_env.clone(),
        append_topics: profile.append_topics.clone(),
        append_retention: profile.append_retention,
        reconnect_attempts: profile.reconnect_attempts,
        ca_cert: profile.ca_cert.clone(),
        insecure: profile.insecure,
        timeout: profile.timeout,
        poll_interval_ms: profile.poll_interval_ms,
    };

    let mut config = vigil_config::profile_to_backend_config(&merged, defaults)?;

    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    Ok(config)
}

pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}
