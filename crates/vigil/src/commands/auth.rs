//! Auth subcommand handlers.
//!
//! Tokens live in local storage (`userData.token`) by default, or in the
//! system keyring with `--keyring`. Neither path talks to the backend.

use std::io::{BufRead, IsTerminal};

use serde::Serialize;
use vigil_config::{LocalStorage, Profile, TokenOrigin};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct AuthStatus {
    profile: String,
    authenticated: bool,
    source: Option<&'static str>,
    storage: String,
    notification_count: u64,
}

fn origin_label(origin: TokenOrigin) -> &'static str {
    match origin {
        TokenOrigin::Env => "environment",
        TokenOrigin::Keyring => "keyring",
        TokenOrigin::Storage => "local storage",
    }
}

fn read_token(from_stdin: bool) -> Result<String, CliError> {
    let token = if from_stdin || !std::io::stdin().is_terminal() {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line
    } else {
        rpassword::prompt_password("Token: ")?
    };
    let token = token.trim().to_owned();
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    let storage = LocalStorage::open_default();

    match args.command {
        AuthCommand::Login { stdin, keyring } => {
            let token = match global.token {
                Some(ref token) => token.clone(),
                None => read_token(stdin)?,
            };

            if keyring {
                vigil_config::store_keyring_token(&profile_name, &token)?;
                util::status(
                    &format!("✓ Token stored in system keyring for profile '{profile_name}'"),
                    global.quiet,
                );
            } else {
                let mut data = storage.user_data()?.unwrap_or_default();
                data.token = Some(token);
                storage.set_user_data(&data)?;
                util::status(
                    &format!("✓ Token saved to {}", storage.path().display()),
                    global.quiet,
                );
            }
            Ok(())
        }

        AuthCommand::Logout => {
            if let Err(e) = vigil_config::delete_keyring_token(&profile_name) {
                tracing::warn!(error = %e, "could not clear keyring entry");
            }
            storage.clear()?;
            util::status("✓ Logged out", global.quiet);
            Ok(())
        }

        AuthCommand::Status => {
            let fallback = Profile::default();
            let profile = cfg.profiles.get(&profile_name).unwrap_or(&fallback);

            let source = if global.token.is_some() {
                Some("--token")
            } else {
                vigil_config::resolve_token(profile, &profile_name, &storage)?
                    .map(|(_, origin)| origin_label(origin))
            };

            let status = AuthStatus {
                profile: profile_name,
                authenticated: source.is_some(),
                source,
                storage: storage.path().display().to_string(),
                notification_count: storage.notification_count()?,
            };

            let out = output::render_single(
                &global.output,
                &status,
                |s| {
                    [
                        format!("Profile:       {}", s.profile),
                        format!(
                            "Token:         {}",
                            s.source.map_or_else(|| "none".into(), |src| format!("from {src}"))
                        ),
                        format!("Storage:       {}", s.storage),
                        format!("Notifications: {}", s.notification_count),
                    ]
                    .join("\n")
                },
                |s| s.authenticated.to_string(),
            );
            output::print_output(&out, global.quiet);

            if status.authenticated {
                Ok(())
            } else {
                Err(CliError::AuthFailed {
                    message: "no token configured".into(),
                })
            }
        }
    }
}
