//! Config subcommand handlers.

use dialoguer::{Confirm, Input};
use serde::Serialize;

use vigil_config::{Profile, storage};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

#[derive(Serialize)]
struct Paths {
    config: String,
    storage: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("Vigil CLI configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. REST API URL
            let api_url: String = Input::new()
                .with_prompt("REST API URL")
                .default("http://localhost:3000/api".into())
                .interact_text()
                .map_err(prompt_err)?;
            let parsed: url::Url = api_url.parse().map_err(|_| CliError::Validation {
                field: "api_url".into(),
                reason: format!("invalid URL: {api_url}"),
            })?;

            // 3. Socket URL, defaulting to the API origin
            let socket_url: String = Input::new()
                .with_prompt("Socket URL")
                .default(parsed.origin().ascii_serialization())
                .interact_text()
                .map_err(prompt_err)?;

            // 4. TLS
            let insecure = Confirm::new()
                .with_prompt("Accept self-signed certificates?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;

            // 5. Build profile and config
            let profile = Profile {
                api_url,
                socket_url: (socket_url != parsed.origin().ascii_serialization())
                    .then_some(socket_url),
                insecure: insecure.then_some(true),
                ..Profile::default()
            };

            let mut cfg = config::load_config_or_default();
            if cfg.profiles.contains_key(&profile_name)
                && !util::confirm(&format!("Overwrite profile '{profile_name}'?"), global.yes)?
            {
                return Ok(());
            }
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            // 6. Write config
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Next: vigil auth login");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|_| format!("{c:#?}")),
                |c| {
                    c.default_profile
                        .clone()
                        .unwrap_or_else(|| "default".into())
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            let paths = Paths {
                config: config::config_path().display().to_string(),
                storage: storage::storage_path().display().to_string(),
            };
            let out = output::render_single(
                &global.output,
                &paths,
                |p| format!("config:  {}\nstorage: {}", p.config, p.storage),
                |p| p.config.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: vigil config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}
