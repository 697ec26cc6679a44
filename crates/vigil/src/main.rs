mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = u8::try_from(err.exit_code()).unwrap_or(1);
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

/// Log to stderr so `watch -o json` output stays machine-readable.
/// `RUST_LOG` wins over `-v`; `--quiet` keeps only errors.
fn init_tracing(global: &GlobalOpts) {
    let level = match (global.quiet, global.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "vigil=info,vigil_core=info,vigil_api=info",
        (false, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(global.verbose > 1)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let global = cli.global;
    match cli.command {
        // ── Local: config file, stored login, completions ──
        Command::Config(args) => commands::config_cmd::handle(args, &global),
        Command::Auth(args) => commands::auth::handle(args, &global),
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "vigil", &mut std::io::stdout());
            Ok(())
        }

        // ── Backend-bound: REST or socket ──
        cmd => {
            let resolved = config::resolve(&global)?;
            tracing::debug!(
                profile = %resolved.profile_name,
                api = %resolved.backend.api_url,
                socket = %resolved.backend.socket_url,
                "resolved backend"
            );
            commands::dispatch(cmd, resolved, &global).await
        }
    }
}
