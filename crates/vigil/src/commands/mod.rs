//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod alerts;
pub mod auth;
pub mod cameras;
pub mod config_cmd;
pub mod emit;
pub mod modes;
pub mod sensors;
pub mod util;
pub mod watch;
pub mod zones;

use vigil_core::{Backend, RealtimeClient};

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    resolved: Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => {
            let client = RealtimeClient::with_websocket(resolved.backend, resolved.tokens);
            watch::handle(&client, args, global).await
        }
        Command::Emit(args) => {
            let client = RealtimeClient::with_websocket(resolved.backend, resolved.tokens);
            emit::handle(&client, args, global).await
        }
        rest => {
            let backend = Backend::connect(&resolved.backend, resolved.tokens.as_ref()).await?;
            match rest {
                Command::Zones(args) => zones::handle(&backend, args, global).await,
                Command::Sensors(args) => sensors::handle(&backend, args, global).await,
                Command::Cameras(args) => cameras::handle(&backend, args, global).await,
                Command::Alerts(args) => alerts::handle(&backend, args, global).await,
                Command::Modes(args) => modes::handle(&backend, args, global).await,
                // Local and realtime commands are handled above
                Command::Watch(_)
                | Command::Emit(_)
                | Command::Auth(_)
                | Command::Config(_)
                | Command::Completions(_) => Err(CliError::Internal(
                    "command routed to the REST dispatcher".into(),
                )),
            }
        }
    }
}
