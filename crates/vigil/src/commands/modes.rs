//! Security mode command handlers.

use tabled::Tabled;
use vigil_core::model::{Mode, ModeRequest};
use vigil_core::{Backend, Command as CoreCommand, CommandResult};

use crate::cli::{GlobalOpts, ModesArgs, ModesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ModeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn row(m: &Mode, color: bool) -> ModeRow {
    ModeRow {
        id: m.id.clone(),
        name: m.name.clone(),
        active: output::paint_flag(m.active, color),
        description: util::or_dash(m.description.as_deref()),
    }
}

fn detail(m: &Mode) -> String {
    [
        format!("ID:          {}", m.id),
        format!("Name:        {}", m.name),
        format!("Active:      {}", if m.active { "yes" } else { "no" }),
        format!("Description: {}", util::or_dash(m.description.as_deref())),
    ]
    .join("\n")
}

fn not_found(e: vigil_core::CoreError) -> CliError {
    CliError::from(e).for_resource("mode", "modes list")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    backend: &Backend,
    args: ModesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = match args.command {
        ModesCommand::List => {
            let color = output::should_color(&global.color);
            let modes = backend.modes().await?;
            let out =
                output::render_list(&global.output, &modes, |m| row(m, color), |m| m.id.clone());
            output::print_output(&out, global.quiet);
            return Ok(());
        }

        ModesCommand::Create {
            name,
            description,
            settings,
        } => {
            let req = ModeRequest {
                name: Some(name),
                description,
                settings: settings.as_deref().map(util::read_json_file).transpose()?,
            };
            backend.execute(CoreCommand::CreateMode(req)).await?
        }

        ModesCommand::Update {
            id,
            name,
            description,
            settings,
        } => {
            let update = ModeRequest {
                name,
                description,
                settings: settings.as_deref().map(util::read_json_file).transpose()?,
            };
            backend
                .execute(CoreCommand::UpdateMode { id, update })
                .await
                .map_err(not_found)?
        }

        ModesCommand::Delete { id } => {
            if !util::confirm(&format!("Delete mode {id}?"), global.yes)? {
                return Ok(());
            }
            backend
                .execute(CoreCommand::DeleteMode { id })
                .await
                .map_err(not_found)?;
            util::status("Mode deleted", global.quiet);
            return Ok(());
        }

        ModesCommand::Activate { id } => {
            backend
                .execute(CoreCommand::ActivateMode { id: id.clone() })
                .await
                .map_err(not_found)?;
            util::status(&format!("Mode {id} activated"), global.quiet);
            return Ok(());
        }
    };

    if let CommandResult::Mode(mode) = result {
        let out = output::render_single(&global.output, &mode, detail, |m| m.id.clone());
        output::print_output(&out, global.quiet);
    }
    Ok(())
}
