//! Zone command handlers.

use tabled::Tabled;
use vigil_core::model::{Zone, ZoneRequest};
use vigil_core::{Backend, Command as CoreCommand, CommandResult};

use crate::cli::{GlobalOpts, ZonesArgs, ZonesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Sensors")]
    sensors: usize,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Zone> for ZoneRow {
    fn from(z: &Zone) -> Self {
        Self {
            id: z.id.clone(),
            name: z.name.clone(),
            sensors: z.sensors.len(),
            description: util::or_dash(z.description.as_deref()),
        }
    }
}

fn detail(z: &Zone) -> String {
    [
        format!("ID:          {}", z.id),
        format!("Name:        {}", z.name),
        format!("Description: {}", util::or_dash(z.description.as_deref())),
        format!("Sensors:     {}", z.sensors.len()),
    ]
    .join("\n")
}

fn render_zone(global: &GlobalOpts, result: CommandResult) {
    if let CommandResult::Zone(zone) = result {
        let out = output::render_single(&global.output, &zone, detail, |z| z.id.clone());
        output::print_output(&out, global.quiet);
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    backend: &Backend,
    args: ZonesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ZonesCommand::List => {
            let zones = backend.zones().await?;
            let out = output::render_list(&global.output, &zones, |z| ZoneRow::from(z), |z| z.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ZonesCommand::Get { id } => {
            let zone = backend
                .zone(&id)
                .await
                .map_err(|e| CliError::from(e).for_resource("zone", "zones list"))?;
            let out = output::render_single(&global.output, &zone, detail, |z| z.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ZonesCommand::Create {
            from_file,
            name,
            description,
            sensors,
        } => {
            let req = match from_file {
                Some(ref path) => util::read_json_file(path)?,
                None => ZoneRequest {
                    name,
                    description,
                    sensor_ids: sensors,
                },
            };
            let result = backend.execute(CoreCommand::CreateZone(req)).await?;
            render_zone(global, result);
            Ok(())
        }

        ZonesCommand::Update {
            id,
            from_file,
            name,
            description,
            sensors,
        } => {
            let update: ZoneRequest = match from_file {
                Some(ref path) => util::read_json_file(path)?,
                None => ZoneRequest {
                    name,
                    description,
                    sensor_ids: sensors,
                },
            };
            let result = backend
                .execute(CoreCommand::UpdateZone { id, update })
                .await
                .map_err(|e| CliError::from(e).for_resource("zone", "zones list"))?;
            render_zone(global, result);
            Ok(())
        }

        ZonesCommand::Delete { id } => {
            if !util::confirm(&format!("Delete zone {id}?"), global.yes)? {
                return Ok(());
            }
            backend
                .execute(CoreCommand::DeleteZone { id })
                .await
                .map_err(|e| CliError::from(e).for_resource("zone", "zones list"))?;
            util::status("Zone deleted", global.quiet);
            Ok(())
        }
    }
}
