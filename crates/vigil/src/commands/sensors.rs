//! Sensor command handlers.

use tabled::Tabled;
use vigil_core::model::{Sensor, SensorUpdate};
use vigil_core::{Backend, Command as CoreCommand, CommandResult};

use crate::cli::{GlobalOpts, SensorsArgs, SensorsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    sensor_type: String,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Notify")]
    notify: String,
}

fn row(s: &Sensor, color: bool) -> SensorRow {
    SensorRow {
        id: s.id.clone(),
        name: s.name.clone(),
        sensor_type: util::or_dash(s.sensor_type.as_deref()),
        zone: util::or_dash(s.zone_id.as_deref()),
        status: util::or_dash(s.status.as_deref()),
        notify: output::paint_flag(s.notification_enabled, color),
    }
}

fn detail(s: &Sensor) -> String {
    [
        format!("ID:            {}", s.id),
        format!("Name:          {}", s.name),
        format!("Type:          {}", util::or_dash(s.sensor_type.as_deref())),
        format!("Zone:          {}", util::or_dash(s.zone_id.as_deref())),
        format!("Status:        {}", util::or_dash(s.status.as_deref())),
        format!(
            "Notifications: {}",
            if s.notification_enabled { "on" } else { "off" }
        ),
    ]
    .join("\n")
}

fn not_found(e: vigil_core::CoreError) -> CliError {
    CliError::from(e).for_resource("sensor", "sensors list")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    backend: &Backend,
    args: SensorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    let result = match args.command {
        SensorsCommand::List => {
            let sensors = backend.sensors().await?;
            let out = output::render_list(
                &global.output,
                &sensors,
                |s| row(s, color),
                |s| s.id.clone(),
            );
            output::print_output(&out, global.quiet);
            return Ok(());
        }

        SensorsCommand::Get { id } => {
            let sensor = backend.sensor(&id).await.map_err(not_found)?;
            CommandResult::Sensor(sensor)
        }

        SensorsCommand::Update { id, name, zone } => {
            if name.is_none() && zone.is_none() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "pass --name and/or --zone".into(),
                });
            }
            let update = SensorUpdate {
                name,
                zone_id: zone,
            };
            backend
                .execute(CoreCommand::UpdateSensor { id, update })
                .await
                .map_err(not_found)?
        }

        SensorsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete sensor {id}?"), global.yes)? {
                return Ok(());
            }
            backend
                .execute(CoreCommand::DeleteSensor { id })
                .await
                .map_err(not_found)?;
            util::status("Sensor deleted", global.quiet);
            return Ok(());
        }

        SensorsCommand::Notify { id, on, off: _ } => backend
            .execute(CoreCommand::SetSensorNotification { id, enabled: on })
            .await
            .map_err(not_found)?,
    };

    if let CommandResult::Sensor(sensor) = result {
        let out = output::render_single(&global.output, &sensor, detail, |s| s.id.clone());
        output::print_output(&out, global.quiet);
    }
    Ok(())
}
