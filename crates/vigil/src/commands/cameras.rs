//! Camera command handlers.
//!
//! Camera writes go through the backend's `device/command` endpoint,
//! which answers with an untyped body; it is printed as-is.

use tabled::Tabled;
use vigil_core::model::{Camera, CameraRequest};
use vigil_core::{Backend, Command as CoreCommand, CommandResult};

use crate::cli::{CameraFields, CamerasArgs, CamerasCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CameraRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Camera> for CameraRow {
    fn from(c: &Camera) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            location: util::or_dash(c.location.as_deref()),
            zone: util::or_dash(c.zone_id.as_deref()),
            status: util::or_dash(c.status.as_deref()),
        }
    }
}

impl From<CameraFields> for CameraRequest {
    fn from(f: CameraFields) -> Self {
        Self {
            name: f.name,
            stream_url: f.stream_url,
            location: f.location,
            zone_id: f.zone,
        }
    }
}

fn print_response(global: &GlobalOpts, result: &CommandResult, done: &str) {
    match result {
        CommandResult::Response(body) if !body.is_null() => {
            let out = output::render_single(
                &global.output,
                body,
                |v| serde_json::to_string_pretty(v).unwrap_or_default(),
                |_| done.to_owned(),
            );
            output::print_output(&out, global.quiet);
        }
        _ => util::status(done, global.quiet),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    backend: &Backend,
    args: CamerasArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CamerasCommand::List => {
            let cameras = backend.cameras().await?;
            let out =
                output::render_list(&global.output, &cameras, |c| CameraRow::from(c), |c| c.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CamerasCommand::Add { fields } => {
            if fields.name.is_none() {
                return Err(CliError::Validation {
                    field: "name".into(),
                    reason: "a new camera needs --name".into(),
                });
            }
            let result = backend.execute(CoreCommand::AddCamera(fields.into())).await?;
            print_response(global, &result, "Camera added");
            Ok(())
        }

        CamerasCommand::Update { id, fields } => {
            let result = backend
                .execute(CoreCommand::UpdateCamera {
                    id,
                    update: fields.into(),
                })
                .await
                .map_err(|e| CliError::from(e).for_resource("camera", "cameras list"))?;
            print_response(global, &result, "Camera updated");
            Ok(())
        }

        CamerasCommand::Delete { id } => {
            if !util::confirm(&format!("Delete camera {id}?"), global.yes)? {
                return Ok(());
            }
            let result = backend
                .execute(CoreCommand::DeleteCamera { id })
                .await
                .map_err(|e| CliError::from(e).for_resource("camera", "cameras list"))?;
            print_response(global, &result, "Camera deleted");
            Ok(())
        }
    }
}
