// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// backend routes each variant to its REST endpoint.

use serde_json::Value;

use crate::model::{
    CameraRequest, Mode, ModeRequest, Sensor, SensorUpdate, Zone, ZoneRequest,
};

/// All write operations against the backend.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Zones ────────────────────────────────────────────────────────
    CreateZone(ZoneRequest),
    UpdateZone { id: String, update: ZoneRequest },
    DeleteZone { id: String },

    // ── Sensors ──────────────────────────────────────────────────────
    UpdateSensor { id: String, update: SensorUpdate },
    DeleteSensor { id: String },
    SetSensorNotification { id: String, enabled: bool },

    // ── Cameras ──────────────────────────────────────────────────────
    AddCamera(CameraRequest),
    UpdateCamera { id: String, update: CameraRequest },
    DeleteCamera { id: String },

    // ── Modes ────────────────────────────────────────────────────────
    CreateMode(ModeRequest),
    UpdateMode { id: String, update: ModeRequest },
    DeleteMode { id: String },
    ActivateMode { id: String },
}

impl Command {
    /// Short label for logs and confirmations.
    pub fn describe(&self) -> String {
        match self {
            Self::CreateZone(req) => format!(
                "create zone '{}'",
                req.name.as_deref().unwrap_or("<unnamed>")
            ),
            Self::UpdateZone { id, .. } => format!("update zone {id}"),
            Self::DeleteZone { id } => format!("delete zone {id}"),
            Self::UpdateSensor { id, .. } => format!("update sensor {id}"),
            Self::DeleteSensor { id } => format!("delete sensor {id}"),
            Self::SetSensorNotification { id, enabled } => format!(
                "{} notifications for sensor {id}",
                if *enabled { "enable" } else { "disable" }
            ),
            Self::AddCamera(req) => format!(
                "add camera '{}'",
                req.name.as_deref().unwrap_or("<unnamed>")
            ),
            Self::UpdateCamera { id, .. } => format!("update camera {id}"),
            Self::DeleteCamera { id } => format!("delete camera {id}"),
            Self::CreateMode(req) => format!(
                "create mode '{}'",
                req.name.as_deref().unwrap_or("<unnamed>")
            ),
            Self::UpdateMode { id, .. } => format!("update mode {id}"),
            Self::DeleteMode { id } => format!("delete mode {id}"),
            Self::ActivateMode { id } => format!("activate mode {id}"),
        }
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    Zone(Zone),
    Sensor(Sensor),
    Mode(Mode),
    /// Untyped body, as returned by `device/command`.
    Response(Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_names_the_target() {
        let cmd = Command::SetSensorNotification {
            id: "s1".into(),
            enabled: false,
        };
        assert_eq!(cmd.describe(), "disable notifications for sensor s1");

        let cmd = Command::CreateZone(ZoneRequest {
            name: Some("Lobby".into()),
            ..ZoneRequest::default()
        });
        assert_eq!(cmd.describe(), "create zone 'Lobby'");
    }
}
