// Wire types for the REST endpoints.
//
// Fields the client reads are typed; everything else the backend sends is
// kept in `extra` so nothing is silently dropped on a read-modify-write.
// Identifiers arrive as strings or numbers, and as `id` or `_id`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

// ── Envelope ────────────────────────────────────────────────────────

/// Response body, either bare or wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn opt_id_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

// ── Zones ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sensors: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_ids: Option<Vec<String>>,
}

// ── Sensors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub sensor_type: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub notification_enabled: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}

// ── Cameras ─────────────────────────────────────────────────────────

/// Discriminator for `POST /device/command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    GetCameras,
    AddCamera,
    UpdateCamera,
    DeleteCamera,
}

/// Body of `POST /device/command`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCommand {
    pub command_type: CommandType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<CameraRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}

// ── Alerts ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub device_id: Option<String>,
    #[serde(rename = "type", default)]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Modes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "isActive")]
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn zone_accepts_numeric_underscore_id() {
        let zone: Zone = serde_json::from_value(json!({
            "_id": 17,
            "name": "Warehouse",
            "floor": 2
        }))
        .unwrap();
        assert_eq!(zone.id, "17");
        assert_eq!(zone.extra["floor"], 2);
    }

    #[test]
    fn envelope_unwraps_data_or_bare() {
        let wrapped: Envelope<Vec<Mode>> = serde_json::from_value(json!({
            "data": [{ "id": "m1", "name": "Away", "isActive": true }]
        }))
        .unwrap();
        let modes = wrapped.into_inner();
        assert!(modes[0].active);

        let bare: Envelope<Vec<Mode>> =
            serde_json::from_value(json!([{ "id": "m2", "name": "Home" }])).unwrap();
        assert!(!bare.into_inner()[0].active);
    }

    #[test]
    fn device_command_serializes_discriminator() {
        let cmd = DeviceCommand {
            command_type: CommandType::DeleteCamera,
            device_id: Some("cam-9".into()),
            payload: None,
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({ "commandType": "DELETE_CAMERA", "deviceId": "cam-9" })
        );
        assert_eq!(CommandType::AddCamera.to_string(), "ADD_CAMERA");
    }

    #[test]
    fn zone_request_skips_unset_fields() {
        let req = ZoneRequest {
            name: Some("Lobby".into()),
            ..ZoneRequest::default()
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({ "name": "Lobby" }));
    }
}
