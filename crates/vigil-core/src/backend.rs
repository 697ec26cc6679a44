// ── REST backend ──
//
// Read accessors and command routing over `vigil_api::ApiClient`.
// Every call resolves to a `CoreError` so consumers never handle
// transport errors directly.

use tracing::debug;
use vigil_api::ApiClient;

use crate::command::{Command, CommandResult};
use crate::config::BackendConfig;
use crate::error::CoreError;
use crate::model::{Alert, Camera, Mode, Sensor, Zone};
use crate::token::{TokenSource, require_token};

/// Authenticated handle to the REST API.
pub struct Backend {
    client: ApiClient,
}

impl Backend {
    /// Resolve a token and build a client for `config.api_url`.
    ///
    /// Fails with [`CoreError::Unauthorized`] when no token is available.
    pub async fn connect(
        config: &BackendConfig,
        tokens: &dyn TokenSource,
    ) -> Result<Self, CoreError> {
        let token = require_token(tokens).await?;
        let client = ApiClient::new(config.api_url.clone(), &token, &config.transport())?;
        Ok(Self { client })
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn api(&self) -> &ApiClient {
        &self.client
    }

    // ── Reads ────────────────────────────────────────────────────

    pub async fn zones(&self) -> Result<Vec<Zone>, CoreError> {
        Ok(self.client.list_zones().await?)
    }

    pub async fn zone(&self, id: &str) -> Result<Zone, CoreError> {
        Ok(self.client.get_zone(id).await?)
    }

    pub async fn sensors(&self) -> Result<Vec<Sensor>, CoreError> {
        Ok(self.client.list_sensors().await?)
    }

    pub async fn sensor(&self, id: &str) -> Result<Sensor, CoreError> {
        Ok(self.client.get_sensor(id).await?)
    }

    pub async fn cameras(&self) -> Result<Vec<Camera>, CoreError> {
        Ok(self.client.list_cameras().await?)
    }

    pub async fn device_alerts(&self, device_id: &str) -> Result<Vec<Alert>, CoreError> {
        Ok(self.client.list_device_alerts(device_id).await?)
    }

    pub async fn modes(&self) -> Result<Vec<Mode>, CoreError> {
        Ok(self.client.list_modes().await?)
    }

    // ── Command execution ────────────────────────────────────────

    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        debug!(command = %cmd.describe(), "executing");
        route_command(&self.client, cmd).await
    }
}

/// Route a command to its REST endpoint.
async fn route_command(client: &ApiClient, cmd: Command) -> Result<CommandResult, CoreError> {
    match cmd {
        // ── Zones ────────────────────────────────────────────────
        Command::CreateZone(req) => Ok(CommandResult::Zone(client.create_zone(&req).await?)),
        Command::UpdateZone { id, update } => {
            Ok(CommandResult::Zone(client.update_zone(&id, &update).await?))
        }
        Command::DeleteZone { id } => {
            client.delete_zone(&id).await?;
            Ok(CommandResult::Ok)
        }

        // ── Sensors ──────────────────────────────────────────────
        Command::UpdateSensor { id, update } => {
            Ok(CommandResult::Sensor(client.update_sensor(&id, &update).await?))
        }
        Command::DeleteSensor { id } => {
            client.delete_sensor(&id).await?;
            Ok(CommandResult::Ok)
        }
        Command::SetSensorNotification { id, enabled } => Ok(CommandResult::Sensor(
            client.set_sensor_notification(&id, enabled).await?,
        )),

        // ── Cameras ──────────────────────────────────────────────
        Command::AddCamera(req) => Ok(CommandResult::Response(client.add_camera(req).await?)),
        Command::UpdateCamera { id, update } => Ok(CommandResult::Response(
            client.update_camera(&id, update).await?,
        )),
        Command::DeleteCamera { id } => {
            Ok(CommandResult::Response(client.delete_camera(&id).await?))
        }

        // ── Modes ────────────────────────────────────────────────
        Command::CreateMode(req) => Ok(CommandResult::Mode(client.create_mode(&req).await?)),
        Command::UpdateMode { id, update } => {
            Ok(CommandResult::Mode(client.update_mode(&id, &update).await?))
        }
        Command::DeleteMode { id } => {
            client.delete_mode(&id).await?;
            Ok(CommandResult::Ok)
        }
        Command::ActivateMode { id } => {
            client.activate_mode(&id).await?;
            Ok(CommandResult::Ok)
        }
    }
}
