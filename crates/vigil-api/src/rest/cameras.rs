// Camera management
//
// Cameras have no resource routes of their own; every operation is a
// `POST device/command` with a `commandType` discriminator.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::{Camera, CameraRequest, CommandType, DeviceCommand};

impl ApiClient {
    async fn device_command<T: DeserializeOwned>(&self, cmd: &DeviceCommand) -> Result<T, Error> {
        debug!(command = %cmd.command_type, device = ?cmd.device_id, "device command");
        self.post("device/command", cmd).await
    }

    pub async fn list_cameras(&self) -> Result<Vec<Camera>, Error> {
        self.device_command(&DeviceCommand {
            command_type: CommandType::GetCameras,
            device_id: None,
            payload: None,
        })
        .await
    }

    pub async fn add_camera(&self, camera: CameraRequest) -> Result<Value, Error> {
        self.device_command(&DeviceCommand {
            command_type: CommandType::AddCamera,
            device_id: None,
            payload: Some(camera),
        })
        .await
    }

    pub async fn update_camera(&self, id: &str, camera: CameraRequest) -> Result<Value, Error> {
        self.device_command(&DeviceCommand {
            command_type: CommandType::UpdateCamera,
            device_id: Some(id.to_owned()),
            payload: Some(camera),
        })
        .await
    }

    pub async fn delete_camera(&self, id: &str) -> Result<Value, Error> {
        self.device_command(&DeviceCommand {
            command_type: CommandType::DeleteCamera,
            device_id: Some(id.to_owned()),
            payload: None,
        })
        .await
    }
}
