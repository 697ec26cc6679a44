// Sensor endpoints under `device-zone/sensors`.

use serde_json::json;

use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::{Sensor, SensorUpdate};

impl ApiClient {
    pub async fn list_sensors(&self) -> Result<Vec<Sensor>, Error> {
        self.get("device-zone/sensors").await
    }

    pub async fn get_sensor(&self, id: &str) -> Result<Sensor, Error> {
        self.get(&format!("device-zone/sensors/{id}")).await
    }

    pub async fn update_sensor(&self, id: &str, body: &SensorUpdate) -> Result<Sensor, Error> {
        self.put(&format!("device-zone/sensors/{id}"), body).await
    }

    pub async fn delete_sensor(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("device-zone/sensors/{id}")).await
    }

    /// Toggle push notifications for a single sensor.
    pub async fn set_sensor_notification(&self, id: &str, enabled: bool) -> Result<Sensor, Error> {
        self.put(
            &format!("device-zone/sensors/{id}/notification"),
            &json!({ "enabled": enabled }),
        )
        .await
    }
}
