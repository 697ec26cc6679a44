use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::Alert;

impl ApiClient {
    /// Alert history for one device, newest first as the backend orders it.
    pub async fn list_device_alerts(&self, device_id: &str) -> Result<Vec<Alert>, Error> {
        self.get(&format!("alert/device/{device_id}")).await
    }
}
