// Security mode endpoints under `device-mode/modes`.

use serde_json::json;

use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::{Mode, ModeRequest};

impl ApiClient {
    pub async fn list_modes(&self) -> Result<Vec<Mode>, Error> {
        self.get("device-mode/modes").await
    }

    pub async fn create_mode(&self, body: &ModeRequest) -> Result<Mode, Error> {
        self.post("device-mode/modes", body).await
    }

    pub async fn update_mode(&self, id: &str, body: &ModeRequest) -> Result<Mode, Error> {
        self.put(&format!("device-mode/modes/{id}"), body).await
    }

    pub async fn delete_mode(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("device-mode/modes/{id}")).await
    }

    /// Make `id` the active mode. The response body is not used.
    pub async fn activate_mode(&self, id: &str) -> Result<(), Error> {
        self.post_empty(&format!("device-mode/modes/{id}/activate"), &json!({}))
            .await
    }
}
