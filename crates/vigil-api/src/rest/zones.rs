// Zone endpoints under `device-zone/zones`.

use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::{Zone, ZoneRequest};

impl ApiClient {
    pub async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        self.get("device-zone/zones").await
    }

    pub async fn get_zone(&self, id: &str) -> Result<Zone, Error> {
        self.get(&format!("device-zone/zones/{id}")).await
    }

    pub async fn create_zone(&self, body: &ZoneRequest) -> Result<Zone, Error> {
        self.post("device-zone/zones", body).await
    }

    pub async fn update_zone(&self, id: &str, body: &ZoneRequest) -> Result<Zone, Error> {
        self.put(&format!("device-zone/zones/{id}"), body).await
    }

    pub async fn delete_zone(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("device-zone/zones/{id}")).await
    }
}
