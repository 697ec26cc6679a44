// REST client modules
//
// Hand-written client for the backend's device, zone, sensor, alert, and
// mode endpoints. Every request carries `Authorization: Bearer <token>`;
// every non-2xx response becomes `Error::Api` with the status attached.

pub mod alerts;
pub mod cameras;
pub mod client;
pub mod models;
pub mod modes;
pub mod sensors;
pub mod zones;

pub use client::ApiClient;
