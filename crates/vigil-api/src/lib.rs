// vigil-api: Async Rust client for the Vigil backend (REST + Socket.IO realtime)

pub mod error;
pub mod rest;
pub mod socket;
pub mod transport;

pub use error::Error;
pub use rest::ApiClient;
pub use socket::{Connection, Connector, ReconnectConfig, SocketEvent, WsConnector};
pub use transport::{TlsMode, TransportConfig};
