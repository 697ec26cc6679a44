// vigil-core: Realtime topic relay and REST command layer between vigil-api and the CLI.

pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod realtime;
pub mod store;
pub mod stream;
pub mod token;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::Backend;
pub use command::{Command, CommandResult};
pub use config::{BackendConfig, TlsVerification};
pub use error::CoreError;
pub use model::{Reading, TopicMessage};
pub use normalize::{Normalized, Normalizer};
pub use realtime::{Callback, ConnectionState, RealtimeClient, SubscriptionId};
pub use store::{FragmentMap, TopicStore};
pub use stream::TopicStream;
pub use token::{StaticToken, TokenSource};

pub use vigil_api::ReconnectConfig;
