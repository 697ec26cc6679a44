// ── Domain types ──
//
// REST resources are used as the backend sends them; readings are the
// one derived view the core computes itself.

mod reading;

pub use reading::Reading;

pub use vigil_api::SocketEvent as TopicMessage;
pub use vigil_api::rest::models::{
    Alert, Camera, CameraRequest, Mode, ModeRequest, Sensor, SensorUpdate, Zone, ZoneRequest,
};
