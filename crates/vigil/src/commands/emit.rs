//! `vigil emit`: send one event over the socket.

use std::time::Duration;

use serde_json::Value;
use vigil_core::RealtimeClient;

use crate::cli::{EmitArgs, GlobalOpts};
use crate::error::CliError;

use super::util;

fn payload(args: &EmitArgs) -> Result<Value, CliError> {
    match (&args.payload, &args.from_file) {
        (_, Some(path)) => util::read_json_file(path),
        (Some(raw), None) => Ok(serde_json::from_str(raw)?),
        (None, None) => Ok(Value::Object(serde_json::Map::new())),
    }
}

pub async fn handle(
    client: &RealtimeClient,
    args: EmitArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Validate before opening a socket.
    let payload = payload(&args)?;

    client.connect().await?;
    client.emit(&args.event, payload);

    // Frames are flushed by the socket task; give it a moment before teardown.
    tokio::time::sleep(Duration::from_millis(args.linger)).await;
    client.disconnect().await;

    util::status(&format!("Sent '{}'", args.event), global.quiet);
    Ok(())
}
