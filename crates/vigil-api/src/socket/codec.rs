//! Engine.IO v4 / Socket.IO v5 text packet codec.
//!
//! Every WebSocket text frame is one Engine.IO packet: a single type digit
//! followed by its data. Message packets (`4`) carry a Socket.IO packet,
//! again led by a type digit, an optional `/namespace,` segment, an optional
//! numeric ack id, and a JSON body. Binary attachments are not supported.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

// ── Engine.IO ────────────────────────────────────────────────────────

/// Parameters the server announces in the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

/// One Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, Error> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty engine.io frame".into()))?;
        let data = chars.as_str();

        match kind {
            '0' => serde_json::from_str(data)
                .map(Self::Open)
                .map_err(|e| Error::Protocol(format!("invalid open packet: {e}"))),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(data.to_owned())),
            '3' => Ok(Self::Pong(data.to_owned())),
            '4' => Ok(Self::Message(data.to_owned())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(Error::Protocol(format!(
                "unknown engine.io packet type '{other}'"
            ))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            // Clients never send an open packet; encode the type digit only.
            Self::Open(_) => "0".into(),
            Self::Close => "1".into(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(data) => format!("4{data}"),
            Self::Upgrade => "5".into(),
            Self::Noop => "6".into(),
        }
    }
}

// ── Socket.IO ────────────────────────────────────────────────────────

/// One Socket.IO packet, carried inside an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Value,
    },
}

const DEFAULT_NAMESPACE: &str = "/";

impl SocketPacket {
    /// Build an event packet on the default namespace.
    pub fn event(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Event {
            namespace: DEFAULT_NAMESPACE.into(),
            ack_id: None,
            name: name.into(),
            args,
        }
    }

    /// Build a connect packet on the default namespace.
    pub fn connect(data: Option<Value>) -> Self {
        Self::Connect {
            namespace: DEFAULT_NAMESPACE.into(),
            data,
        }
    }

    pub fn decode(body: &str) -> Result<Self, Error> {
        let mut chars = body.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty socket.io packet".into()))?;
        let rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(Error::Protocol(
                "binary socket.io packets are not supported".into(),
            ));
        }

        let (namespace, rest) = split_namespace(rest);
        let (ack_id, json) = split_ack_id(rest)?;
        let data = if json.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(json)
                    .map_err(|e| Error::Protocol(format!("invalid packet body: {e}")))?,
            )
        };

        match kind {
            '0' => Ok(Self::Connect { namespace, data }),
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => {
                let Some(Value::Array(mut items)) = data else {
                    return Err(Error::Protocol("event body must be an array".into()));
                };
                if items.is_empty() {
                    return Err(Error::Protocol("event body is empty".into()));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(Error::Protocol("event name must be a string".into()));
                };
                Ok(Self::Event {
                    namespace,
                    ack_id,
                    name,
                    args: items,
                })
            }
            '3' => {
                let ack_id =
                    ack_id.ok_or_else(|| Error::Protocol("ack without id".into()))?;
                let args = match data {
                    Some(Value::Array(items)) => items,
                    Some(other) => vec![other],
                    None => Vec::new(),
                };
                Ok(Self::Ack {
                    namespace,
                    ack_id,
                    args,
                })
            }
            '4' => Ok(Self::ConnectError {
                namespace,
                data: data.unwrap_or(Value::Null),
            }),
            other => Err(Error::Protocol(format!(
                "unknown socket.io packet type '{other}'"
            ))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Connect { namespace, data } => {
                let body = data.as_ref().map(Value::to_string).unwrap_or_default();
                format!("0{}{body}", namespace_prefix(namespace))
            }
            Self::Disconnect { namespace } => format!("1{}", namespace_prefix(namespace)),
            Self::Event {
                namespace,
                ack_id,
                name,
                args,
            } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                let ack = ack_id.map(|id| id.to_string()).unwrap_or_default();
                format!(
                    "2{}{ack}{}",
                    namespace_prefix(namespace),
                    Value::Array(items)
                )
            }
            Self::Ack {
                namespace,
                ack_id,
                args,
            } => format!(
                "3{}{ack_id}{}",
                namespace_prefix(namespace),
                Value::Array(args.clone())
            ),
            Self::ConnectError { namespace, data } => {
                format!("4{}{data}", namespace_prefix(namespace))
            }
        }
    }

    /// Wrap this packet in an Engine.IO message frame.
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

/// Human-readable reason carried by a `connect_error` packet.
pub fn connect_error_message(data: &Value) -> String {
    data.get("message")
        .and_then(Value::as_str)
        .map_or_else(|| data.to_string(), str::to_owned)
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE {
        String::new()
    } else {
        format!("{namespace},")
    }
}

fn split_namespace(rest: &str) -> (String, &str) {
    if rest.starts_with('/') {
        match rest.split_once(',') {
            Some((ns, tail)) => (ns.to_owned(), tail),
            None => (rest.to_owned(), ""),
        }
    } else {
        (DEFAULT_NAMESPACE.to_owned(), rest)
    }
}

fn split_ack_id(rest: &str) -> Result<(Option<u64>, &str), Error> {
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Ok((None, rest));
    }
    let (id, tail) = rest.split_at(digits);
    let id = id
        .parse()
        .map_err(|e| Error::Protocol(format!("invalid ack id: {e}")))?;
    Ok((Some(id), tail))
}
