// tokio-tungstenite implementation of the socket seam.
//
// Performs the Engine.IO open / Socket.IO connect handshake, answers server
// pings, and surfaces Socket.IO events. Pings double as the liveness check:
// no frame within `ping_interval + ping_timeout` means the link is dead.
//
// `recv` keeps its progress in the connection (liveness deadline, owed
// pong) so dropping it mid-await loses nothing.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::codec::{self, EnginePacket, Handshake, SocketPacket};
use super::{Connection, Connector, SocketEvent, redacted};
use crate::error::Error;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector that opens real WebSocket connections.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Connection>, Error> {
        tracing::info!(url = %redacted(url), "Connecting to socket");

        let uri: tungstenite::http::Uri = url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::SocketConnect(e.to_string()))?;
        let request = ClientRequestBuilder::new(uri)
            .with_header("User-Agent", concat!("vigil/", env!("CARGO_PKG_VERSION")));

        let (ws, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| Error::SocketConnect(e.to_string()))?;

        let connection = EngineIoConnection::handshake(ws).await?;
        tracing::info!(sid = %connection.handshake.sid, "Socket connected");
        Ok(Box::new(connection))
    }
}

/// A handshaken Engine.IO connection on the default Socket.IO namespace.
pub struct EngineIoConnection {
    ws: WsStream,
    handshake: Handshake,
    /// Reset on every inbound frame.
    deadline: Instant,
    /// Ping payload still owed a pong.
    pending_pong: Option<String>,
}

impl EngineIoConnection {
    async fn handshake(mut ws: WsStream) -> Result<Self, Error> {
        let handshake = loop {
            match next_text(&mut ws).await? {
                Some(text) => {
                    if let EnginePacket::Open(handshake) = EnginePacket::decode(&text)? {
                        break handshake;
                    }
                }
                None => return Err(Error::Handshake("closed before open packet".into())),
            }
        };

        ws.send(Message::text(SocketPacket::connect(None).to_frame()))
            .await
            .map_err(|e| Error::Handshake(e.to_string()))?;

        let window = liveness_window(&handshake);
        let mut connection = Self {
            ws,
            handshake,
            deadline: Instant::now() + window,
            pending_pong: None,
        };
        loop {
            let Some(text) = next_text(&mut connection.ws).await? else {
                return Err(Error::Handshake("closed before namespace connect".into()));
            };
            match EnginePacket::decode(&text)? {
                EnginePacket::Ping(data) => connection.pong(data).await?,
                EnginePacket::Message(body) => match SocketPacket::decode(&body)? {
                    SocketPacket::Connect { .. } => {
                        connection.deadline = Instant::now() + window;
                        return Ok(connection);
                    }
                    SocketPacket::ConnectError { data, .. } => {
                        return Err(Error::Unauthorized {
                            message: codec::connect_error_message(&data),
                        });
                    }
                    other => tracing::debug!(?other, "Ignoring packet during handshake"),
                },
                EnginePacket::Close => {
                    return Err(Error::Handshake("server closed during handshake".into()));
                }
                _ => {}
            }
        }
    }

    /// Send the owed pong, if any. Cleared only once the frame is out.
    async fn flush_pong(&mut self) -> Result<(), Error> {
        if let Some(data) = self.pending_pong.clone() {
            self.pong(data).await?;
            self.pending_pong = None;
        }
        Ok(())
    }

    async fn pong(&mut self, data: String) -> Result<(), Error> {
        tracing::trace!("Socket ping");
        self.ws
            .send(Message::text(EnginePacket::Pong(data).encode()))
            .await
            .map_err(|e| Error::SocketClosed {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Connection for EngineIoConnection {
    async fn recv(&mut self) -> Option<Result<SocketEvent, Error>> {
        let window = liveness_window(&self.handshake);
        loop {
            if let Err(e) = self.flush_pong().await {
                return Some(Err(e));
            }

            let frame = match tokio::time::timeout_at(self.deadline, next_text(&mut self.ws)).await
            {
                Ok(Ok(Some(text))) => text,
                Ok(Ok(None)) => return None,
                Ok(Err(e)) => return Some(Err(e)),
                Err(_) => {
                    return Some(Err(Error::SocketClosed {
                        reason: format!("no ping within {}ms", window.as_millis()),
                    }));
                }
            };
            self.deadline = Instant::now() + window;

            let packet = match EnginePacket::decode(&frame) {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!(error = %e, "Dropping undecodable frame");
                    continue;
                }
            };

            match packet {
                EnginePacket::Ping(data) => self.pending_pong = Some(data),
                EnginePacket::Close => return None,
                EnginePacket::Message(body) => match SocketPacket::decode(&body) {
                    Ok(SocketPacket::Event { name, args, .. }) => {
                        return Some(Ok(SocketEvent::from_args(name, args)));
                    }
                    Ok(SocketPacket::Disconnect { .. }) => {
                        tracing::info!("Server disconnected the namespace");
                        return None;
                    }
                    Ok(other) => tracing::trace!(?other, "Ignoring socket.io packet"),
                    Err(e) => tracing::debug!(error = %e, "Dropping malformed socket.io packet"),
                },
                _ => {}
            }
        }
    }

    async fn send(&mut self, event: &str, payload: Value) -> Result<(), Error> {
        let frame = SocketPacket::event(event, vec![payload]).to_frame();
        self.ws
            .send(Message::text(frame))
            .await
            .map_err(|e| Error::SocketClosed {
                reason: e.to_string(),
            })
    }

    async fn close(&mut self) {
        let frame = SocketPacket::Disconnect {
            namespace: "/".into(),
        }
        .to_frame();
        if let Err(e) = self.ws.send(Message::text(frame)).await {
            tracing::debug!(error = %e, "Failed to send namespace disconnect");
        }
        if let Err(e) = self.ws.close(None).await {
            tracing::debug!(error = %e, "Failed to close socket");
        }
    }
}

fn liveness_window(handshake: &Handshake) -> Duration {
    Duration::from_millis(handshake.ping_interval + handshake.ping_timeout)
}

/// Read the next text frame. `Ok(None)` on a close frame or end of stream.
async fn next_text(ws: &mut WsStream) -> Result<Option<String>, Error> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
            Some(Ok(Message::Close(frame))) => {
                if let Some(ref cf) = frame {
                    tracing::info!(code = %cf.code, reason = %cf.reason, "Socket close frame received");
                } else {
                    tracing::info!("Socket close frame received (no payload)");
                }
                return Ok(None);
            }
            Some(Ok(_)) => {
                // Binary, Ping, Pong, Frame -- tungstenite answers WS pings itself
            }
            Some(Err(e)) => return Err(Error::SocketClosed {
                reason: e.to_string(),
            }),
            None => return Ok(None),
        }
    }
}
