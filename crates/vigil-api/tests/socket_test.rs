// Socket handshake tests against an in-process tungstenite server.

#![allow(clippy::unwrap_used)]

use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use vigil_api::socket::socket_url;
use vigil_api::{Connector, Error, WsConnector};

const OPEN: &str = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

/// Accept one client, run `script` against it, and return the socket URL.
async fn serve<F, Fut>(script: F) -> Url
where
    F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        script(ws).await;
    });

    let base = Url::parse(&format!("http://{addr}")).unwrap();
    socket_url(&base, "/socket.io/", &SecretString::from("t0k".to_string())).unwrap()
}

async fn next_text(ws: &mut tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> String {
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(t) => return t.as_str().to_owned(),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn test_handshake_then_event_roundtrip() {
    let url = serve(|mut ws| async move {
        ws.send(Message::text(OPEN)).await.unwrap();
        assert_eq!(next_text(&mut ws).await, "40");
        ws.send(Message::text(r#"40{"sid":"ns1"}"#)).await.unwrap();

        ws.send(Message::text("2")).await.unwrap();
        assert_eq!(next_text(&mut ws).await, "3");

        ws.send(Message::text(r#"42["home",{"temp":"21.5 °C"}]"#))
            .await
            .unwrap();

        let emitted = next_text(&mut ws).await;
        assert_eq!(emitted, r#"42["mode:activate",{"modeId":"m-1"}]"#);

        ws.send(Message::text("41")).await.unwrap();
    })
    .await;

    let mut conn = WsConnector.connect(&url).await.unwrap();

    let event = conn.recv().await.unwrap().unwrap();
    assert_eq!(event.topic, "home");
    assert_eq!(event.payload, json!({ "temp": "21.5 °C" }));

    conn.send("mode:activate", json!({ "modeId": "m-1" }))
        .await
        .unwrap();

    assert!(conn.recv().await.is_none());
}

#[tokio::test]
async fn test_connect_error_is_unauthorized() {
    let url = serve(|mut ws| async move {
        ws.send(Message::text(OPEN)).await.unwrap();
        let _ = next_text(&mut ws).await;
        ws.send(Message::text(r#"44{"message":"invalid token"}"#))
            .await
            .unwrap();
    })
    .await;

    let err = WsConnector.connect(&url).await.err().unwrap();
    match err {
        Error::Unauthorized { message } => assert_eq!(message, "invalid token"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn test_close_before_open_is_handshake_error() {
    let url = serve(|mut ws| async move {
        ws.close(None).await.unwrap();
    })
    .await;

    let err = WsConnector.connect(&url).await.err().unwrap();
    assert!(matches!(err, Error::Handshake(_)));
}

// ── Cancelled reads ─────────────────────────────────────────────────

const SHORT_OPEN: &str = r#"0{"sid":"abc","upgrades":[],"pingInterval":100,"pingTimeout":50}"#;

#[tokio::test]
async fn test_cancelled_recv_keeps_liveness_deadline() {
    let url = serve(|mut ws| async move {
        ws.send(Message::text(SHORT_OPEN)).await.unwrap();
        let _ = next_text(&mut ws).await;
        ws.send(Message::text(r#"40{"sid":"ns1"}"#)).await.unwrap();
        // Go silent but keep the TCP connection open.
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    })
    .await;

    let mut conn = WsConnector.connect(&url).await.unwrap();

    // Reads abandoned every 20ms must not push the 150ms window forward.
    let outcome = tokio::time::timeout(std::time::Duration::from_secs(2), async {
        loop {
            if let Ok(result) =
                tokio::time::timeout(std::time::Duration::from_millis(20), conn.recv()).await
            {
                return result;
            }
        }
    })
    .await
    .expect("liveness window never expired");

    assert!(matches!(outcome, Some(Err(Error::SocketClosed { .. }))), "{outcome:?}");
}

#[tokio::test]
async fn test_ping_is_answered_across_cancelled_reads() {
    let url = serve(|mut ws| async move {
        ws.send(Message::text(OPEN)).await.unwrap();
        let _ = next_text(&mut ws).await;
        ws.send(Message::text(r#"40{"sid":"ns1"}"#)).await.unwrap();

        ws.send(Message::text("2hb")).await.unwrap();
        assert_eq!(next_text(&mut ws).await, "3hb");
        ws.send(Message::text(r#"42["alert",{"kind":"motion"}]"#))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    })
    .await;

    let mut conn = WsConnector.connect(&url).await.unwrap();

    let event = tokio::time::timeout(std::time::Duration::from_secs(2), async {
        loop {
            if let Ok(result) =
                tokio::time::timeout(std::time::Duration::from_millis(5), conn.recv()).await
            {
                return result;
            }
        }
    })
    .await
    .unwrap()
    .unwrap()
    .unwrap();

    assert_eq!(event.topic, "alert");
    assert_eq!(event.payload, json!({ "kind": "motion" }));
}
