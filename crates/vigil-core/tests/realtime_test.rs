// Integration tests for `RealtimeClient` against an in-memory connector.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use url::Url;

use vigil_api::{Connection, Connector, Error, SocketEvent};
use vigil_core::{
    BackendConfig, ConnectionState, CoreError, RealtimeClient, ReconnectConfig, StaticToken,
};

// ── Mock transport ──────────────────────────────────────────────────

enum Frame {
    Event(SocketEvent),
    Drop,
}

/// Server side of one mock connection.
#[derive(Clone)]
struct ServerHandle {
    tx: mpsc::UnboundedSender<Frame>,
}

impl ServerHandle {
    fn send(&self, topic: &str, payload: Value) {
        let _ = self.tx.send(Frame::Event(SocketEvent {
            topic: topic.into(),
            payload,
        }));
    }

    fn drop_connection(&self) {
        let _ = self.tx.send(Frame::Drop);
    }
}

#[derive(Default)]
struct MockConnector {
    constructions: AtomicUsize,
    delay: Option<Duration>,
    /// Outcomes for the next connects; `false` fails. Empty means succeed.
    script: Mutex<VecDeque<bool>>,
    servers: Mutex<Vec<ServerHandle>>,
    sent: Arc<Mutex<Vec<(String, Value)>>>,
    urls: Mutex<Vec<Url>>,
}

impl MockConnector {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn fail_next(&self, n: usize) {
        self.script.lock().unwrap().extend(std::iter::repeat_n(false, n));
    }

    fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    fn server(&self, index: usize) -> ServerHandle {
        self.servers.lock().unwrap()[index].clone()
    }

    fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Connection>, Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.urls.lock().unwrap().push(url.clone());

        let ok = self.script.lock().unwrap().pop_front().unwrap_or(true);
        if !ok {
            return Err(Error::SocketConnect("connection refused".into()));
        }

        self.constructions.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.servers.lock().unwrap().push(ServerHandle { tx });
        Ok(Box::new(MockConnection {
            rx,
            sent: Arc::clone(&self.sent),
        }))
    }
}

struct MockConnection {
    rx: mpsc::UnboundedReceiver<Frame>,
    sent: Arc<Mutex<Vec<(String, Value)>>>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn recv(&mut self) -> Option<Result<SocketEvent, Error>> {
        match self.rx.recv().await {
            Some(Frame::Event(event)) => Some(Ok(event)),
            Some(Frame::Drop) => Some(Err(Error::SocketClosed {
                reason: "dropped by test".into(),
            })),
            None => None,
        }
    }

    async fn send(&mut self, event: &str, payload: Value) -> Result<(), Error> {
        self.sent.lock().unwrap().push((event.to_owned(), payload));
        Ok(())
    }

    async fn close(&mut self) {}
}

// ── Helpers ─────────────────────────────────────────────────────────

fn config() -> BackendConfig {
    let mut config = BackendConfig::new(
        Url::parse("http://backend.test/api").unwrap(),
        Url::parse("http://backend.test").unwrap(),
    );
    config.reconnect = ReconnectConfig {
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        max_retries: Some(3),
    };
    config
}

fn client_with(connector: &Arc<MockConnector>) -> RealtimeClient {
    RealtimeClient::new(
        config(),
        Arc::clone(connector) as Arc<dyn Connector>,
        Arc::new(StaticToken::new(SecretString::from("tok".to_string()))),
    )
}

async fn wait_for_state(
    rx: &mut watch::Receiver<ConnectionState>,
    want: impl Fn(&ConnectionState) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| want(s)))
        .await
        .expect("timed out waiting for state")
        .unwrap();
}

/// Poll until `check` holds; delivery happens on the socket task.
async fn eventually(check: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(&SocketEvent) + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    (count, move |_: &SocketEvent| {
        c.fetch_add(1, Ordering::SeqCst);
    })
}

// ── Connect guard ───────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_connects_construct_one_socket() {
    let connector = Arc::new(MockConnector::with_delay(Duration::from_millis(50)));
    let client = client_with(&connector);

    let (a, b) = tokio::join!(client.connect(), client.connect());
    assert!(a.unwrap());
    assert!(b.unwrap());
    assert_eq!(connector.constructions(), 1);

    // Already connected: resolves immediately, still one socket.
    assert!(client.connect().await.unwrap());
    assert_eq!(connector.constructions(), 1);
}

#[tokio::test]
async fn test_token_travels_in_socket_url() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    client.connect().await.unwrap();

    let url = connector.urls.lock().unwrap()[0].clone();
    assert_eq!(url.scheme(), "ws");
    assert_eq!(url.path(), "/socket.io/");
    assert!(url.query_pairs().any(|(k, v)| k == "token" && v == "tok"));
}

#[tokio::test]
async fn test_missing_token_is_unauthorized_without_socket() {
    let connector = Arc::new(MockConnector::default());
    let client = RealtimeClient::new(
        config(),
        Arc::clone(&connector) as Arc<dyn Connector>,
        Arc::new(StaticToken::none()),
    );

    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized { .. }));
    assert_eq!(connector.constructions(), 0);
    assert_eq!(*client.connection_state().borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_failed_connect_clears_guard() {
    let connector = Arc::new(MockConnector::default());
    connector.fail_next(1);
    let client = client_with(&connector);

    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::ConnectionFailed { .. }));
    assert!(!client.is_connected());

    assert!(client.connect().await.unwrap());
    assert_eq!(connector.constructions(), 1);
}

// ── Subscriptions and dispatch ──────────────────────────────────────

#[tokio::test]
async fn test_topic_data_absent_until_subscribed() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);

    assert!(client.get_topic_data("home").is_none());
    client.subscribe("home", |_| {});
    let data = client.get_topic_data("home").unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn test_batch_message_merges_into_topic_state() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    let (count, cb) = counter();
    client.subscribe("home", cb);
    client.connect().await.unwrap();

    let server = connector.server(0);
    server.send("home", json!({ "topic": "door", "message": "closed" }));
    server.send(
        "home",
        json!({
            "batchMode": true,
            "messages": [
                { "topic": "t1", "message": 5 },
                { "topic": "t2", "message": "20 C" },
            ]
        }),
    );

    eventually(|| count.load(Ordering::SeqCst) == 2).await;
    let data = client.get_topic_data("home").unwrap();
    assert_eq!(data["door"], json!("closed"));
    assert_eq!(data["t1"], json!(5));
    assert_eq!(data["t2"], json!("20 C"));
}

#[tokio::test]
async fn test_append_topic_keeps_every_event() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    let (count, cb) = counter();
    client.subscribe("alert", cb);
    client.connect().await.unwrap();

    let server = connector.server(0);
    for i in 0..10 {
        server.send("alert", json!({ "topic": "door", "message": i }));
    }

    eventually(|| count.load(Ordering::SeqCst) == 10).await;
    assert_eq!(client.get_topic_data("alert").unwrap().len(), 10);
}

#[tokio::test]
async fn test_malformed_payload_is_dropped() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    let (count, cb) = counter();
    client.subscribe("home", cb);
    client.connect().await.unwrap();

    let server = connector.server(0);
    server.send("home", json!({ "topic": "t1", "message": 1 }));
    eventually(|| count.load(Ordering::SeqCst) == 1).await;
    let before = client.get_topic_data("home").unwrap();

    server.send("home", json!("not json"));
    server.send("home", json!({ "topic": "t2", "message": 2 }));
    eventually(|| count.load(Ordering::SeqCst) == 2).await;

    let after = client.get_topic_data("home").unwrap();
    assert_eq!(after["t1"], before["t1"]);
    assert_eq!(after.len(), 2);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_subscribe_while_connected_attaches_immediately() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    client.connect().await.unwrap();
    assert!(client.attached_topics().is_empty());

    let (count, cb) = counter();
    client.subscribe("theft_detection", cb);
    assert_eq!(client.attached_topics(), vec!["theft_detection"]);

    connector
        .server(0)
        .send("theft_detection", json!({ "camera": "c1" }));
    eventually(|| count.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn test_unsubscribe_from_inside_callback() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    client.connect().await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let own_id = Arc::new(OnceLock::new());
    let id = {
        let handle = client.clone();
        let calls = Arc::clone(&calls);
        let own_id = Arc::clone(&own_id);
        client.subscribe("home", move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = own_id.get() {
                handle.unsubscribe("home", *id);
            }
        })
    };
    own_id.set(id).unwrap();
    let (other_count, other) = counter();
    client.subscribe("home", other);

    let server = connector.server(0);
    server.send("home", json!({ "topic": "a", "message": 1 }));
    eventually(|| other_count.load(Ordering::SeqCst) == 1).await;
    server.send("home", json!({ "topic": "a", "message": 2 }));
    eventually(|| other_count.load(Ordering::SeqCst) == 2).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_last_unsubscribe_clears_topic() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    let a = client.subscribe("home", |_| {});
    let b = client.subscribe("home", |_| {});

    assert!(client.unsubscribe("home", a));
    assert!(client.get_topic_data("home").is_some());
    assert!(client.unsubscribe("home", b));
    assert!(client.get_topic_data("home").is_none());
    assert!(!client.unsubscribe("home", b));
}

// ── Emit ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_emit_while_disconnected_sends_nothing() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);

    client.emit("mode:activate", json!({ "modeId": "m1" }));

    assert_eq!(connector.constructions(), 0);
    assert!(connector.sent().is_empty());
}

#[tokio::test]
async fn test_emit_while_connected_is_sent() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    client.connect().await.unwrap();

    client.emit("mode:activate", json!({ "modeId": "m1" }));
    eventually(|| connector.sent().len() == 1).await;
    assert_eq!(
        connector.sent()[0],
        ("mode:activate".to_string(), json!({ "modeId": "m1" }))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_subscribe_racing_connect_is_attached() {
    for round in 0..50 {
        let connector = Arc::new(MockConnector::with_delay(Duration::from_millis(2)));
        let client = client_with(&connector);

        let subscriber = std::thread::spawn({
            let client = client.clone();
            move || {
                for i in 0..200 {
                    client.subscribe(&format!("t{i}"), |_| {});
                }
            }
        });
        client.connect().await.unwrap();
        subscriber.join().unwrap();

        assert_eq!(client.subscribed_topics().len(), 200);
        assert_eq!(client.attached_topics(), client.subscribed_topics(), "round {round}");
    }
}

// ── Reconnect ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_reconnect_reattaches_each_callback_once() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    let (home_count, home_cb) = counter();
    let (alert_count, alert_cb) = counter();
    client.subscribe("home", home_cb);
    client.subscribe("alert", alert_cb);
    client.connect().await.unwrap();

    connector.server(0).drop_connection();
    eventually(|| connector.constructions() == 2 && client.is_connected()).await;

    assert_eq!(client.attached_topics(), vec!["alert", "home"]);
    assert_eq!(client.reconnect_attempts(), 0);

    let server = connector.server(1);
    server.send("home", json!({ "topic": "t", "message": 1 }));
    server.send("alert", json!({ "kind": "motion" }));
    eventually(|| home_count.load(Ordering::SeqCst) == 1 && alert_count.load(Ordering::SeqCst) == 1)
        .await;

    // Give a duplicate listener every chance to show up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(home_count.load(Ordering::SeqCst), 1);
    assert_eq!(alert_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reconnect_survives_failed_attempts() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    client.subscribe("home", |_| {});
    client.connect().await.unwrap();

    connector.fail_next(2);
    connector.server(0).drop_connection();
    eventually(|| connector.constructions() == 2 && client.is_connected()).await;

    // One initial connect, two refused attempts, one success.
    assert_eq!(connector.urls.lock().unwrap().len(), 4);
    assert_eq!(client.reconnect_attempts(), 0);
}

#[tokio::test]
async fn test_reconnect_gives_up_after_max_retries() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    client.connect().await.unwrap();

    connector.fail_next(10);
    let mut state = client.connection_state();
    connector.server(0).drop_connection();
    wait_for_state(&mut state, |s| *s == ConnectionState::Failed).await;

    assert!(!client.is_connected());
    client.emit("ignored", Value::Null);
    assert!(connector.sent().is_empty());
}

// ── Disconnect ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_disconnect_is_destructive() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    client.subscribe("home", |_| {});
    client.connect().await.unwrap();

    client.disconnect().await;

    assert!(!client.is_connected());
    assert!(client.subscribed_topics().is_empty());
    assert!(client.attached_topics().is_empty());
    assert!(client.get_topic_data("home").is_none());

    // A later connect builds a fresh socket with nothing attached.
    client.connect().await.unwrap();
    assert_eq!(connector.constructions(), 2);
    assert!(client.attached_topics().is_empty());
}

#[tokio::test]
async fn test_disconnect_abandons_in_flight_connect() {
    let connector = Arc::new(MockConnector::with_delay(Duration::from_millis(50)));
    let client = client_with(&connector);
    client.subscribe("home", |_| {});

    let pending = tokio::spawn({
        let client = client.clone();
        async move { client.connect().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    client.disconnect().await;

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(CoreError::Disconnected)), "{result:?}");
    assert!(!client.is_connected());
    assert_eq!(*client.connection_state().borrow(), ConnectionState::Disconnected);
    client.emit("ignored", Value::Null);
    assert!(connector.sent().is_empty());

    // The guard is free again: the next connect opens a fresh socket.
    assert!(client.connect().await.unwrap());
    assert!(client.is_connected());
    assert_eq!(connector.constructions(), 2);
}

// ── Streams ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_watch_topic_pushes_updates() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    let mut stream = client.watch_topic("home");
    assert_eq!(client.subscribed_topics(), vec!["home"]);
    client.connect().await.unwrap();

    connector
        .server(0)
        .send("home", json!({ "topic": "lux", "message": "300 lx" }));
    let snap = tokio::time::timeout(Duration::from_secs(5), stream.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap["lux"], json!("300 lx"));
}

#[tokio::test]
async fn test_poll_topic_subscribes_and_reads() {
    let connector = Arc::new(MockConnector::default());
    let client = client_with(&connector);
    let stream = client.poll_topic_every("home", Duration::from_millis(10));
    tokio::pin!(stream);
    client.connect().await.unwrap();

    assert!(stream.next().await.unwrap().unwrap().is_empty());
    connector
        .server(0)
        .send("home", json!({ "topic": "t", "message": 1 }));

    let seen = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snap = stream.next().await.unwrap().unwrap();
            if snap.contains_key("t") {
                return snap;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(seen["t"], json!(1));
}
