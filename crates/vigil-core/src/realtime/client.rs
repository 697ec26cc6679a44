// ── RealtimeClient ──
//
// Connection lifecycle, the connect-in-flight guard, and the public
// subscribe / emit surface. The socket itself is driven by `task.rs`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use dashmap::DashSet;
use futures_core::Stream;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use vigil_api::socket::{self, Connection, Connector};
use vigil_api::WsConnector;

use super::ConnectionState;
use super::registry::{Callback, Registry, Removal, SubscriptionId};
use super::task::{Outbound, socket_task};
use crate::config::BackendConfig;
use crate::error::CoreError;
use crate::model::TopicMessage;
use crate::normalize::Normalizer;
use crate::store::{FragmentMap, TopicStore};
use crate::stream::{TopicStream, poll_store};
use crate::token::{TokenSource, require_token};

type ConnectFuture = Shared<BoxFuture<'static, Result<bool, CoreError>>>;

/// Client for the backend's realtime topic feed.
///
/// Cheaply cloneable via `Arc<Inner>`; construct one per backend at the
/// composition root and hand clones to consumers. Subscriptions survive
/// implicit reconnects but not an explicit [`disconnect()`](Self::disconnect).
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

pub(super) struct Inner {
    pub(super) config: BackendConfig,
    connector: Arc<dyn Connector>,
    tokens: Arc<dyn TokenSource>,
    pub(super) normalizer: Normalizer,
    pub(super) registry: Registry,
    /// Topics with a live socket-level listener. Rebuilt on every (re)connect.
    pub(super) listeners: DashSet<String>,
    pub(super) store: Arc<TopicStore>,
    pub(super) state: watch::Sender<ConnectionState>,
    pub(super) reconnect_attempts: AtomicU32,
    pub(super) outbound: ArcSwapOption<mpsc::UnboundedSender<Outbound>>,
    /// Bumped by `disconnect()`. A connect started under an older value
    /// must not install its session.
    generation: AtomicU64,
    connecting: Mutex<Option<(u64, ConnectFuture)>>,
    session: Mutex<Option<Session>>,
}

struct Session {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RealtimeClient {
    /// Create a client. Does NOT connect.
    pub fn new(
        config: BackendConfig,
        connector: Arc<dyn Connector>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        let normalizer = Normalizer::new(config.append_topics.iter().cloned());
        let store = Arc::new(TopicStore::new(config.append_retention));
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(Inner {
                config,
                connector,
                tokens,
                normalizer,
                registry: Registry::default(),
                listeners: DashSet::new(),
                store,
                state,
                reconnect_attempts: AtomicU32::new(0),
                outbound: ArcSwapOption::empty(),
                generation: AtomicU64::new(0),
                connecting: Mutex::new(None),
                session: Mutex::new(None),
            }),
        }
    }

    /// Create a client that opens real WebSocket connections.
    pub fn with_websocket(config: BackendConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self::new(config, Arc::new(WsConnector), tokens)
    }

    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect the socket.
    ///
    /// Resolves `true` immediately when already connected. Concurrent
    /// callers share one attempt, so at most one socket is constructed.
    /// A failed attempt clears the guard and may be retried.
    pub async fn connect(&self) -> Result<bool, CoreError> {
        if self.is_connected() {
            return Ok(true);
        }

        let attempt = {
            let mut slot = self.inner.connecting.lock().await;
            if self.is_connected() {
                return Ok(true);
            }
            if let Some((_, in_flight)) = slot.as_ref() {
                debug!("joining in-flight connect");
                in_flight.clone()
            } else {
                let generation = self.inner.generation.load(Ordering::SeqCst);
                let inner = Arc::clone(&self.inner);
                let fut = async move {
                    let result = establish(&inner, generation).await;
                    let mut slot = inner.connecting.lock().await;
                    if slot.as_ref().is_some_and(|(g, _)| *g == generation) {
                        *slot = None;
                    }
                    result
                }
                .boxed()
                .shared();
                *slot = Some((generation, fut.clone()));
                fut
            }
        };

        attempt.await
    }

    /// Tear down the socket and forget every subscription and all topic
    /// state. Callers must subscribe again after the next `connect()`.
    ///
    /// A connect still in flight is abandoned: it closes its socket and
    /// resolves to [`CoreError::Disconnected`].
    pub async fn disconnect(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.connecting.lock().await.take();
        self.inner.outbound.store(None);
        let session = self.inner.session.lock().await.take();
        if let Some(session) = session {
            session.cancel.cancel();
            if let Err(e) = session.handle.await {
                warn!(error = %e, "socket task ended abnormally");
            }
        }

        self.inner.registry.clear();
        self.inner.listeners.clear();
        self.inner.store.clear();
        self.inner.reconnect_attempts.store(0, Ordering::Relaxed);
        self.inner.state.send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Subscriptions ────────────────────────────────────────────

    /// Register `callback` for `topic`.
    ///
    /// The topic gets an (empty) state entry right away. When connected
    /// the listener is attached now, otherwise at the next connect.
    pub fn subscribe<F>(&self, topic: &str, callback: F) -> SubscriptionId
    where
        F: Fn(&TopicMessage) + Send + Sync + 'static,
    {
        self.subscribe_callback(topic, Arc::new(callback))
    }

    pub fn subscribe_callback(&self, topic: &str, callback: Callback) -> SubscriptionId {
        self.inner.store.ensure(topic);
        let id = self.inner.registry.add(topic, callback);

        if self.is_connected() {
            self.inner.attach(topic);
        } else {
            debug!(topic, "subscription queued until connect");
        }
        id
    }

    /// Remove one callback. Dropping the last one for a topic also drops
    /// its listener and its state. Returns `false` for an unknown id.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> bool {
        match self.inner.registry.remove(topic, id) {
            Removal::NotFound => false,
            Removal::Removed { topic_empty } => {
                if topic_empty && !self.inner.registry.contains(topic) {
                    self.inner.listeners.remove(topic);
                    self.inner.store.remove(topic);
                    debug!(topic, "last subscription removed");
                }
                true
            }
        }
    }

    /// Fire-and-forget send. Dropped with a warning when not connected.
    pub fn emit(&self, event: &str, payload: Value) {
        if !self.is_connected() {
            warn!(event, "emit while disconnected, dropping");
            return;
        }
        let Some(tx) = self.inner.outbound.load_full() else {
            warn!(event, "emit while disconnected, dropping");
            return;
        };
        let frame = Outbound {
            event: event.to_owned(),
            payload,
        };
        if tx.send(frame).is_err() {
            warn!(event, "socket task gone, dropping emit");
        }
    }

    // ── Topic state ──────────────────────────────────────────────

    /// Current fragment map, or `None` if `topic` is not subscribed.
    pub fn get_topic_data(&self, topic: &str) -> Option<Arc<FragmentMap>> {
        self.inner.store.get(topic)
    }

    /// Push stream of `topic`'s fragment map, subscribing on first use.
    pub fn watch_topic(&self, topic: &str) -> TopicStream {
        self.ensure_subscribed(topic);
        self.inner.store.subscribe(topic)
    }

    /// Re-read `topic` every configured poll interval, subscribing on
    /// first use. Readers see updates at most one interval late.
    pub fn poll_topic(
        &self,
        topic: &str,
    ) -> impl Stream<Item = Option<Arc<FragmentMap>>> + Send + 'static {
        self.poll_topic_every(topic, self.inner.config.poll_interval)
    }

    pub fn poll_topic_every(
        &self,
        topic: &str,
        every: Duration,
    ) -> impl Stream<Item = Option<Arc<FragmentMap>>> + Send + 'static {
        self.ensure_subscribed(topic);
        poll_store(Arc::clone(&self.inner.store), topic.to_owned(), every)
    }

    fn ensure_subscribed(&self, topic: &str) {
        if !self.inner.registry.contains(topic) {
            self.subscribe(topic, |_| {});
        }
    }

    pub fn store(&self) -> &Arc<TopicStore> {
        &self.inner.store
    }

    // ── State observation ────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.inner.state.borrow().is_connected()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Reconnect attempts since the last successful connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.reconnect_attempts.load(Ordering::Relaxed)
    }

    pub fn subscribed_topics(&self) -> Vec<String> {
        self.inner.registry.topics()
    }

    /// Topics with a live socket listener.
    pub fn attached_topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.listeners.iter().map(|t| t.key().clone()).collect();
        names.sort();
        names
    }
}

impl Inner {
    /// Attach the socket listener for `topic`, replacing any existing one.
    pub(super) fn attach(&self, topic: &str) {
        self.listeners.remove(topic);
        self.listeners.insert(topic.to_owned());
    }

    /// Rebuild the listener set from the registry.
    ///
    /// Call only after `Connected` is published: a `subscribe` racing the
    /// rebuild is then either in the registry snapshot or attaches itself.
    pub(super) fn reattach_all(&self) {
        self.listeners.clear();
        for topic in self.registry.topics() {
            self.attach(&topic);
        }
        debug!(topics = self.listeners.len(), "listeners attached");
    }

    /// Resolve the token and open one authenticated socket.
    pub(super) async fn open(&self) -> Result<(Box<dyn Connection>, Url), CoreError> {
        let token = require_token(self.tokens.as_ref()).await?;
        let url = socket::socket_url(&self.config.socket_url, &self.config.socket_path, &token)?;
        let conn = self.connector.connect(&url).await?;
        Ok((conn, url))
    }
}

/// One connect attempt: open the socket, attach listeners, start the task.
///
/// `generation` is the disconnect generation the attempt started under.
async fn establish(inner: &Arc<Inner>, generation: u64) -> Result<bool, CoreError> {
    let current = || inner.generation.load(Ordering::SeqCst) == generation;
    inner.state.send_replace(ConnectionState::Connecting);

    let (mut conn, url) = match inner.open().await {
        Ok(opened) => opened,
        Err(e) => {
            warn!(error = %e, "connect failed");
            if current() {
                inner.state.send_replace(ConnectionState::Disconnected);
            }
            return Err(e);
        }
    };

    // `disconnect()` bumps the generation before taking this lock, so the
    // check and the install below cannot interleave with its teardown.
    let mut session = inner.session.lock().await;
    if !current() {
        drop(session);
        debug!("connect abandoned by disconnect");
        conn.close().await;
        return Err(CoreError::Disconnected);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    inner.reconnect_attempts.store(0, Ordering::Relaxed);
    inner.outbound.store(Some(Arc::new(tx)));
    inner.state.send_replace(ConnectionState::Connected);
    inner.reattach_all();

    let handle = tokio::spawn(socket_task(Arc::clone(inner), conn, rx, cancel.clone()));
    if let Some(previous) = session.replace(Session { cancel, handle }) {
        previous.cancel.cancel();
    }
    drop(session);

    info!(url = %socket::redacted(&url), "connected");
    Ok(true)
}
