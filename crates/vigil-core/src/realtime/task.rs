// ── Socket task ──
//
// Owns the live connection: forwards queued emits, dispatches inbound
// events, and re-establishes the socket with exponential backoff when an
// established connection drops. Listeners are re-attached before the
// first frame of a new connection is read.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vigil_api::socket::{Connection, backoff_delay};

use super::ConnectionState;
use super::client::Inner;
use crate::model::TopicMessage;

/// One queued emit.
#[derive(Debug)]
pub(super) struct Outbound {
    pub(super) event: String,
    pub(super) payload: Value,
}

/// Why a connection stopped being pumped.
enum Ended {
    Cancelled,
    Dropped(String),
}

pub(super) async fn socket_task(
    inner: Arc<Inner>,
    mut conn: Box<dyn Connection>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    cancel: CancellationToken,
) {
    loop {
        match pump(&inner, conn.as_mut(), &mut outbound, &cancel).await {
            Ended::Cancelled => {
                conn.close().await;
                debug!("socket task exiting");
                return;
            }
            Ended::Dropped(reason) => warn!(%reason, "socket dropped"),
        }

        let Some(next) = reconnect(&inner, &cancel).await else {
            return;
        };
        conn = next;

        inner.reconnect_attempts.store(0, Ordering::Relaxed);
        // Emits queued while the link was down are not replayed.
        while outbound.try_recv().is_ok() {}
        inner.state.send_replace(ConnectionState::Connected);
        inner.reattach_all();
        info!("reconnected");
    }
}

/// Drive one connection until it drops or the task is cancelled.
async fn pump(
    inner: &Inner,
    conn: &mut dyn Connection,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
    cancel: &CancellationToken,
) -> Ended {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ended::Cancelled,
            out = outbound.recv() => {
                let Some(Outbound { event, payload }) = out else {
                    return Ended::Cancelled;
                };
                if let Err(e) = conn.send(&event, payload).await {
                    return Ended::Dropped(e.to_string());
                }
                debug!(event, "emitted");
            }
            frame = conn.recv() => match frame {
                Some(Ok(message)) => dispatch(inner, &message),
                Some(Err(e)) => return Ended::Dropped(e.to_string()),
                None => return Ended::Dropped("closed by server".into()),
            },
        }
    }
}

/// Retry with backoff. `None` when cancelled or out of attempts.
async fn reconnect(inner: &Inner, cancel: &CancellationToken) -> Option<Box<dyn Connection>> {
    let policy = &inner.config.reconnect;
    let mut attempt: u32 = 0;

    loop {
        if let Some(max) = policy.max_retries {
            if attempt >= max {
                error!(max_retries = max, "reconnection limit reached, giving up");
                give_up(inner);
                return None;
            }
        }

        inner.reconnect_attempts.store(attempt + 1, Ordering::Relaxed);
        inner.state.send_replace(ConnectionState::Reconnecting {
            attempt: attempt + 1,
        });

        let delay = backoff_delay(attempt, policy);
        info!(
            delay_ms = delay.as_millis(),
            attempt = attempt + 1,
            "reconnecting"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            () = tokio::time::sleep(delay) => {}
        }

        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            opened = inner.open() => opened,
        };

        match opened {
            Ok((conn, _url)) => return Some(conn),
            Err(e) if e.is_unauthorized() => {
                error!(error = %e, "reconnect rejected, giving up");
                give_up(inner);
                return None;
            }
            Err(e) => {
                warn!(error = %e, attempt = attempt + 1, "reconnect failed");
                attempt += 1;
            }
        }
    }
}

fn give_up(inner: &Inner) {
    inner.outbound.store(None);
    inner.listeners.clear();
    inner.state.send_replace(ConnectionState::Failed);
}

/// Normalize into the store, then fan out to a snapshot of callbacks.
fn dispatch(inner: &Inner, message: &TopicMessage) {
    let topic = message.topic.as_str();
    if !inner.listeners.contains(topic) {
        debug!(topic, "no listener for topic");
        return;
    }

    let normalized = inner.normalizer.classify(topic, &message.payload);
    if normalized.is_malformed() {
        return;
    }
    inner.store.apply(topic, normalized);

    for callback in inner.registry.snapshot(topic) {
        callback(message);
    }
}
