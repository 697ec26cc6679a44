// ── Topic streams ──
//
// Two ways to follow a topic's fragment map: a push subscription backed
// by the store's `watch` channel, and a fixed-interval poller that
// re-reads the store. Pollers see every state at most one interval late.

mod poll;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::FragmentMap;

pub use poll::poll_store;

/// A push subscription to one topic's fragment map.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct TopicStream {
    topic: String,
    current: Arc<FragmentMap>,
    receiver: watch::Receiver<Arc<FragmentMap>>,
}

impl TopicStream {
    pub(crate) fn new(topic: String, receiver: watch::Receiver<Arc<FragmentMap>>) -> Self {
        let current = receiver.borrow().clone();
        Self {
            topic,
            current,
            receiver,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<FragmentMap> {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<FragmentMap> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the topic is unsubscribed or the store dropped.
    pub async fn changed(&mut self) -> Option<Arc<FragmentMap>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream`. The first item is the current snapshot.
    pub fn into_stream(self) -> TopicWatchStream {
        TopicWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct TopicWatchStream {
    inner: WatchStream<Arc<FragmentMap>>,
}

impl Stream for TopicWatchStream {
    type Item = Arc<FragmentMap>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;
    use serde_json::json;

    use crate::normalize::Normalized;
    use crate::store::TopicStore;

    #[tokio::test]
    async fn changed_yields_merged_snapshot() {
        let store = TopicStore::new(10);
        store.ensure("home");
        let mut stream = store.watch("home").unwrap();
        assert!(stream.current().is_empty());

        store.apply(
            "home",
            Normalized::Single {
                key: "t".into(),
                value: json!(1),
            },
        );
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap["t"], json!(1));
        assert_eq!(stream.current()["t"], json!(1));
    }

    #[tokio::test]
    async fn stream_ends_when_topic_removed() {
        let store = TopicStore::new(10);
        store.ensure("home");
        let mut stream = store.watch("home").unwrap().into_stream();

        assert!(stream.next().await.unwrap().is_empty());
        store.remove("home");
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn watch_unknown_topic_is_none() {
        let store = TopicStore::new(10);
        assert!(store.watch("nope").is_none());
    }
}
