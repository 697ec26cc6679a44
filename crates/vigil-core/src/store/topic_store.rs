// ── Per-topic fragment store ──
//
// One `watch` channel per subscribed topic. Readers either clone the
// current `Arc<FragmentMap>` or await changes; writers merge normalized
// fragments in place with copy-on-write.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::normalize::Normalized;
use crate::stream::TopicStream;

/// Accumulated key/value state for one topic, in arrival order.
pub type FragmentMap = IndexMap<String, Value>;

/// Topic-keyed store of fragment maps.
///
/// A topic has an entry exactly while it is subscribed. Entries are
/// created empty, so a subscribed topic never reads as absent.
///
/// Fresh-keyed entries (append topics, and raw payloads on merged topics)
/// are capped at `append_retention` per topic, oldest evicted first.
/// Named keys on merged topics are never evicted.
pub struct TopicStore {
    topics: DashMap<String, TopicEntry>,
    append_retention: usize,
}

struct TopicEntry {
    tx: watch::Sender<Arc<FragmentMap>>,
    /// Raw-bucket keys in arrival order.
    raw_keys: VecDeque<String>,
}

impl TopicEntry {
    fn new() -> Self {
        Self {
            tx: watch::channel(Arc::new(FragmentMap::new())).0,
            raw_keys: VecDeque::new(),
        }
    }
}

impl TopicStore {
    pub fn new(append_retention: usize) -> Self {
        Self {
            topics: DashMap::new(),
            append_retention,
        }
    }

    /// Create an empty entry for `topic` if it has none.
    pub fn ensure(&self, topic: &str) {
        if !self.topics.contains_key(topic) {
            self.topics
                .entry(topic.to_owned())
                .or_insert_with(TopicEntry::new);
        }
    }

    /// Current fragment map, or `None` if the topic is not subscribed.
    pub fn get(&self, topic: &str) -> Option<Arc<FragmentMap>> {
        self.topics.get(topic).map(|entry| entry.tx.borrow().clone())
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// Merge a normalized message into `topic`'s map.
    ///
    /// Returns `false` (and changes nothing) for malformed input or a topic
    /// that is not subscribed.
    pub fn apply(&self, topic: &str, update: Normalized) -> bool {
        let Some(mut entry) = self.topics.get_mut(topic) else {
            debug!(topic, "message for unsubscribed topic ignored");
            return false;
        };
        let retention = self.append_retention;
        let TopicEntry { tx, raw_keys } = &mut *entry;

        match update {
            Normalized::Malformed { .. } => false,
            Normalized::Append { key, payload } => {
                tx.send_modify(|map| {
                    let map = Arc::make_mut(map);
                    map.insert(key, payload);
                    while map.len() > retention {
                        map.shift_remove_index(0);
                    }
                });
                true
            }
            Normalized::Batch(entries) => {
                if entries.is_empty() {
                    return false;
                }
                tx.send_modify(|map| Arc::make_mut(map).extend(entries));
                true
            }
            Normalized::Single { key, value } => {
                tx.send_modify(|map| {
                    Arc::make_mut(map).insert(key, value);
                });
                true
            }
            Normalized::Raw { key, payload } => {
                raw_keys.push_back(key.clone());
                let evicted: Vec<String> = if raw_keys.len() > retention {
                    raw_keys.drain(..raw_keys.len() - retention).collect()
                } else {
                    Vec::new()
                };
                tx.send_modify(|map| {
                    let map = Arc::make_mut(map);
                    map.insert(key, payload);
                    for old in &evicted {
                        map.shift_remove(old);
                    }
                });
                true
            }
        }
    }

    /// Drop `topic` and its state. Open watchers see their stream end.
    pub fn remove(&self, topic: &str) {
        self.topics.remove(topic);
    }

    pub fn clear(&self) {
        self.topics.clear();
    }

    /// Push subscription to `topic`, or `None` if it is not subscribed.
    pub fn watch(&self, topic: &str) -> Option<TopicStream> {
        self.topics
            .get(topic)
            .map(|entry| TopicStream::new(topic.to_owned(), entry.tx.subscribe()))
    }

    /// Push subscription to `topic`, creating an empty entry if needed.
    pub fn subscribe(&self, topic: &str) -> TopicStream {
        let rx = self
            .topics
            .entry(topic.to_owned())
            .or_insert_with(TopicEntry::new)
            .tx
            .subscribe();
        TopicStream::new(topic.to_owned(), rx)
    }

    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
