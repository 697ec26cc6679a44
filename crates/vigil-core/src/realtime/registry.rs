// ── Topic registry ──
//
// topic → callbacks. Dispatch works on a cloned snapshot of a topic's
// callback list, so a callback may subscribe or unsubscribe (itself
// included) without deadlocking or invalidating the iteration.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::model::TopicMessage;

/// Handler invoked for every well-formed message on a subscribed topic.
pub type Callback = Arc<dyn Fn(&TopicMessage) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe that one callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Result of removing one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    NotFound,
    Removed { topic_empty: bool },
}

#[derive(Default)]
pub(crate) struct Registry {
    next_id: AtomicU64,
    topics: DashMap<String, Vec<(SubscriptionId, Callback)>>,
}

impl Registry {
    pub(crate) fn add(&self, topic: &str, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.topics
            .entry(topic.to_owned())
            .or_default()
            .push((id, callback));
        id
    }

    pub(crate) fn remove(&self, topic: &str, id: SubscriptionId) -> Removal {
        let mut found = false;
        let emptied = self
            .topics
            .remove_if_mut(topic, |_, subs| {
                let before = subs.len();
                subs.retain(|(sid, _)| *sid != id);
                found = subs.len() != before;
                subs.is_empty()
            })
            .is_some();

        if found || emptied {
            Removal::Removed {
                topic_empty: emptied,
            }
        } else {
            Removal::NotFound
        }
    }

    /// Callbacks for `topic` at this instant.
    pub(crate) fn snapshot(&self, topic: &str) -> Vec<Callback> {
        self.topics
            .get(topic)
            .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn contains(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub(crate) fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub(crate) fn clear(&self) {
        self.topics.clear();
    }
}
