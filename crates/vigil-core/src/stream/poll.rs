use std::sync::Arc;
use std::time::Duration;

use futures_core::Stream;
use tokio::time::MissedTickBehavior;

use crate::store::{FragmentMap, TopicStore};

/// Re-read `topic` from the store every `every`.
///
/// Yields the current map on each tick, `None` while the topic is not
/// subscribed. The stream never ends on its own; drop it to stop polling.
pub fn poll_store(
    store: Arc<TopicStore>,
    topic: String,
    every: Duration,
) -> impl Stream<Item = Option<Arc<FragmentMap>>> + Send + 'static {
    async_stream::stream! {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            yield store.get(&topic);
        }
    }
}
