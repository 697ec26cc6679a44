// ── Topic state store ──
//
// Lock-free per-topic fragment maps with push-based change notification.

mod topic_store;

pub use topic_store::{FragmentMap, TopicStore};
