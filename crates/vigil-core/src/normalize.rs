// ── Inbound message normalization ──
//
// Every socket event is classified into exactly one `Normalized` case.
// Order matters and is fixed: decode failures first, then append-keyed
// topics, then batch envelopes, then single `{topic, message}` pairs,
// and finally the raw bucket.

use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

/// Outcome of classifying one inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Undecodable or empty payload. Dropped.
    Malformed { reason: String },
    /// Discrete event on an append-keyed topic, stored under a fresh key.
    Append { key: String, payload: Value },
    /// `{ batchMode: true, messages: [{topic, message}, ...] }`.
    Batch(Vec<(String, Value)>),
    /// `{ topic, message }`.
    Single { key: String, value: Value },
    /// Anything else, stored under a fresh key.
    Raw { key: String, payload: Value },
}

impl Normalized {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Classifies inbound payloads per topic.
#[derive(Debug, Clone)]
pub struct Normalizer {
    append_topics: HashSet<String>,
}

impl Normalizer {
    pub fn new<I, S>(append_topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            append_topics: append_topics.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_append_topic(&self, topic: &str) -> bool {
        self.append_topics.contains(topic)
    }

    pub fn classify(&self, topic: &str, raw: &Value) -> Normalized {
        let payload = match decode(raw) {
            Ok(payload) => payload,
            Err(reason) => {
                warn!(topic, %reason, "dropping malformed message");
                return Normalized::Malformed { reason };
            }
        };

        if self.is_append_topic(topic) {
            return Normalized::Append {
                key: unique_key(),
                payload,
            };
        }

        if let Some(entries) = batch_entries(&payload) {
            return Normalized::Batch(entries);
        }

        if let Some((key, value)) = single_entry(&payload) {
            return Normalized::Single { key, value };
        }

        Normalized::Raw {
            key: unique_key(),
            payload,
        }
    }
}

/// Turn the wire shape into a JSON value.
///
/// `[meta, "<json>"]` parses the string at index 1, a bare string is parsed
/// as JSON, objects and arrays pass through. Scalars and `null` are rejected.
fn decode(raw: &Value) -> Result<Value, String> {
    let parsed = match raw {
        Value::Array(items) if items.len() >= 2 && items[1].is_string() => {
            let text = items[1].as_str().unwrap_or_default();
            parse_text(text)?
        }
        Value::String(text) => parse_text(text)?,
        Value::Object(_) | Value::Array(_) => raw.clone(),
        Value::Null => return Err("empty payload".into()),
        other => return Err(format!("unexpected payload type: {other}")),
    };

    if parsed.is_null() {
        return Err("payload decoded to null".into());
    }
    Ok(parsed)
}

fn parse_text(text: &str) -> Result<Value, String> {
    serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))
}

fn batch_entries(payload: &Value) -> Option<Vec<(String, Value)>> {
    if payload.get("batchMode").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    let messages = payload.get("messages")?.as_array()?;

    let entries = messages
        .iter()
        .filter_map(|entry| match single_entry(entry) {
            Some(pair) => Some(pair),
            None => {
                warn!(?entry, "skipping batch entry without a topic");
                None
            }
        })
        .collect();
    Some(entries)
}

fn single_entry(payload: &Value) -> Option<(String, Value)> {
    let obj = payload.as_object()?;
    let topic = obj.get("topic")?.as_str()?;
    let message = obj.get("message")?;
    Some((topic.to_owned(), message.clone()))
}

/// `<unix-millis>-<random>`; unique even for events in the same millisecond.
pub fn unique_key() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(["alert", "theft_detection"])
    }

    #[test]
    fn batch_message_yields_each_entry() {
        let raw = json!({
            "batchMode": true,
            "messages": [
                { "topic": "t1", "message": 5 },
                { "topic": "t2", "message": "20 C" },
            ]
        });
        assert_eq!(
            normalizer().classify("home", &raw),
            Normalized::Batch(vec![
                ("t1".into(), json!(5)),
                ("t2".into(), json!("20 C")),
            ])
        );
    }

    #[test]
    fn meta_and_json_string_pair_is_decoded() {
        let raw = json!([{ "ts": 1 }, r#"{"topic":"door","message":"open"}"#]);
        assert_eq!(
            normalizer().classify("home", &raw),
            Normalized::Single {
                key: "door".into(),
                value: json!("open"),
            }
        );
    }

    #[test]
    fn json_string_payload_is_parsed() {
        let raw = json!(r#"{"batchMode":true,"messages":[{"topic":"hum","message":"40 %"}]}"#);
        let Normalized::Batch(entries) = normalizer().classify("home", &raw) else {
            panic!("expected batch");
        };
        assert_eq!(entries, vec![("hum".into(), json!("40 %"))]);
    }

    #[test]
    fn append_topic_wins_over_shape() {
        let raw = json!({ "topic": "door", "message": "forced" });
        let Normalized::Append { key, payload } = normalizer().classify("alert", &raw) else {
            panic!("expected append");
        };
        assert_eq!(payload, raw);
        assert!(key.contains('-'));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        let n = normalizer();
        assert!(n.classify("home", &json!("not json")).is_malformed());
        assert!(n.classify("home", &json!(42)).is_malformed());
        assert!(n.classify("home", &Value::Null).is_malformed());
        assert!(n.classify("home", &json!("null")).is_malformed());
        assert!(n.classify("home", &json!([{}, "{broken"])).is_malformed());
        // Malformed beats the append rule too.
        assert!(n.classify("alert", &json!("not json")).is_malformed());
    }

    #[test]
    fn unrecognized_object_goes_to_raw_bucket() {
        let raw = json!({ "foo": "bar" });
        let Normalized::Raw { payload, .. } = normalizer().classify("home", &raw) else {
            panic!("expected raw");
        };
        assert_eq!(payload, raw);
    }

    #[test]
    fn batch_flag_without_messages_is_raw() {
        let raw = json!({ "batchMode": true });
        assert!(matches!(
            normalizer().classify("home", &raw),
            Normalized::Raw { .. }
        ));
    }

    #[test]
    fn batch_entries_without_topic_are_skipped() {
        let raw = json!({
            "batchMode": true,
            "messages": [{ "message": 1 }, { "topic": "ok", "message": 2 }]
        });
        assert_eq!(
            normalizer().classify("home", &raw),
            Normalized::Batch(vec![("ok".into(), json!(2))])
        );
    }

    #[test]
    fn unique_keys_do_not_collide() {
        let keys: HashSet<String> = (0..1000).map(|_| unique_key()).collect();
        assert_eq!(keys.len(), 1000);
    }
}
