//! `vigil watch`: follow live topic state.
//!
//! Subscribes every topic, connects, then prints entries that are new or
//! changed since the last print. Default mode re-reads the store on the
//! profile's poll interval; `--push` prints on every store change.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;
use tokio::sync::watch;
use vigil_core::{ConnectionState, FragmentMap, Reading, RealtimeClient};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

type SnapshotStream = Pin<Box<dyn Stream<Item = (String, Arc<FragmentMap>)> + Send>>;

// ── Rendering ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Reading")]
    reading: String,
}

#[derive(Serialize)]
struct Update<'a> {
    topic: &'a str,
    key: &'a str,
    value: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    reading: Option<Reading>,
}

/// Entries in `next` that are absent from or differ in `prev`.
fn changed_entries<'a>(
    prev: Option<&FragmentMap>,
    next: &'a FragmentMap,
) -> Vec<(&'a String, &'a Value)> {
    next.iter()
        .filter(|(k, v)| prev.and_then(|p| p.get(*k)) != Some(*v))
        .collect()
}

fn render_updates(
    format: &OutputFormat,
    topic: &str,
    entries: &[(&String, &Value)],
    raw: bool,
    color: bool,
) -> String {
    let display = |v: &Value| {
        if raw {
            v.to_string()
        } else {
            Reading::from_value(v).to_string()
        }
    };

    match format {
        OutputFormat::Table => {
            let rows: Vec<ReadingRow> = entries
                .iter()
                .map(|(k, v)| ReadingRow {
                    topic: topic.to_owned(),
                    key: (*k).clone(),
                    reading: display(v),
                })
                .collect();
            tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string()
        }
        OutputFormat::Plain => entries
            .iter()
            .map(|(k, v)| format!("{} {k}={}", output::paint_topic(topic, color), display(v)))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => entries
            .iter()
            .filter_map(|(k, v)| {
                let update = Update {
                    topic,
                    key: k,
                    value: v,
                    reading: (!raw).then(|| Reading::from_value(v)),
                };
                output::render_record(format, &update)
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// ── Streams ─────────────────────────────────────────────────────────

fn push_streams(client: &RealtimeClient, topics: &[String]) -> SnapshotStream {
    let streams = topics.iter().map(|topic| {
        let name = topic.clone();
        client
            .watch_topic(topic)
            .into_stream()
            .map(move |snap| (name.clone(), snap))
            .boxed()
    });
    stream::select_all(streams).boxed()
}

fn poll_streams(client: &RealtimeClient, topics: &[String], every: Duration) -> SnapshotStream {
    let streams = topics.iter().map(|topic| {
        let name = topic.clone();
        client
            .poll_topic_every(topic, every)
            .filter_map(move |snap| {
                let name = name.clone();
                async move { snap.map(|s| (name, s)) }
            })
            .boxed()
    });
    stream::select_all(streams).boxed()
}

/// Resolves once the client gives up reconnecting.
async fn wait_for_failure(mut state: watch::Receiver<ConnectionState>) {
    loop {
        if matches!(*state.borrow_and_update(), ConnectionState::Failed) {
            return;
        }
        if state.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &RealtimeClient,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    // Subscribing before connect attaches every listener in one pass.
    let mut updates = if args.push {
        push_streams(client, &args.topics)
    } else {
        let every = args
            .interval
            .map_or(client.config().poll_interval, Duration::from_millis);
        poll_streams(client, &args.topics, every)
    };

    let spinner = (!global.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("connecting to {}", client.config().socket_url));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });
    let connected = client.connect().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    connected?;
    tracing::info!(topics = ?args.topics, push = args.push, "watching");

    let failure = wait_for_failure(client.connection_state());
    tokio::pin!(failure);

    let mut last: HashMap<String, Arc<FragmentMap>> = HashMap::new();
    let mut printed = 0usize;

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            () = &mut failure => break Err(CliError::SocketLost),
            next = updates.next() => {
                let Some((topic, snap)) = next else { break Ok(()) };
                let prev = last.get(&topic).map(Arc::as_ref);
                let entries = changed_entries(prev, &snap);
                if !entries.is_empty() {
                    let out = render_updates(&global.output, &topic, &entries, args.raw, color);
                    output::print_output(&out, global.quiet);
                    printed += 1;
                }
                last.insert(topic, snap);
                if args.count.is_some_and(|n| printed >= n) {
                    break Ok(());
                }
            }
        }
    };

    client.disconnect().await;
    result
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(pairs: &[(&str, Value)]) -> FragmentMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn only_new_or_changed_entries_are_reported() {
        let prev = map(&[("t1", json!(5)), ("t2", json!("20 C"))]);
        let next = map(&[("t1", json!(5)), ("t2", json!("21 C")), ("t3", json!(true))]);
        let changed: Vec<_> = changed_entries(Some(&prev), &next)
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(changed, vec!["t2", "t3"]);

        assert_eq!(changed_entries(None, &next).len(), 3);
    }

    #[test]
    fn plain_rendering_parses_readings() {
        let next = map(&[("temp", json!("20 C"))]);
        let entries = changed_entries(None, &next);
        let out = render_updates(&OutputFormat::Plain, "home", &entries, false, false);
        assert_eq!(out, "home temp=20 C");

        let out = render_updates(&OutputFormat::Plain, "home", &entries, true, false);
        assert_eq!(out, "home temp=\"20 C\"");
    }

    #[test]
    fn json_rendering_is_one_record_per_line() {
        let next = map(&[("a", json!(1)), ("b", json!("x"))]);
        let entries = changed_entries(None, &next);
        let out = render_updates(&OutputFormat::Json, "home", &entries, true, false);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap_or_default();
        assert_eq!(first["topic"], "home");
        assert_eq!(first["key"], "a");
    }
}
