//! Rendering for `--output`.
//!
//! Lists go through `tabled` rows in table mode; detail views bring their
//! own formatter. JSON and YAML always serialize the backend data itself,
//! and `plain` prints one identifier per line for shell pipelines.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color ────────────────────────────────────────────────────────────

pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

pub fn paint_topic(topic: &str, color: bool) -> String {
    if color {
        topic.cyan().bold().to_string()
    } else {
        topic.to_owned()
    }
}

/// "on" in green, "off" dimmed.
pub fn paint_flag(on: bool, color: bool) -> String {
    let label = if on { "on" } else { "off" };
    match (color, on) {
        (false, _) => label.into(),
        (true, true) => label.green().to_string(),
        (true, false) => label.dimmed().to_string(),
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────

/// Render a collection. `to_row` feeds table mode, `id_fn` feeds plain mode.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Plain => data.iter().map(id_fn).collect::<Vec<_>>().join("\n"),
        structured => render_structured(structured, data),
    }
}

/// Render one item. `detail_fn` is the human view for table mode.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Plain => id_fn(data),
        structured => render_structured(structured, data),
    }
}

/// One record of an open-ended stream: a JSON line, or a YAML document
/// terminated by `---`. `None` for the human formats.
pub fn render_record<T: Serialize + ?Sized>(format: &OutputFormat, data: &T) -> Option<String> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            Some(render_structured(&OutputFormat::JsonCompact, data))
        }
        OutputFormat::Yaml => Some(format!("{}\n---", render_structured(format, data).trim_end())),
        OutputFormat::Table | OutputFormat::Plain => None,
    }
}

/// Write to stdout unless `--quiet` or there is nothing to say.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    // A closed pipe (`vigil watch | head`) is not an error worth reporting.
    let _ = writeln!(stdout, "{output}");
    let _ = stdout.flush();
}

fn render_structured<T: Serialize + ?Sized>(format: &OutputFormat, data: &T) -> String {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        _ => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
    };
    rendered.unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Zone {
        id: String,
        name: String,
    }

    #[derive(Tabled)]
    struct ZoneRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
    }

    fn zones() -> Vec<Zone> {
        vec![
            Zone {
                id: "z1".into(),
                name: "Lobby".into(),
            },
            Zone {
                id: "z2".into(),
                name: "Garage".into(),
            },
        ]
    }

    fn render(format: &OutputFormat) -> String {
        render_list(
            format,
            &zones(),
            |z| ZoneRow {
                id: z.id.clone(),
                name: z.name.clone(),
            },
            |z| z.id.clone(),
        )
    }

    #[test]
    fn plain_is_one_id_per_line() {
        assert_eq!(render(&OutputFormat::Plain), "z1\nz2");
    }

    #[test]
    fn compact_json_keeps_backend_fields() {
        assert_eq!(
            render(&OutputFormat::JsonCompact),
            r#"[{"id":"z1","name":"Lobby"},{"id":"z2","name":"Garage"}]"#
        );
    }

    #[test]
    fn table_uses_row_headers() {
        let out = render(&OutputFormat::Table);
        assert!(out.contains("Name"));
        assert!(out.contains("Garage"));
    }

    #[test]
    fn records_are_single_line_json_or_yaml_documents() {
        let zone = &zones()[0];
        assert_eq!(
            render_record(&OutputFormat::Json, zone).as_deref(),
            Some(r#"{"id":"z1","name":"Lobby"}"#)
        );
        let yaml = render_record(&OutputFormat::Yaml, zone).unwrap_or_default();
        assert!(yaml.starts_with("id: z1"));
        assert!(yaml.ends_with("\n---"));
        assert!(render_record(&OutputFormat::Plain, zone).is_none());
    }
}
