//! Alert command handlers.

use tabled::Tabled;
use vigil_core::Backend;
use vigil_core::model::Alert;

use crate::cli::{AlertsArgs, AlertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Type")]
    alert_type: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&Alert> for AlertRow {
    fn from(a: &Alert) -> Self {
        Self {
            id: a.id.clone(),
            time: a.created_at.as_deref().map_or_else(|| "-".into(), format_time),
            alert_type: util::or_dash(a.alert_type.as_deref()),
            severity: util::or_dash(a.severity.as_deref()),
            message: util::or_dash(a.message.as_deref()),
        }
    }
}

/// RFC 3339 timestamps shown in local time; anything else as sent.
fn format_time(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_owned(),
        |t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    backend: &Backend,
    args: AlertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AlertsCommand::List { device, limit } => {
            let mut alerts = backend
                .device_alerts(&device)
                .await
                .map_err(|e| CliError::from(e).for_resource("device", "cameras list"))?;
            if let Some(limit) = limit {
                alerts.truncate(limit);
            }
            let out = output::render_list(&global.output, &alerts, |a| AlertRow::from(a), |a| a.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_times_pass_through() {
        assert_eq!(format_time("yesterday"), "yesterday");
        assert_eq!(format_time("2026-03-01T10:00:00Z").len(), 19);
    }
}
