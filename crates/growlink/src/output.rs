use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use growlink_client::GatewayEvent;
use growlink_protocol::{ConnectionStatus, Warning};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct StatusReport<'a> {
    status: &'a ConnectionStatus,
    warnings: &'a [Warning],
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EventLine<'a> {
    Status { status: &'a ConnectionStatus },
    Telemetry { data: &'a Value },
    Warning { warning: &'a Warning },
}

pub fn print_status(status: &ConnectionStatus, warnings: &[Warning], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&StatusReport { status, warnings }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LINK", "STATE", "ERROR"])
                .add_row(vec![
                    "worker".to_string(),
                    status.worker.state.to_string(),
                    status.worker.error.clone().unwrap_or_default(),
                ])
                .add_row(vec![
                    "fieldBus".to_string(),
                    status.field_bus.state.to_string(),
                    status.field_bus.error.clone().unwrap_or_default(),
                ]);
            println!("{table}");
            if !warnings.is_empty() {
                println!("{}", warning_table(warnings));
            }
        }
        OutputFormat::Pretty => {
            println!("{}", status_line(status));
            for warning in warnings {
                println!("{}", warning_line(warning));
            }
        }
    }
}

pub fn print_event(event: &GatewayEvent, format: OutputFormat) {
    let line = match event {
        GatewayEvent::Status(status) => EventLine::Status { status },
        GatewayEvent::Telemetry(data) => EventLine::Telemetry { data },
        GatewayEvent::Warning(warning) => EventLine::Warning { warning },
    };
    match format {
        OutputFormat::Json => print_json(&line),
        OutputFormat::Table => {
            let (kind, detail) = match event {
                GatewayEvent::Status(status) => ("STATUS", status_line(status)),
                GatewayEvent::Telemetry(data) => ("TELEMETRY", data.to_string()),
                GatewayEvent::Warning(warning) => ("WARNING", warning_line(warning)),
            };
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .add_row(vec![kind, detail.as_str()]);
            println!("{table}");
        }
        OutputFormat::Pretty => match event {
            GatewayEvent::Status(status) => println!("status {}", status_line(status)),
            GatewayEvent::Telemetry(data) => println!("telemetry {data}"),
            GatewayEvent::Warning(warning) => println!("warning {}", warning_line(warning)),
        },
    }
}

/// One JSON document per line.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(text) => println!("{text}"),
        Err(err) => tracing::error!(%err, "failed to serialize output"),
    }
}

fn warning_table(warnings: &[Warning]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "SEVERITY", "MESSAGE"]);
    for warning in warnings {
        table.add_row(vec![
            warning
                .id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
            field_text(warning, "severity").unwrap_or_else(|| "-".to_string()),
            field_text(warning, "message").unwrap_or_default(),
        ]);
    }
    table
}

fn status_line(status: &ConnectionStatus) -> String {
    let mut line = format!(
        "worker={} fieldBus={}",
        status.worker.state, status.field_bus.state
    );
    if let Some(error) = &status.worker.error {
        line.push_str(&format!(" worker_error={error:?}"));
    }
    if let Some(error) = &status.field_bus.error {
        line.push_str(&format!(" field_bus_error={error:?}"));
    }
    line
}

fn warning_line(warning: &Warning) -> String {
    let id = warning
        .id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    let message = field_text(warning, "message").unwrap_or_default();
    match field_text(warning, "severity") {
        Some(severity) => format!("[{id}] ({severity}) {message}"),
        None => format!("[{id}] {message}"),
    }
}

/// Warning fields are whatever the worker sent; strings print bare.
fn field_text(warning: &Warning, key: &str) -> Option<String> {
    match warning.field(key)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use growlink_protocol::{FieldBusState, LinkStatus, WorkerState};

    use super::*;

    #[test]
    fn status_line_includes_errors() {
        let status = ConnectionStatus {
            worker: LinkStatus {
                state: WorkerState::Disconnected,
                error: Some("refused".to_string()),
            },
            field_bus: LinkStatus::new(FieldBusState::Disconnected),
        };
        assert_eq!(
            status_line(&status),
            "worker=disconnected fieldBus=disconnected worker_error=\"refused\""
        );
    }

    #[test]
    fn event_lines_are_tagged() {
        let data = serde_json::json!({"id": "t1"});
        let line = serde_json::to_value(EventLine::Telemetry { data: &data }).unwrap();
        assert_eq!(line, serde_json::json!({"type": "telemetry", "data": {"id": "t1"}}));
    }

    #[test]
    fn warning_line_formats_id_and_severity() {
        let warning = Warning::new("w1", "hot");
        assert_eq!(warning_line(&warning), "[w1] hot");
        let warning = warning.with_field("severity", "high");
        assert_eq!(warning_line(&warning), "[w1] (high) hot");
        assert_eq!(warning_line(&Warning::anonymous("x")), "[-] x");
    }

    #[test]
    fn warning_line_tolerates_untyped_fields() {
        let warning = Warning::new("w7", "ignored")
            .with_field("message", Value::Null)
            .with_field("severity", 3);
        assert_eq!(warning_line(&warning), "[w7] (3) ");
    }
}
