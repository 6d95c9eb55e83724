use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand};
use growlink_client::{ChannelSink, WorkerClient, WorkerClientBuilder};
use growlink_protocol::{CommandValue, Warning};
use growlink_transport::UnixSocketConnector;

use crate::exit::{io_error, json_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod mock_worker;
pub mod monitor;
pub mod send;
pub mod status;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print status changes, telemetry and warnings as they arrive.
    Monitor(MonitorArgs),
    /// Connect, wait for the link to settle, print status and warnings.
    Status(StatusArgs),
    /// Send one command to the worker.
    Send(SendArgs),
    /// Run a stand-in worker that replays scripted frames.
    MockWorker(MockWorkerArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every subcommand that talks to the worker.
#[derive(Debug, Clone)]
pub struct Context {
    pub socket: PathBuf,
    pub warnings_file: Option<PathBuf>,
    pub format: OutputFormat,
}

pub async fn run(command: Command, ctx: Context) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, &ctx).await,
        Command::Status(args) => status::run(args, &ctx).await,
        Command::Send(args) => send::run(args, &ctx).await,
        Command::MockWorker(args) => mock_worker::run(args).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// How long to wait for a connection before reporting (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub settle: Duration,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(subcommand)]
    pub command: SendCommand,
    /// How long to wait for a connection (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", value_parser = parse_duration, global = true)]
    pub timeout: Duration,
}

#[derive(Subcommand, Debug)]
pub enum SendCommand {
    /// Switch the growth stage.
    SetStage {
        #[arg(long)]
        stage: i64,
    },
    /// Force one actuator to a value.
    Override {
        /// Actuator name (fan, pump, light, climate, ...).
        #[arg(long)]
        actuator: String,
        /// `on`/`off`/`true`/`false`, or a number.
        #[arg(long, value_parser = parse_command_value, allow_hyphen_values = true)]
        value: CommandValue,
    },
    /// Hand control back to the automatic schedule.
    Auto,
}

#[derive(Args, Debug)]
pub struct MockWorkerArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// File of frames to replay, one JSON object per line.
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,
    /// Pause between replayed frames (e.g. 100ms).
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    pub interval: Duration,
    /// Exit after receiving N commands.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Builder for a client on the configured socket, seeded from the warnings
/// file when one is given.
pub fn client_builder(ctx: &Context) -> CliResult<WorkerClientBuilder<UnixSocketConnector>> {
    let builder = WorkerClient::builder(UnixSocketConnector::new(&ctx.socket));
    match &ctx.warnings_file {
        Some(path) => Ok(builder.with_cached_warnings(load_warnings(path)?)),
        None => Ok(builder),
    }
}

/// Like [`client_builder`], with events delivered over a channel.
pub fn channel_client(
    ctx: &Context,
) -> CliResult<(
    WorkerClient,
    tokio::sync::mpsc::UnboundedReceiver<growlink_client::GatewayEvent>,
)> {
    let (sink, events) = ChannelSink::new();
    let client = client_builder(ctx)?.with_sink(sink).spawn();
    Ok((client, events))
}

fn load_warnings(path: &Path) -> CliResult<Vec<Warning>> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    serde_json::from_str(&text)
        .map_err(|err| json_error(&format!("invalid warnings file {}", path.display()), err))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

pub fn parse_command_value(input: &str) -> CliResult<CommandValue> {
    match input.trim().to_ascii_lowercase().as_str() {
        "on" | "true" => Ok(CommandValue::Switch(true)),
        "off" | "false" => Ok(CommandValue::Switch(false)),
        other => other
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(CommandValue::Level)
            .ok_or_else(|| CliError::new(USAGE, format!("invalid actuator value: {input}"))),
    }
}
