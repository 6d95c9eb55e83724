use growlink_protocol::{ActuatorId, Command, ConnectionStatus};
use serde::Serialize;
use tracing::info;

use crate::cmd::{client_builder, Context, SendArgs, SendCommand};
use crate::exit::{json_error, CliError, CliResult, SUCCESS, TIMEOUT, TRANSPORT_ERROR};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct SentOutput<'a> {
    sent: &'a Command,
}

pub async fn run(args: SendArgs, ctx: &Context) -> CliResult<i32> {
    let command = build_command(args.command);
    let wire = command
        .to_wire()
        .map_err(|err| json_error("failed to encode command", err))?;

    let client = client_builder(ctx)?.spawn();
    let mut updates = client.watch_status();
    let waited = tokio::time::timeout(args.timeout, updates.wait_for(ConnectionStatus::is_connected))
        .await
        .map(|result| result.is_ok());

    match waited {
        Ok(true) => {}
        Ok(false) => {
            let reason = client.status().worker.error.unwrap_or_default();
            client.close().await;
            return Err(CliError::new(
                TRANSPORT_ERROR,
                format!("worker unreachable: {reason}"),
            ));
        }
        Err(_) => {
            let reason = client.status().worker.error.unwrap_or_default();
            client.close().await;
            return Err(CliError::new(
                TIMEOUT,
                format!("worker not connected within {:?}: {reason}", args.timeout),
            ));
        }
    }

    client.send_command(command.clone());
    client.close().await;
    info!(%wire, "command sent");

    match ctx.format {
        OutputFormat::Json => print_json(&SentOutput { sent: &command }),
        OutputFormat::Table | OutputFormat::Pretty => println!("sent {wire}"),
    }
    Ok(SUCCESS)
}

fn build_command(command: SendCommand) -> Command {
    match command {
        SendCommand::SetStage { stage } => Command::set_stage(stage),
        SendCommand::Override { actuator, value } => {
            Command::manual_override(ActuatorId(actuator), value)
        }
        SendCommand::Auto => Command::enable_auto(),
    }
}
