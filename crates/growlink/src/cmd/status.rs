use growlink_protocol::{ConnectionStatus, FieldBusState};

use crate::cmd::{client_builder, Context, StatusArgs};
use crate::exit::{CliResult, FAILURE, SUCCESS};
use crate::output::print_status;

pub async fn run(args: StatusArgs, ctx: &Context) -> CliResult<i32> {
    let client = client_builder(ctx)?.spawn();
    let mut updates = client.watch_status();

    // Settled once the worker is up and has said something about the bus.
    let _ = tokio::time::timeout(args.settle, updates.wait_for(reported)).await;

    let status = client.status();
    let warnings = client.warnings();
    client.close().await;

    print_status(&status, &warnings, ctx.format);
    Ok(if status.is_connected() { SUCCESS } else { FAILURE })
}

fn reported(status: &ConnectionStatus) -> bool {
    status.is_connected() && status.field_bus.state != FieldBusState::Disconnected
}
