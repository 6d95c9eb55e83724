use tracing::info;

use crate::cmd::{channel_client, Context, MonitorArgs};
use crate::exit::{CliError, CliResult, SUCCESS, TRANSPORT_ERROR};
use crate::output::print_event;

pub async fn run(args: MonitorArgs, ctx: &Context) -> CliResult<i32> {
    let (client, mut events) = channel_client(ctx)?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed = 0usize;
    let mut gave_up = false;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    // The manager only drops its sink when it stops retrying.
                    gave_up = true;
                    break;
                };
                print_event(&event, ctx.format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
        }
    }

    let last = client.status();
    client.close().await;

    if gave_up {
        let reason = last.worker.error.unwrap_or_else(|| "no error recorded".to_string());
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!("gave up reconnecting to worker: {reason}"),
        ));
    }
    Ok(SUCCESS)
}
