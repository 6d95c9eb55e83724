use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use growlink_frame::{Decoded, Frame, LineCodec};
use growlink_protocol::Command;
use growlink_transport::{UnixDomainSocket, WorkerStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::cmd::MockWorkerArgs;
use crate::exit::{io_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::print_json;

/// Replayed when no script file is given.
const DEFAULT_SCRIPT: &[&str] = &[
    r#"{"event":"status_update","data":{"status":"connected"}}"#,
    r#"{"event":"sensor_update","data":{"id":"temp-1","value":22.4}}"#,
    r#"{"event":"sensor_update","data":{"id":"humidity-1","value":61}}"#,
    r#"{"event":"warning_issued","data":{"id":"co2-high","message":"CO2 above threshold","severity":"medium"}}"#,
];

pub async fn run(args: MockWorkerArgs) -> CliResult<i32> {
    let script = Arc::new(load_script(args.script.as_deref())?);
    let listener =
        UnixDomainSocket::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;
    info!(path = %args.path.display(), frames = script.len(), "mock worker listening");

    let (received_tx, mut received_rx) = mpsc::unbounded_channel();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut received = 0usize;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
            accepted = listener.accept() => {
                let stream = accepted.map_err(|err| transport_error("accept failed", err))?;
                tokio::spawn(serve(stream, Arc::clone(&script), args.interval, received_tx.clone()));
            }
            Some(command) = received_rx.recv() => {
                print_json(&command);
                received = received.saturating_add(1);
                if args.count.is_some_and(|count| received >= count) {
                    break;
                }
            }
        }
    }

    Ok(SUCCESS)
}

/// Replay the script to one client while reporting what it sends back.
async fn serve(
    stream: WorkerStream,
    script: Arc<Vec<Frame>>,
    interval: Duration,
    received: mpsc::UnboundedSender<Command>,
) {
    let (reader, writer) = tokio::io::split(stream);
    let mut frames = FramedRead::new(reader, LineCodec::new());
    let mut sink = FramedWrite::new(writer, LineCodec::new());
    let mut ticker = tokio::time::interval(interval);
    let mut next = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick(), if next < script.len() => {
                let frame = script[next].clone();
                next += 1;
                if let Err(err) = sink.send(frame).await {
                    warn!(%err, "failed to replay frame");
                    break;
                }
            }
            item = frames.next() => match item {
                Some(Ok(Decoded::Frame(frame))) => {
                    match serde_json::from_str::<Command>(frame.as_str()) {
                        Ok(command) => {
                            let _ = received.send(command);
                        }
                        Err(err) => warn!(%err, "ignoring unrecognized command"),
                    }
                }
                Some(Ok(Decoded::Discarded(err))) => warn!(%err, "dropping malformed frame"),
                Some(Err(err)) => {
                    warn!(%err, "client connection failed");
                    break;
                }
                None => {
                    debug!("client disconnected");
                    break;
                }
            }
        }
    }
}

fn load_script(path: Option<&Path>) -> CliResult<Vec<Frame>> {
    let Some(path) = path else {
        return Ok(DEFAULT_SCRIPT.iter().copied().map(Frame::new).collect());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    parse_script(&text).map_err(|message| {
        CliError::new(DATA_INVALID, format!("{}: {message}", path.display()))
    })
}

fn parse_script(text: &str) -> Result<Vec<Frame>, String> {
    let mut frames = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        serde_json::from_str::<serde_json::Value>(line)
            .map_err(|err| format!("line {}: {err}", index + 1))?;
        frames.push(Frame::new(line));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_script_is_valid() {
        let frames = load_script(None).expect("default script");
        assert_eq!(frames.len(), DEFAULT_SCRIPT.len());
        for frame in frames {
            growlink_protocol::decode_message(frame.as_str()).expect("decodes");
        }
    }

    #[test]
    fn script_skips_blank_lines_and_reports_bad_ones() {
        let frames = parse_script("{\"event\":\"ack\"}\n\n  {\"event\":\"ack\"}  \n")
            .expect("valid script");
        assert_eq!(frames, vec![Frame::new("{\"event\":\"ack\"}"); 2]);

        let err = parse_script("{\"event\":\"ack\"}\nnot json\n").unwrap_err();
        assert!(err.starts_with("line 2:"));
    }
}
