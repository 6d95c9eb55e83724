use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use growlink_frame::{Decoded, Frame, LineCodec};
use growlink_protocol::{Command, WorkerState};
use growlink_transport::Connector;
use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::dispatcher::dispatch;
use crate::error::Result;
use crate::gateway::Gateway;

enum SessionEnd {
    /// The worker went away. Reconnect.
    Closed,
    /// The client is shutting down.
    Shutdown,
}

/// The single owner of the socket and of all status and warning mutations.
pub(crate) struct ConnectionTask<C: Connector> {
    pub(crate) connector: C,
    pub(crate) config: ClientConfig,
    pub(crate) gateway: Gateway,
    pub(crate) commands: mpsc::UnboundedReceiver<Command>,
    pub(crate) cancel: CancellationToken,
    pub(crate) attempts: Arc<AtomicU64>,
}

impl<C: Connector> ConnectionTask<C> {
    pub(crate) async fn run(mut self) {
        let endpoint = self.connector.endpoint();
        let mut first = true;

        while let Some(stream) = self.establish(&endpoint, first).await {
            first = false;
            match self.run_session(stream).await {
                SessionEnd::Closed => {
                    self.gateway.worker_lost();
                    self.drop_queued_commands();
                }
                SessionEnd::Shutdown => break,
            }
        }

        self.gateway.worker_lost();
        debug!(%endpoint, "connection task finished");
    }

    /// Open a connection, retrying at a fixed interval until the reconnect
    /// ceiling. Returns `None` on shutdown or when the ceiling is reached.
    ///
    /// The worker stays `Connecting` for the whole sequence; failed attempts
    /// only update the recorded error. `Disconnected` is published once, when
    /// the sequence gives up. The first attempt is always immediate. After a
    /// lost session it already counts as a reconnect attempt.
    async fn establish(&mut self, endpoint: &str, first: bool) -> Option<C::Stream> {
        let policy = self.config.reconnect;
        let started = Instant::now();
        let mut reconnecting = !first;
        self.attempts.store(0, Ordering::Relaxed);
        self.gateway.set_worker_state(WorkerState::Connecting);

        loop {
            if reconnecting {
                let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                info!(%endpoint, attempt, "reconnecting to worker");
            }
            reconnecting = true;

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                result = self.connector.connect() => result,
            };

            match result {
                Ok(stream) => {
                    info!(%endpoint, "connected to worker");
                    self.gateway.set_worker_state(WorkerState::Connected);
                    return Some(stream);
                }
                Err(err) => {
                    warn!(%endpoint, %err, "worker connection attempt failed");
                    self.gateway.record_worker_error(err.to_string());
                }
            }

            if started.elapsed() >= policy.ceiling {
                error!(
                    %endpoint,
                    attempts = self.attempts.load(Ordering::Relaxed),
                    ceiling = ?policy.ceiling,
                    "giving up on worker connection"
                );
                self.gateway.set_worker_state(WorkerState::Disconnected);
                return None;
            }
            if !self.pause(Instant::now() + policy.interval).await {
                return None;
            }
        }
    }

    /// Sleep until `deadline`. Returns `false` if shutdown interrupted it.
    async fn pause(&mut self, deadline: Instant) -> bool {
        let sleep = sleep_until(deadline);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                _ = &mut sleep => return true,
                Some(command) = self.commands.recv() => {
                    debug!(cmd = ?command.cmd, "dropping command; worker not connected");
                }
            }
        }
    }

    async fn run_session(&mut self, stream: C::Stream) -> SessionEnd {
        let (reader, writer) = tokio::io::split(stream);
        let mut frames = FramedRead::new(reader, LineCodec::with_config(self.config.frame.clone()));
        let mut sink = FramedWrite::new(writer, LineCodec::with_config(self.config.frame.clone()));

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    // Commands accepted before close still go out.
                    while let Ok(command) = self.commands.try_recv() {
                        if let Err(err) = write_command(&mut sink, &command).await {
                            warn!(%err, cmd = ?command.cmd, "failed to send command");
                            break;
                        }
                    }
                    if let Err(err) = sink.close().await {
                        debug!(%err, "closing worker socket");
                    }
                    info!("worker session closed by client");
                    return SessionEnd::Shutdown;
                }
                item = frames.next() => match item {
                    Some(Ok(Decoded::Frame(frame))) => dispatch(&self.gateway, frame.as_str()),
                    Some(Ok(Decoded::Discarded(err))) => warn!(%err, "dropping malformed frame"),
                    Some(Err(err)) => {
                        warn!(%err, "worker socket error");
                        self.gateway.record_worker_error(err.to_string());
                        return SessionEnd::Closed;
                    }
                    None => {
                        info!("worker closed the connection");
                        return SessionEnd::Closed;
                    }
                },
                Some(command) = self.commands.recv() => {
                    if let Err(err) = write_command(&mut sink, &command).await {
                        warn!(%err, cmd = ?command.cmd, "failed to send command");
                        self.gateway.record_worker_error(err.to_string());
                    }
                }
            }
        }
    }

    /// Commands queued for a session that has ended are never replayed.
    fn drop_queued_commands(&mut self) {
        let mut dropped = 0usize;
        while self.commands.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "discarded commands queued for the closed session");
        }
    }
}

async fn write_command<S>(
    sink: &mut FramedWrite<WriteHalf<S>, LineCodec>,
    command: &Command,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let text = command.to_wire()?;
    sink.send(Frame::new(text)).await?;
    debug!(cmd = ?command.cmd, "command sent");
    Ok(())
}
