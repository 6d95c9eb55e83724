use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use growlink_protocol::{Command, ConnectionStatus, Warning};
use growlink_transport::Connector;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::connection::ConnectionTask;
use crate::gateway::{EventSink, Gateway, NullSink};
use crate::warnings::{WarningCache, WarningSource};

/// Handle to a running connection manager.
///
/// Created with [`WorkerClient::builder`]. The manager runs as its own tokio
/// task; this handle only reads snapshots and queues commands, so every
/// method returns without waiting on the socket. Dropping the handle shuts
/// the manager down; [`close`](Self::close) does the same and waits for it.
pub struct WorkerClient {
    status: watch::Receiver<ConnectionStatus>,
    warnings: Arc<RwLock<WarningCache>>,
    commands: mpsc::UnboundedSender<Command>,
    attempts: Arc<AtomicU64>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WorkerClient {
    pub fn builder<C: Connector>(connector: C) -> WorkerClientBuilder<C> {
        WorkerClientBuilder {
            connector,
            config: ClientConfig::default(),
            sink: Box::new(NullSink),
            cached: WarningCache::new(),
        }
    }

    /// Start a manager with default configuration and no push sink.
    pub fn spawn<C: Connector>(connector: C) -> Self {
        Self::builder(connector).spawn()
    }

    /// Current composite status.
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// A receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Current warning snapshot, in cache order.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Send a command to the worker, at most once.
    ///
    /// If the worker is not connected right now the command is dropped
    /// without error. Nothing is queued for a later connection.
    pub fn send_command(&self, command: Command) {
        if !self.status.borrow().is_connected() {
            debug!(cmd = ?command.cmd, "dropping command; worker not connected");
            return;
        }
        if self.commands.send(command).is_err() {
            debug!("connection task has stopped; command dropped");
        }
    }

    /// Retries made by the current (or last) reconnection sequence.
    pub fn reconnect_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Whether the manager task has exited, either after `close` or because
    /// reconnection gave up.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the manager and wait until the socket and timers are released.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(%err, "connection task ended abnormally");
            }
        }
    }
}

impl Drop for WorkerClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for WorkerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerClient")
            .field("status", &*self.status.borrow())
            .field("reconnect_attempts", &self.reconnect_attempts())
            .finish()
    }
}

/// Configures and starts a [`WorkerClient`].
pub struct WorkerClientBuilder<C: Connector> {
    connector: C,
    config: ClientConfig,
    sink: Box<dyn EventSink>,
    cached: WarningCache,
}

impl<C: Connector> WorkerClientBuilder<C> {
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sink(mut self, sink: impl EventSink) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Seed the warning cache from persisted state. The source is read once,
    /// here.
    pub fn with_cached_warnings(mut self, source: impl WarningSource) -> Self {
        self.cached.load(source.cached_warnings());
        self
    }

    /// Start the manager. The first connection attempt begins immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> WorkerClient {
        let gateway = Gateway::new(self.sink, self.cached);
        let status = gateway.status_receiver();
        let warnings = gateway.warnings();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let attempts = Arc::new(AtomicU64::new(0));
        let cancel = CancellationToken::new();

        let task = ConnectionTask {
            connector: self.connector,
            config: self.config,
            gateway,
            commands: commands_rx,
            cancel: cancel.clone(),
            attempts: Arc::clone(&attempts),
        };

        WorkerClient {
            status,
            warnings,
            commands: commands_tx,
            attempts,
            cancel,
            task: Some(tokio::spawn(task.run())),
        }
    }
}
