use std::sync::{Arc, PoisonError, RwLock};

use growlink_protocol::{ConnectionStatus, FieldBusReport, Warning, WorkerState};
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::status::StatusTracker;
use crate::warnings::WarningCache;

/// Push side of the client: receives every status change, telemetry point
/// and warning in the order the connection task produced them.
///
/// Calls are made from the connection task and must not block.
pub trait EventSink: Send + Sync + 'static {
    fn status_changed(&self, status: &ConnectionStatus);
    fn telemetry(&self, data: &Value);
    fn warning(&self, warning: &Warning);
}

/// One pushed event, as delivered by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    Status(ConnectionStatus),
    Telemetry(Value),
    Warning(Warning),
}

/// Forwards events over an unbounded channel. Nothing is coalesced.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<GatewayEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GatewayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: GatewayEvent) {
        // A dropped receiver means nobody is listening.
        let _ = self.tx.send(event);
    }
}

impl EventSink for ChannelSink {
    fn status_changed(&self, status: &ConnectionStatus) {
        self.forward(GatewayEvent::Status(status.clone()));
    }

    fn telemetry(&self, data: &Value) {
        self.forward(GatewayEvent::Telemetry(data.clone()));
    }

    fn warning(&self, warning: &Warning) {
        self.forward(GatewayEvent::Warning(warning.clone()));
    }
}

/// Discards every event. For callers that only poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn status_changed(&self, _status: &ConnectionStatus) {}
    fn telemetry(&self, _data: &Value) {}
    fn warning(&self, _warning: &Warning) {}
}

/// State owned by the connection task, paired with the sink it reports to.
pub(crate) struct Gateway {
    status: StatusTracker,
    warnings: Arc<RwLock<WarningCache>>,
    sink: Box<dyn EventSink>,
}

impl Gateway {
    pub(crate) fn new(sink: Box<dyn EventSink>, warnings: WarningCache) -> Self {
        Self {
            status: StatusTracker::new(),
            warnings: Arc::new(RwLock::new(warnings)),
            sink,
        }
    }

    pub(crate) fn status_receiver(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub(crate) fn warnings(&self) -> Arc<RwLock<WarningCache>> {
        Arc::clone(&self.warnings)
    }

    pub(crate) fn set_worker_state(&self, state: WorkerState) {
        let changed = self.status.set_worker_state(state);
        self.publish_if(changed);
    }

    pub(crate) fn record_worker_error(&self, message: String) {
        let changed = self.status.record_worker_error(message);
        self.publish_if(changed);
    }

    /// One broadcast per report, repeated or not.
    pub(crate) fn apply_field_bus(&self, report: FieldBusReport) {
        self.status.apply_field_bus(report);
        self.publish();
    }

    pub(crate) fn worker_lost(&self) {
        let changed = self.status.worker_lost();
        self.publish_if(changed);
    }

    pub(crate) fn telemetry(&self, data: &Value) {
        self.sink.telemetry(data);
    }

    /// Cache the warning, then push that single warning.
    pub(crate) fn upsert_warning(&self, warning: Warning) {
        self.warnings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .upsert(warning.clone());
        self.sink.warning(&warning);
    }

    fn publish_if(&self, changed: bool) {
        if changed {
            self.publish();
        }
    }

    fn publish(&self) {
        self.sink.status_changed(&self.status.snapshot());
    }
}
