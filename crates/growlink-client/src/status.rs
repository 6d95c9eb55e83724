use growlink_protocol::{ConnectionStatus, FieldBusReport, FieldBusState, LinkStatus, WorkerState};
use tokio::sync::watch;

/// Owner of the composite [`ConnectionStatus`].
///
/// Only the connection task writes; handles read through watch receivers.
/// Worker-link mutators report whether the status actually changed so the
/// caller knows when to broadcast. Field bus reports always count as a change.
#[derive(Debug)]
pub(crate) struct StatusTracker {
    tx: watch::Sender<ConnectionStatus>,
}

impl StatusTracker {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionStatus::default());
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> ConnectionStatus {
        self.tx.borrow().clone()
    }

    /// Move the worker link to `state`. Reaching `Connected` clears the
    /// recorded error.
    pub(crate) fn set_worker_state(&self, state: WorkerState) -> bool {
        self.tx.send_if_modified(|status| {
            let clears_error = state == WorkerState::Connected && status.worker.error.is_some();
            if status.worker.state == state && !clears_error {
                return false;
            }
            status.worker.state = state;
            if state == WorkerState::Connected {
                status.worker.error = None;
            }
            true
        })
    }

    /// Attach an error to the worker link without changing its state.
    pub(crate) fn record_worker_error(&self, message: String) -> bool {
        self.tx.send_if_modified(|status| {
            if status.worker.error.as_deref() == Some(message.as_str()) {
                return false;
            }
            status.worker.error = Some(message);
            true
        })
    }

    /// Replace the field bus sub-state. The worker sub-state is untouched.
    ///
    /// Every report notifies subscribers, even when it repeats the last one.
    pub(crate) fn apply_field_bus(&self, report: FieldBusReport) {
        self.tx.send_modify(|status| {
            status.field_bus = LinkStatus {
                state: report.status,
                error: report.error,
            };
        });
    }

    /// The session ended. The worker is gone, so nothing it said about the
    /// field bus still holds.
    pub(crate) fn worker_lost(&self) -> bool {
        self.tx.send_if_modified(|status| {
            let next_bus = LinkStatus::new(FieldBusState::Disconnected);
            if status.worker.state == WorkerState::Disconnected && status.field_bus == next_bus {
                return false;
            }
            status.worker.state = WorkerState::Disconnected;
            status.field_bus = next_bus;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: FieldBusState, error: Option<&str>) -> FieldBusReport {
        FieldBusReport {
            status,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn field_bus_update_leaves_worker_alone() {
        let tracker = StatusTracker::new();
        tracker.set_worker_state(WorkerState::Connected);
        tracker.record_worker_error("reset by peer".to_string());
        let before = tracker.snapshot().worker;

        tracker.apply_field_bus(report(FieldBusState::Fail, Some("timeout")));

        let after = tracker.snapshot();
        assert_eq!(after.worker, before);
        assert_eq!(after.field_bus.state, FieldBusState::Fail);
        assert_eq!(after.field_bus.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn connected_clears_error() {
        let tracker = StatusTracker::new();
        tracker.record_worker_error("connection refused".to_string());
        assert!(tracker.set_worker_state(WorkerState::Connecting));
        assert_eq!(
            tracker.snapshot().worker.error.as_deref(),
            Some("connection refused")
        );

        assert!(tracker.set_worker_state(WorkerState::Connected));
        assert!(tracker.snapshot().worker.error.is_none());
    }

    #[test]
    fn unchanged_updates_report_no_change() {
        let tracker = StatusTracker::new();
        assert!(!tracker.set_worker_state(WorkerState::Disconnected));
        assert!(tracker.record_worker_error("eof".to_string()));
        assert!(!tracker.record_worker_error("eof".to_string()));
    }

    #[test]
    fn repeated_field_bus_report_still_notifies() {
        let tracker = StatusTracker::new();
        let mut rx = tracker.subscribe();
        tracker.apply_field_bus(report(FieldBusState::Fail, Some("timeout")));
        rx.borrow_and_update();

        tracker.apply_field_bus(report(FieldBusState::Fail, Some("timeout")));
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn worker_lost_resets_field_bus() {
        let tracker = StatusTracker::new();
        tracker.set_worker_state(WorkerState::Connected);
        tracker.apply_field_bus(report(FieldBusState::Connected, None));

        assert!(tracker.worker_lost());

        let status = tracker.snapshot();
        assert_eq!(status.worker.state, WorkerState::Disconnected);
        assert_eq!(status.field_bus, LinkStatus::new(FieldBusState::Disconnected));
        assert!(!tracker.worker_lost());
    }

    #[test]
    fn subscribers_see_changes() {
        let tracker = StatusTracker::new();
        let mut rx = tracker.subscribe();
        tracker.set_worker_state(WorkerState::Connecting);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().worker.state, WorkerState::Connecting);
    }
}
