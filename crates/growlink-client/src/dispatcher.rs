use growlink_protocol::{decode_message, Inbound, WorkerEvent};
use tracing::{debug, warn};

use crate::gateway::Gateway;

/// Route one inbound frame. Undecodable frames and unknown events are logged
/// and dropped; the session carries on either way.
pub(crate) fn dispatch(gateway: &Gateway, text: &str) {
    let event = match decode_message(text) {
        Ok(Inbound::Event(event)) => event,
        Ok(Inbound::Unknown { event }) => {
            warn!(%event, "ignoring unknown worker event");
            return;
        }
        Err(err) => {
            warn!(%err, frame_len = text.len(), "dropping undecodable frame");
            return;
        }
    };

    let kind = event.kind();
    match event {
        WorkerEvent::StatusUpdate(report) => gateway.apply_field_bus(report),
        WorkerEvent::SensorUpdate(data) => gateway.telemetry(&data),
        WorkerEvent::WarningIssued(warning) => gateway.upsert_warning(warning),
        WorkerEvent::ActuatorState(_) | WorkerEvent::Ack(_) => {
            debug!(event = %kind, "no handler registered");
        }
    }
}
