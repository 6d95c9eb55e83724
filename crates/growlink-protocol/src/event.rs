use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ProtocolError, Result};
use crate::status::FieldBusReport;
use crate::warning::Warning;

/// Known inbound event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SensorUpdate,
    ActuatorState,
    Ack,
    StatusUpdate,
    WarningIssued,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::SensorUpdate,
        EventKind::ActuatorState,
        EventKind::Ack,
        EventKind::StatusUpdate,
        EventKind::WarningIssued,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SensorUpdate => "sensor_update",
            EventKind::ActuatorState => "actuator_state",
            EventKind::Ack => "ack",
            EventKind::StatusUpdate => "status_update",
            EventKind::WarningIssued => "warning_issued",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded event with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// Telemetry, passed through untouched.
    SensorUpdate(Value),
    ActuatorState(Value),
    Ack(Value),
    StatusUpdate(FieldBusReport),
    WarningIssued(Warning),
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::SensorUpdate(_) => EventKind::SensorUpdate,
            WorkerEvent::ActuatorState(_) => EventKind::ActuatorState,
            WorkerEvent::Ack(_) => EventKind::Ack,
            WorkerEvent::StatusUpdate(_) => EventKind::StatusUpdate,
            WorkerEvent::WarningIssued(_) => EventKind::WarningIssued,
        }
    }
}

/// One inbound protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event(WorkerEvent),
    /// An event name this version does not know. Callers ignore it.
    Unknown { event: String },
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Decode one frame of wire text.
///
/// Unknown event names decode successfully as [`Inbound::Unknown`]; a known
/// event whose payload does not match its kind is an error.
pub fn decode_message(text: &str) -> Result<Inbound> {
    let Envelope { event, data } = serde_json::from_str(text)?;

    let Some(kind) = EventKind::from_wire(&event) else {
        return Ok(Inbound::Unknown { event });
    };

    let typed = |source| ProtocolError::InvalidPayload {
        event: kind.as_str(),
        source,
    };

    let event = match kind {
        EventKind::SensorUpdate => WorkerEvent::SensorUpdate(data),
        EventKind::ActuatorState => WorkerEvent::ActuatorState(data),
        EventKind::Ack => WorkerEvent::Ack(data),
        EventKind::StatusUpdate => {
            WorkerEvent::StatusUpdate(serde_json::from_value(data).map_err(typed)?)
        }
        EventKind::WarningIssued => {
            WorkerEvent::WarningIssued(serde_json::from_value(data).map_err(typed)?)
        }
    };
    Ok(Inbound::Event(event))
}
