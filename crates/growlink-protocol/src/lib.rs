//! Typed messages for the greenhouse worker protocol.
//!
//! Inbound frames are `{"event": <kind>, "data": <payload>}` objects; outbound
//! frames are [`Command`] objects. Status strings are decoded into closed enums
//! here so nothing above this layer handles raw strings.

pub mod command;
pub mod error;
pub mod event;
pub mod status;
pub mod warning;

pub use command::{ActuatorId, Command, CommandKind, CommandValue};
pub use error::{ProtocolError, Result};
pub use event::{decode_message, EventKind, Inbound, WorkerEvent};
pub use status::{ConnectionStatus, FieldBusReport, FieldBusState, LinkStatus, WorkerState};
pub use warning::{Warning, WarningId};
