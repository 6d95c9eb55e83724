use std::fmt;

use serde::{Deserialize, Serialize};

/// Health of the socket link to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Health of the hardware bus behind the worker, as the worker reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldBusState {
    #[default]
    Disconnected,
    Fail,
    Connected,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkerState::Disconnected => "disconnected",
            WorkerState::Connecting => "connecting",
            WorkerState::Connected => "connected",
        })
    }
}

impl fmt::Display for FieldBusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldBusState::Disconnected => "disconnected",
            FieldBusState::Fail => "fail",
            FieldBusState::Connected => "connected",
        })
    }
}

/// One link's state plus the last error recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkStatus<S> {
    pub state: S,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<S> LinkStatus<S> {
    pub fn new(state: S) -> Self {
        Self { state, error: None }
    }
}

/// Composite health published to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub worker: LinkStatus<WorkerState>,
    pub field_bus: LinkStatus<FieldBusState>,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        self.worker.state == WorkerState::Connected
    }
}

/// Payload of a `status_update` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBusReport {
    pub status: FieldBusState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
