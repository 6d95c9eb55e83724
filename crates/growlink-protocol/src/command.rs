use std::fmt;

use serde::{Deserialize, Serialize};

/// Outbound command verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    SetStage,
    ManualOverride,
    EnableAuto,
}

/// Actuator name. Opaque to this crate; the worker defines the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorId(pub String);

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActuatorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Value for a manual override: a switch or a setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandValue {
    Switch(bool),
    Level(f64),
}

impl From<bool> for CommandValue {
    fn from(value: bool) -> Self {
        CommandValue::Switch(value)
    }
}

impl From<f64> for CommandValue {
    fn from(value: f64) -> Self {
        CommandValue::Level(value)
    }
}

/// A command for the worker. Delivery is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub cmd: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actuator: Option<ActuatorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CommandValue>,
}

impl Command {
    pub fn set_stage(stage: i64) -> Self {
        Self {
            cmd: CommandKind::SetStage,
            stage: Some(stage),
            actuator: None,
            value: None,
        }
    }

    pub fn manual_override(actuator: impl Into<ActuatorId>, value: impl Into<CommandValue>) -> Self {
        Self {
            cmd: CommandKind::ManualOverride,
            stage: None,
            actuator: Some(actuator.into()),
            value: Some(value.into()),
        }
    }

    pub fn enable_auto() -> Self {
        Self {
            cmd: CommandKind::EnableAuto,
            stage: None,
            actuator: None,
            value: None,
        }
    }

    /// Wire text for this command, without the frame delimiter.
    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
