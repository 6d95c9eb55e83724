use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Warning identity. The worker sends either strings or numbers; the two are
/// never equal to each other (`"7"` and `7` are different warnings).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WarningId {
    Text(String),
    Number(Number),
}

impl fmt::Display for WarningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningId::Text(text) => f.write_str(text),
            WarningId::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for WarningId {
    fn from(value: &str) -> Self {
        WarningId::Text(value.to_string())
    }
}

impl From<u64> for WarningId {
    fn from(value: u64) -> Self {
        WarningId::Number(value.into())
    }
}

/// A warning raised by the worker.
///
/// Only `id` has meaning to the connection manager and only `id` is
/// validated. Every other field is kept as the worker sent it, whatever its
/// type, and serialized back out unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Warning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WarningId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Warning {
    pub fn new(id: impl Into<WarningId>, message: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::anonymous(message)
        }
    }

    /// A warning with no id. Anonymous warnings are never deduplicated.
    pub fn anonymous(message: impl Into<String>) -> Self {
        Self::default().with_field("message", message.into())
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The `message` field, when the worker sent it as a string.
    pub fn message(&self) -> Option<&str> {
        self.field("message").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_string_and_numeric_ids() {
        let text: Warning = serde_json::from_str(r#"{"id":"w1","message":"hot"}"#).unwrap();
        let number: Warning = serde_json::from_str(r#"{"id":7,"message":"cold"}"#).unwrap();

        assert_eq!(text.id, Some(WarningId::from("w1")));
        assert_eq!(number.id, Some(WarningId::from(7)));
        assert_ne!(WarningId::from("7"), WarningId::from(7));
    }

    #[test]
    fn fields_round_trip() {
        let raw = serde_json::json!({
            "id": "w2",
            "message": "high co2",
            "severity": "high",
            "timestamp": 1_700_000_000_000u64,
            "type": "high_co2",
            "location": "bay 3",
            "currentValue": 1450
        });
        let warning: Warning = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(warning.field("severity"), Some(&Value::from("high")));
        assert_eq!(warning.field("location"), Some(&Value::from("bay 3")));
        assert_eq!(serde_json::to_value(&warning).unwrap(), raw);
    }

    #[test]
    fn missing_id_is_anonymous() {
        let warning: Warning = serde_json::from_str(r#"{"message":"fan failure"}"#).unwrap();
        assert!(warning.id.is_none());
        assert_eq!(warning, Warning::anonymous("fan failure"));
    }

    #[test]
    fn loosely_typed_fields_are_accepted() {
        let warning: Warning = serde_json::from_str(
            r#"{"id":"w3","message":null,"severity":2,"timestamp":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(warning.id, Some(WarningId::from("w3")));
        assert_eq!(warning.message(), None);
        assert_eq!(warning.field("severity"), Some(&Value::from(2)));
        assert_eq!(
            warning.field("timestamp"),
            Some(&Value::from("2024-05-01T10:00:00Z"))
        );
    }

    #[test]
    fn bad_id_is_rejected() {
        assert!(serde_json::from_str::<Warning>(r#"{"id":true,"message":"x"}"#).is_err());
    }
}
