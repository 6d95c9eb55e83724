/// Errors that can occur while decoding worker messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame was not a JSON object of the expected shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A known event carried a payload that does not fit its kind.
    #[error("invalid {event} payload: {source}")]
    InvalidPayload {
        event: &'static str,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
