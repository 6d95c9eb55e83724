/// Errors raised inside the connection manager.
///
/// None of these reach callers of [`WorkerClient`](crate::WorkerClient); they
/// are logged and folded into the worker's status error string.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] growlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] growlink_frame::FrameError),

    /// Protocol decode error.
    #[error("protocol error: {0}")]
    Protocol(#[from] growlink_protocol::ProtocolError),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
