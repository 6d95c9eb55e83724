//! Link between a host application and the greenhouse worker process.
//!
//! The worker owns the sensors and actuators and speaks newline-delimited
//! JSON over a local socket. growlink connects to it, keeps the connection
//! alive and turns the event stream into typed status, telemetry and
//! warnings.
//!
//! # Crate Structure
//!
//! - [`transport`]: local socket connector and listener
//! - [`frame`]: newline-delimited framing
//! - [`protocol`]: typed inbound events and outbound commands
//! - [`client`]: the connection manager (behind the `client` feature, on by default)

/// Re-export transport types.
pub mod transport {
    pub use growlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use growlink_frame::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use growlink_protocol::*;
}

/// Re-export connection manager types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use growlink_client::*;
}
