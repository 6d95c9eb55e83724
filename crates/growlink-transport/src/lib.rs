//! Local socket transport to the greenhouse worker.
//!
//! The worker owns the sensor and actuator hardware and listens on a
//! filesystem-path Unix domain socket. This crate provides:
//! - [`Connector`], the socket factory the connection manager is built on
//! - [`UnixSocketConnector`], the production connector
//! - [`UnixDomainSocket`], the listening side (used by test and mock workers)
//!
//! This is the lowest layer of growlink.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use traits::{Connector, WorkerStream};

#[cfg(unix)]
pub use uds::{UnixDomainSocket, UnixSocketConnector};

/// Socket path the worker listens on unless configured otherwise.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/greenhouse.sock";
