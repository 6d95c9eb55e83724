//! Connection manager for the greenhouse worker process.
//!
//! A [`WorkerClient`] owns one background task that connects to the worker,
//! reads its newline-delimited event stream, tracks link health, caches
//! warnings and forwards everything to an [`EventSink`]. It reconnects on
//! its own at a fixed interval, and gives up after a ceiling
//! ([`ReconnectPolicy`]). The worker link reads `Connecting` for as long as
//! a reconnection sequence runs.
//!
//! ```no_run
//! # async fn demo() {
//! use growlink_client::{ChannelSink, WorkerClient};
//! use growlink_transport::UnixSocketConnector;
//!
//! let (sink, mut events) = ChannelSink::new();
//! let client = WorkerClient::builder(UnixSocketConnector::new("/tmp/greenhouse.sock"))
//!     .with_sink(sink)
//!     .spawn();
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! client.close().await;
//! # }
//! ```

mod client;
pub mod config;
mod connection;
mod dispatcher;
pub mod error;
mod gateway;
mod status;
pub mod warnings;

pub use client::{WorkerClient, WorkerClientBuilder};
pub use config::{ClientConfig, ReconnectPolicy, DEFAULT_RECONNECT_CEILING, DEFAULT_RECONNECT_INTERVAL};
pub use error::{ClientError, Result};
pub use gateway::{ChannelSink, EventSink, GatewayEvent, NullSink};
pub use warnings::{WarningCache, WarningSource};
