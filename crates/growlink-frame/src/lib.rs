//! Newline-delimited text framing for the worker protocol.
//!
//! Every message on the worker socket is one UTF-8 line terminated by `\n`.
//! There is no length prefix, so the decoder carries partial lines across
//! reads until the delimiter arrives. Malformed lines are reported and
//! skipped without ending the stream.

pub mod codec;
pub mod error;

pub use codec::{Decoded, Frame, FrameConfig, LineCodec, DEFAULT_MAX_FRAME_LEN, DELIMITER};
pub use error::{FrameError, Result};
