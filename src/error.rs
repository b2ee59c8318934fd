//! Error types for runpack encoding and decoding operations.

use std::fmt;

/// Error returned when decoding or seeking fails.
///
/// Every variant is fatal for the codec instance that produced it: run state
/// is not guaranteed to be consistent afterwards and the caller should drop
/// the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Stream is truncated or its bytes do not form a valid run
    Parse(&'static str),
    /// A bit width outside the supported 1-64 range reached the bit-pack
    /// primitives (unreachable for conformant streams)
    NotImplemented(&'static str),
    /// Seek target lies beyond the end of the input
    OutOfRange { offset: u64, len: u64 },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(reason) => write!(f, "malformed RLEv2 stream: {reason}"),
            Self::NotImplemented(reason) => write!(f, "not implemented: {reason}"),
            Self::OutOfRange { offset, len } => {
                write!(f, "seek offset {offset} is past the end of the input ({len} bytes)")
            }
        }
    }
}

impl std::error::Error for Error {}
