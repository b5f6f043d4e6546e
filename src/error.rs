//! Error types for secswire.

use thiserror::Error;

/// Main error type for all secswire operations.
#[derive(Debug, Error)]
pub enum SecsWireError {
    /// I/O error while feeding the decoder from a stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller contract violation (e.g. `decode(0)`). Decoder state is untouched.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Fatal framing error (bad format code, length overrun, etc.).
    ///
    /// The decoder is poisoned after this and must be `reset` before it
    /// accepts further bytes. SECS has no framing sync marker, so there is
    /// no resynchronisation.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The byte stream ended in the middle of a message.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using SecsWireError.
pub type Result<T> = std::result::Result<T, SecsWireError>;
