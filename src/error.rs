//! Error types for packet-framer.

use thiserror::Error;

/// Main error type for all framing operations.
#[derive(Debug, Error)]
pub enum FramerError {
    /// Input that is not raw bytes was fed to the framer.
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    /// Declared or supplied payload length exceeds the allowed maximum.
    #[error("Payload size {len} exceeds maximum {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// Stream ended with a partial packet still buffered.
    #[error("Stream truncated with {buffered} bytes of a partial packet buffered")]
    Truncated { buffered: usize },

    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writer task is gone.
    #[error("Channel closed")]
    ChannelClosed,

    /// Writer queue is full.
    #[error("Channel full")]
    ChannelFull,
}

/// Result type alias using FramerError.
pub type Result<T> = std::result::Result<T, FramerError>;
