//! Input items accepted by the framer.
//!
//! Transports hand the framer raw bytes. Some stream sources can also carry
//! already-structured values; those are representable here so the framer can
//! refuse them explicitly instead of guessing at an encoding.

use bytes::Bytes;

/// One delivery unit handed to [`PacketFramer::feed`](super::PacketFramer::feed).
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// Raw bytes from the transport.
    Raw(Bytes),
    /// An already-decoded value. Never valid framer input.
    Structured(serde_json::Value),
}

impl Chunk {
    /// Length in bytes, or `None` for structured values.
    pub fn byte_len(&self) -> Option<usize> {
        match self {
            Chunk::Raw(bytes) => Some(bytes.len()),
            Chunk::Structured(_) => None,
        }
    }

    /// Check if this chunk carries raw bytes.
    #[inline]
    pub fn is_raw(&self) -> bool {
        matches!(self, Chunk::Raw(_))
    }
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Chunk::Raw(bytes)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Chunk::Raw(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Chunk {
    fn from(bytes: &'static [u8]) -> Self {
        Chunk::Raw(Bytes::from_static(bytes))
    }
}

impl<const N: usize> From<&'static [u8; N]> for Chunk {
    fn from(bytes: &'static [u8; N]) -> Self {
        Chunk::Raw(Bytes::from_static(bytes))
    }
}

impl From<serde_json::Value> for Chunk {
    fn from(value: serde_json::Value) -> Self {
        Chunk::Structured(value)
    }
}
