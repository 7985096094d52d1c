//! Packet struct with typed accessors.
//!
//! Represents one decoded packet: a type tag and its payload.
//! Uses `bytes::Bytes` so the payload can be handed out without copying.
//!
//! # Example
//!
//! ```
//! use packet_framer::protocol::Packet;
//! use bytes::Bytes;
//!
//! let packet = Packet::new(1, Bytes::from_static(b"hello"));
//!
//! assert_eq!(packet.packet_type(), 1);
//! assert_eq!(packet.data(), b"hello");
//! ```

use bytes::Bytes;

use super::wire_format::{PacketHeader, HEADER_SIZE, MAX_PAYLOAD_LEN};
use crate::error::{FramerError, Result};

/// A complete decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Opaque type tag.
    pub packet_type: u8,
    /// Payload bytes.
    pub data: Bytes,
}

impl Packet {
    /// Create a new packet from a type tag and payload.
    pub fn new(packet_type: u8, data: Bytes) -> Self {
        Self { packet_type, data }
    }

    /// Create a packet from a type tag and raw bytes (copies data).
    pub fn from_parts(packet_type: u8, data: &[u8]) -> Self {
        Self {
            packet_type,
            data: Bytes::copy_from_slice(data),
        }
    }

    #[inline]
    pub fn packet_type(&self) -> u8 {
        self.packet_type
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn data_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Consume the packet, returning its payload.
    #[inline]
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Payload length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Header describing this packet on the wire.
    ///
    /// Fails if the payload does not fit the 16-bit length field.
    pub fn header(&self) -> Result<PacketHeader> {
        let payload_len = u16::try_from(self.data.len()).map_err(|_| {
            FramerError::PayloadTooLarge {
                len: self.data.len(),
                max: MAX_PAYLOAD_LEN,
            }
        })?;
        Ok(PacketHeader::new(self.packet_type, payload_len))
    }

    /// Encode the packet (header + payload) into a contiguous buffer.
    pub fn encode(&self) -> Result<Vec<u8>> {
        build_packet(self.packet_type, &self.data)
    }
}

/// Build a complete packet as a single byte vector.
///
/// Use `build_packet_parts` for scatter/gather I/O (writev).
///
/// # Example
///
/// ```
/// use packet_framer::protocol::build_packet;
///
/// let bytes = build_packet(1, &[0xAA, 0xBB]).unwrap();
/// assert_eq!(bytes, [1, 2, 0, 0xAA, 0xBB]);
/// ```
pub fn build_packet(packet_type: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let (header, payload) = build_packet_parts(packet_type, payload)?;
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Build packet parts for scatter/gather I/O.
///
/// Returns the encoded header and a reference to the payload.
pub fn build_packet_parts(packet_type: u8, payload: &[u8]) -> Result<([u8; HEADER_SIZE], &[u8])> {
    let payload_len = u16::try_from(payload.len()).map_err(|_| FramerError::PayloadTooLarge {
        len: payload.len(),
        max: MAX_PAYLOAD_LEN,
    })?;
    Ok((PacketHeader::new(packet_type, payload_len).encode(), payload))
}
