//! Wire format encoding and decoding.
//!
//! Implements the 3-byte header format:
//! ```text
//! ┌───────┬──────────┐
//! │ Type  │ Length   │
//! │ 1 byte│ 2 bytes  │
//! │ uint8 │ uint16 LE│
//! └───────┴──────────┘
//! ```
//!
//! The length is Little Endian. Packets follow each other with no separator.

/// Header size in bytes (fixed, exactly 3).
pub const HEADER_SIZE: usize = 3;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Opaque packet type tag.
    pub packet_type: u8,
    /// Payload length in bytes.
    pub payload_len: u16,
}

impl PacketHeader {
    /// Create a new header.
    pub fn new(packet_type: u8, payload_len: u16) -> Self {
        Self {
            packet_type,
            payload_len,
        }
    }

    /// Encode header to bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use packet_framer::protocol::PacketHeader;
    ///
    /// let bytes = PacketHeader::new(1, 0x0102).encode();
    /// assert_eq!(bytes, [1, 0x02, 0x01]);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (3 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[0] = self.packet_type;
        buf[1..3].copy_from_slice(&self.payload_len.to_le_bytes());
    }

    /// Decode header from the first 3 bytes of `buf`.
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            packet_type: buf[0],
            payload_len: u16::from_le_bytes([buf[1], buf[2]]),
        })
    }

    /// Total encoded size of the packet this header announces.
    #[inline]
    pub fn packet_len(&self) -> usize {
        HEADER_SIZE + self.payload_len as usize
    }
}

/// Encode a header to bytes (standalone function).
#[inline]
pub fn encode_header(header: &PacketHeader) -> [u8; HEADER_SIZE] {
    header.encode()
}

/// Decode a header from bytes (standalone function).
#[inline]
pub fn decode_header(buf: &[u8]) -> Option<PacketHeader> {
    PacketHeader::decode(buf)
}
