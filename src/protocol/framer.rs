//! Packet framer for accumulating partial reads.
//!
//! Incoming chunks are kept as a queue of `bytes::Bytes` plus a running
//! length, so feeding never copies. Bytes are only copied when a header or a
//! payload straddles two or more chunks.
//!
//! State machine for one in-progress packet:
//! - `AwaitingHeader`: need at least 3 bytes
//! - `AwaitingPayload`: header decoded and cached, need the payload bytes
//!
//! # Example
//!
//! ```
//! use packet_framer::protocol::PacketFramer;
//!
//! let mut framer = PacketFramer::new();
//!
//! // One chunk holding two packets: {1, [AA, BB]} and {2, []}
//! let packets = framer.push(&[1, 2, 0, 0xAA, 0xBB, 2, 0, 0]).unwrap();
//!
//! assert_eq!(packets.len(), 2);
//! assert_eq!(packets[0].data(), &[0xAA, 0xBB]);
//! assert!(packets[1].is_empty());
//! ```

use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};

use super::chunk::Chunk;
use super::wire_format::{PacketHeader, HEADER_SIZE, MAX_PAYLOAD_LEN};
use super::Packet;
use crate::error::{FramerError, Result};

/// Framer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramerConfig {
    /// Largest payload accepted from a header. Defaults to the wire-format
    /// ceiling, which never rejects anything.
    pub max_payload_len: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            max_payload_len: MAX_PAYLOAD_LEN,
        }
    }
}

/// Where the framer is within the current packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// Fewer than 3 bytes of the next header are buffered.
    AwaitingHeader,
    /// Header known; `remaining` payload bytes still missing.
    AwaitingPayload { packet_type: u8, remaining: usize },
}

/// Incremental framer turning byte chunks into packets.
///
/// The buffer is owned exclusively by the framer. Every emitted packet's
/// bytes are removed from it before the packet is handed out.
#[derive(Debug, Default)]
pub struct PacketFramer {
    /// Unconsumed chunks, oldest first.
    chunks: VecDeque<Bytes>,
    /// Total bytes across `chunks`.
    buffered: usize,
    /// Decoded header of the packet at the front, once known.
    header: Option<PacketHeader>,
    config: FramerConfig,
}

impl PacketFramer {
    /// Create a framer accepting every length the wire format allows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a framer with custom settings.
    pub fn with_config(config: FramerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Feed one chunk and collect every packet it completes.
    ///
    /// Partial data is buffered internally for the next feed.
    ///
    /// # Errors
    ///
    /// - [`FramerError::InvalidInput`] for a structured chunk. Nothing is
    ///   buffered and the framer stays usable.
    /// - [`FramerError::PayloadTooLarge`] if a header exceeds the configured cap.
    ///   Packets completed earlier in the same chunk are returned first; the
    ///   rejected header stays at the front and fails the next call.
    pub fn feed(&mut self, chunk: impl Into<Chunk>) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        match self.feed_with(chunk, |packet| packets.push(packet)) {
            Ok(_) => Ok(packets),
            Err(e @ FramerError::PayloadTooLarge { .. }) if !packets.is_empty() => {
                tracing::debug!("Returning {} packets ahead of error: {}", packets.len(), e);
                Ok(packets)
            }
            Err(e) => Err(e),
        }
    }

    /// Feed one chunk, handing each completed packet to `emit` in order.
    ///
    /// Returns the number of packets emitted.
    pub fn feed_with<F>(&mut self, chunk: impl Into<Chunk>, mut emit: F) -> Result<usize>
    where
        F: FnMut(Packet),
    {
        match chunk.into() {
            Chunk::Raw(bytes) => self.append(bytes),
            Chunk::Structured(_) => {
                return Err(FramerError::InvalidInput(
                    "structured value fed where raw bytes were expected",
                ));
            }
        }

        let mut emitted = 0;
        while let Some(packet) = self.try_extract()? {
            emit(packet);
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Copy a borrowed slice in and collect every packet it completes.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Packet>> {
        self.feed(Bytes::copy_from_slice(data))
    }

    /// Append bytes without extracting packets.
    pub fn extend(&mut self, bytes: Bytes) {
        self.append(bytes);
    }

    /// Try to extract a single packet from the front of the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(packet))` if a complete packet was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` if the header exceeds the configured cap
    pub fn try_extract(&mut self) -> Result<Option<Packet>> {
        let header = match self.header {
            Some(header) => header,
            None => {
                if self.buffered < HEADER_SIZE {
                    return Ok(None);
                }
                let header = self.read_header();

                let payload_len = header.payload_len as usize;
                if payload_len > self.config.max_payload_len {
                    return Err(FramerError::PayloadTooLarge {
                        len: payload_len,
                        max: self.config.max_payload_len,
                    });
                }

                self.header = Some(header);
                header
            }
        };

        if self.buffered < header.packet_len() {
            return Ok(None);
        }

        self.consume(HEADER_SIZE);
        let data = self.take(header.payload_len as usize);
        self.header = None;

        tracing::trace!(
            packet_type = header.packet_type,
            len = data.len(),
            buffered = self.buffered,
            "packet framed"
        );

        Ok(Some(Packet::new(header.packet_type, data)))
    }

    /// Number of buffered bytes, including a partially received header.
    pub fn len(&self) -> usize {
        self.buffered
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffered == 0
    }

    /// Get the current parsing state.
    pub fn state(&self) -> FramerState {
        match self.header {
            None => FramerState::AwaitingHeader,
            Some(header) => FramerState::AwaitingPayload {
                packet_type: header.packet_type,
                remaining: header.packet_len().saturating_sub(self.buffered),
            },
        }
    }

    /// Get the framer configuration.
    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.buffered = 0;
        self.header = None;
    }

    /// Check that the stream ended on a packet boundary.
    ///
    /// # Errors
    ///
    /// [`FramerError::Truncated`] if a partial packet is still buffered.
    pub fn finish(&self) -> Result<()> {
        if self.buffered == 0 {
            Ok(())
        } else {
            Err(FramerError::Truncated {
                buffered: self.buffered,
            })
        }
    }

    fn append(&mut self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        self.buffered += bytes.len();
        self.chunks.push_back(bytes);
    }

    /// Decode the header at the front. Caller guarantees `HEADER_SIZE` bytes.
    fn read_header(&mut self) -> PacketHeader {
        let front_len = self.chunks.front().map_or(0, Bytes::len);
        if front_len < HEADER_SIZE {
            // Header straddles chunks: merge it into one chunk at the front.
            let merged = self.take(HEADER_SIZE);
            self.buffered += merged.len();
            self.chunks.push_front(merged);
            tracing::trace!(front_len, "coalesced split header");
        }

        let front = &self.chunks[0];
        PacketHeader::new(front[0], u16::from_le_bytes([front[1], front[2]]))
    }

    /// Remove `n` bytes from the front. Zero-copy when they sit in one chunk.
    fn take(&mut self, n: usize) -> Bytes {
        debug_assert!(n <= self.buffered);
        self.buffered -= n;

        if n == 0 {
            return Bytes::new();
        }

        if let Some(front) = self.chunks.front_mut() {
            if front.len() > n {
                return front.split_to(n);
            }
            if front.len() == n {
                return self.chunks.pop_front().unwrap_or_default();
            }
        }

        let mut out = BytesMut::with_capacity(n);
        while out.len() < n {
            let Some(front) = self.chunks.front_mut() else {
                break;
            };
            let wanted = n - out.len();
            if front.len() <= wanted {
                out.extend_from_slice(front);
                self.chunks.pop_front();
            } else {
                out.extend_from_slice(&front[..wanted]);
                front.advance(wanted);
            }
        }
        out.freeze()
    }

    /// Drop `n` bytes from the front.
    fn consume(&mut self, mut n: usize) {
        debug_assert!(n <= self.buffered);
        self.buffered -= n;

        while n > 0 {
            let Some(front) = self.chunks.front_mut() else {
                break;
            };
            if front.len() <= n {
                n -= front.len();
                self.chunks.pop_front();
            } else {
                front.advance(n);
                n = 0;
            }
        }
    }
}
