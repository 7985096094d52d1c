//! Protocol module - wire format, framing, and packet types.
//!
//! This module implements the binary packet protocol:
//! - 3-byte header encoding/decoding
//! - Chunk input type accepted by the framer
//! - Packet framer for accumulating partial reads
//! - Packet struct with typed accessors

mod chunk;
mod framer;
mod packet;
mod wire_format;

pub use chunk::Chunk;
pub use framer::{FramerConfig, FramerState, PacketFramer};
pub use packet::{build_packet, build_packet_parts, Packet};
pub use wire_format::{decode_header, encode_header, PacketHeader, HEADER_SIZE, MAX_PAYLOAD_LEN};
