//! # packet-framer
//!
//! Incremental framing of a continuous byte stream into type-tagged,
//! length-delimited packets.
//!
//! ## Wire format
//!
//! ```text
//! ┌──────┬────────────┬──────────────┐
//! │ Type │ Length     │ Payload      │
//! │ u8   │ u16 LE     │ Length bytes │
//! └──────┴────────────┴──────────────┘
//! ```
//!
//! ## Layers
//!
//! - [`protocol::PacketFramer`]: synchronous chunks-in, packets-out core
//! - [`PacketReader`]: drives a framer from any `AsyncRead`
//! - [`writer`]: dedicated task that encodes packets onto any `AsyncWrite`
//!
//! ## Example
//!
//! ```
//! use packet_framer::protocol::{build_packet, PacketFramer};
//!
//! let bytes = build_packet(7, b"ping").unwrap();
//!
//! let mut framer = PacketFramer::new();
//! assert!(framer.push(&bytes[..2]).unwrap().is_empty());
//!
//! let packets = framer.push(&bytes[2..]).unwrap();
//! assert_eq!(packets[0].packet_type(), 7);
//! assert_eq!(packets[0].data(), b"ping");
//! ```

pub mod error;
pub mod protocol;
pub mod reader;
pub mod writer;

pub use error::{FramerError, Result};
pub use protocol::{Chunk, Packet, PacketFramer};
pub use reader::{spawn_reader_task, PacketReader, ReaderConfig};
pub use writer::{spawn_writer_task, OutboundPacket, WriterConfig, WriterHandle};
