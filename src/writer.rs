//! Dedicated writer task for sending packets.
//!
//! Producers hand packets to a [`WriterHandle`], which queues them on a
//! bounded mpsc channel. A single task drains the channel and writes to the
//! transport, batching whatever is already queued into one vectored write.
//!
//! ```text
//! Producer 1 ─┐
//! Producer 2 ─┼─► mpsc::Sender<OutboundPacket> ─► Writer Task ─► AsyncWrite
//! Producer N ─┘
//! ```
//!
//! A full channel makes [`WriterHandle::send`] wait, which is how a slow
//! transport pushes back on producers.

use std::io::IoSlice;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{FramerError, Result};
use crate::protocol::{build_packet_parts, Packet, HEADER_SIZE};

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Maximum packets to batch in a single write operation.
const MAX_BATCH_SIZE: usize = 64;

/// A packet encoded and ready to be written.
#[derive(Debug, Clone)]
pub struct OutboundPacket {
    /// Pre-encoded header (3 bytes).
    pub header: [u8; HEADER_SIZE],
    /// Payload bytes (may be empty).
    pub payload: Bytes,
}

impl OutboundPacket {
    /// Encode a header for `payload`.
    ///
    /// # Errors
    ///
    /// [`FramerError::PayloadTooLarge`] if the payload exceeds 65535 bytes.
    pub fn new(packet_type: u8, payload: Bytes) -> Result<Self> {
        let (header, _) = build_packet_parts(packet_type, &payload)?;
        Ok(Self { header, payload })
    }

    /// Packet with an empty payload.
    pub fn empty(packet_type: u8) -> Self {
        Self {
            header: [packet_type, 0, 0],
            payload: Bytes::new(),
        }
    }

    /// Total size of this packet (header + payload).
    #[inline]
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

impl TryFrom<Packet> for OutboundPacket {
    type Error = FramerError;

    fn try_from(packet: Packet) -> Result<Self> {
        Self::new(packet.packet_type, packet.data)
    }
}

/// Configuration for the writer task.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Packets queued before `send` starts waiting.
    pub channel_capacity: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Handle for sending packets to the writer task.
///
/// Cheaply cloneable; every clone feeds the same task.
#[derive(Debug, Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundPacket>,
}

impl WriterHandle {
    /// Queue a packet, waiting while the channel is full.
    pub async fn send(&self, packet: OutboundPacket) -> Result<()> {
        self.tx
            .send(packet)
            .await
            .map_err(|_| FramerError::ChannelClosed)
    }

    /// Encode and queue a packet from its parts.
    pub async fn send_packet(&self, packet_type: u8, payload: impl Into<Bytes>) -> Result<()> {
        self.send(OutboundPacket::new(packet_type, payload.into())?)
            .await
    }

    /// Queue a packet without waiting.
    ///
    /// Returns `Err(ChannelFull)` immediately if at capacity.
    pub fn try_send(&self, packet: OutboundPacket) -> Result<()> {
        self.tx.try_send(packet).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => FramerError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => FramerError::ChannelClosed,
        })
    }

    /// Whether the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the writer task and return a handle for sending packets.
///
/// The task ends with `Ok(())` once every handle is dropped and the queue
/// is flushed.
pub fn spawn_writer_task<W>(
    writer: W,
    config: WriterConfig,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let task = tokio::spawn(async move {
        let result = writer_loop(rx, writer).await;
        if let Err(e) = &result {
            tracing::error!("Writer loop error: {}", e);
        }
        result
    });
    (WriterHandle { tx }, task)
}

/// Main writer loop - receives packets and writes them out in batches.
async fn writer_loop<W>(mut rx: mpsc::Receiver<OutboundPacket>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);

    while let Some(first) = rx.recv().await {
        batch.push(first);
        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(packet) => batch.push(packet),
                Err(_) => break,
            }
        }

        write_batch(&mut writer, &batch).await?;
        tracing::trace!(packets = batch.len(), "batch written");
        batch.clear();
    }

    writer.shutdown().await?;
    Ok(())
}

/// Write a batch of packets with scatter/gather I/O, resuming after partial writes.
async fn write_batch<W>(writer: &mut W, batch: &[OutboundPacket]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let total: usize = batch.iter().map(OutboundPacket::size).sum();
    let mut written = 0;

    while written < total {
        let slices = remaining_slices(batch, written);
        let n = writer.write_vectored(&slices).await?;
        if n == 0 {
            return Err(FramerError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }
        written += n;
    }

    writer.flush().await?;
    Ok(())
}

/// IoSlices covering everything in `batch` past the first `skip` bytes.
fn remaining_slices(batch: &[OutboundPacket], skip: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(batch.len() * 2);
    let mut offset = 0;

    for packet in batch {
        for part in [&packet.header[..], &packet.payload[..]] {
            let end = offset + part.len();
            if skip < end && !part.is_empty() {
                slices.push(IoSlice::new(&part[skip.saturating_sub(offset)..]));
            }
            offset = end;
        }
    }

    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::build_packet;
    use tokio::io::{duplex, AsyncReadExt};

    #[test]
    fn test_outbound_packet_creation() {
        let packet = OutboundPacket::new(4, Bytes::from_static(b"hello")).unwrap();

        assert_eq!(packet.header, [4, 5, 0]);
        assert_eq!(packet.size(), HEADER_SIZE + 5);
    }

    #[test]
    fn test_outbound_packet_empty() {
        let packet = OutboundPacket::empty(9);

        assert!(packet.payload.is_empty());
        assert_eq!(packet.header, [9, 0, 0]);
        assert_eq!(packet.size(), HEADER_SIZE);
    }

    #[test]
    fn test_outbound_packet_rejects_oversized_payload() {
        let payload = Bytes::from(vec![0u8; 70_000]);
        assert!(matches!(
            OutboundPacket::new(1, payload),
            Err(FramerError::PayloadTooLarge { len: 70_000, .. })
        ));
    }

    #[test]
    fn test_outbound_from_packet() {
        let packet = Packet::from_parts(3, b"abc");
        let outbound = OutboundPacket::try_from(packet).unwrap();

        assert_eq!(outbound.header, [3, 3, 0]);
        assert_eq!(&outbound.payload[..], b"abc");
    }

    #[test]
    fn test_remaining_slices_after_partial_write() {
        let batch = vec![
            OutboundPacket::new(1, Bytes::from_static(b"ab")).unwrap(),
            OutboundPacket::empty(2),
        ];

        let all: Vec<u8> = remaining_slices(&batch, 0)
            .iter()
            .flat_map(|s| s.iter().copied())
            .collect();
        assert_eq!(all, vec![1, 2, 0, b'a', b'b', 2, 0, 0]);

        let rest: Vec<u8> = remaining_slices(&batch, 4)
            .iter()
            .flat_map(|s| s.iter().copied())
            .collect();
        assert_eq!(rest, vec![b'b', 2, 0, 0]);

        assert!(remaining_slices(&batch, 8).is_empty());
    }

    #[test]
    fn test_writer_config_default() {
        assert_eq!(WriterConfig::default().channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[tokio::test]
    async fn test_writer_task_writes_wire_format() {
        let (client, mut server) = duplex(1024);
        let (handle, task) = spawn_writer_task(client, WriterConfig::default());

        handle.send_packet(1, &b"hi"[..]).await.unwrap();
        handle.send(OutboundPacket::empty(2)).await.unwrap();
        drop(handle);

        task.await.unwrap().unwrap();

        let mut received = Vec::new();
        server.read_to_end(&mut received).await.unwrap();

        let mut expected = build_packet(1, b"hi").unwrap();
        expected.extend(build_packet(2, b"").unwrap());
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn test_send_after_task_exit_fails() {
        let (client, server) = duplex(64);
        drop(server);
        let (handle, task) = spawn_writer_task(client, WriterConfig::default());

        // First write hits the closed pipe and ends the task.
        let _ = handle.send(OutboundPacket::empty(1)).await;
        assert!(task.await.unwrap().is_err());

        assert!(matches!(
            handle.send(OutboundPacket::empty(1)).await,
            Err(FramerError::ChannelClosed)
        ));
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_try_send_when_full() {
        let (client, mut server) = duplex(1);
        let (handle, _task) = spawn_writer_task(client, WriterConfig { channel_capacity: 1 });

        handle.send(OutboundPacket::empty(1)).await.unwrap();

        // Once a header byte arrives the task holds the first packet and is
        // stuck writing the rest of it into the one-byte pipe.
        let mut first = [0u8; 1];
        server.read_exact(&mut first).await.unwrap();
        assert_eq!(first, [1]);

        handle.try_send(OutboundPacket::empty(2)).unwrap();
        assert!(matches!(
            handle.try_send(OutboundPacket::empty(3)),
            Err(FramerError::ChannelFull)
        ));
    }
}
