//! Packet reader driving a framer from an async byte stream.
//!
//! The reader owns the transport side of framing: it pulls chunks from any
//! `AsyncRead`, feeds them to a [`PacketFramer`], and decides what a stream
//! end means. Ending on a packet boundary is a clean close; ending with a
//! partial packet buffered is reported as [`FramerError::Truncated`](crate::FramerError::Truncated).
//!
//! # Backpressure
//!
//! [`spawn_reader_task`] forwards packets into a bounded channel. While the
//! channel is full the task is parked on `send`, so no further reads are
//! issued until the consumer catches up.
//!
//! # Example
//!
//! ```
//! use packet_framer::protocol::build_packet;
//! use packet_framer::PacketReader;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let bytes = build_packet(2, b"data").unwrap();
//! let mut reader = PacketReader::new(&bytes[..]);
//!
//! let packet = reader.next_packet().await.unwrap().unwrap();
//! assert_eq!(packet.packet_type(), 2);
//! assert!(reader.next_packet().await.unwrap().is_none());
//! # });
//! ```

use std::collections::VecDeque;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{FramerError, Result};
use crate::protocol::{FramerConfig, Packet, PacketFramer};

/// Default read size per syscall (64 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Default capacity of the packet channel used by [`spawn_reader_task`].
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Configuration for the packet reader.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Bytes reserved for each read from the transport.
    pub read_buffer_size: usize,
    /// Packets queued for the consumer before reading pauses.
    pub channel_capacity: usize,
    /// Settings for the underlying framer.
    pub framer: FramerConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            framer: FramerConfig::default(),
        }
    }
}

/// Reads packets from an async byte stream.
pub struct PacketReader<R> {
    reader: R,
    framer: PacketFramer,
    read_buf: BytesMut,
    /// Packets decoded by the last read but not yet returned.
    ready: VecDeque<Packet>,
    /// Framer error held back until `ready` has drained.
    failed: Option<FramerError>,
    read_buffer_size: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin> PacketReader<R> {
    /// Create a reader with default settings.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ReaderConfig::default())
    }

    pub fn with_config(reader: R, config: ReaderConfig) -> Self {
        let read_buffer_size = config.read_buffer_size.max(1);
        Self {
            reader,
            framer: PacketFramer::with_config(config.framer),
            read_buf: BytesMut::with_capacity(read_buffer_size),
            ready: VecDeque::new(),
            failed: None,
            read_buffer_size,
            eof: false,
        }
    }

    /// Read the next packet.
    ///
    /// Returns `Ok(None)` once the stream has closed on a packet boundary.
    /// Packets decoded ahead of a framer error are returned before the error.
    ///
    /// # Errors
    ///
    /// - [`FramerError::Truncated`](crate::FramerError::Truncated) if the stream closed mid-packet
    /// - [`FramerError::Io`](crate::FramerError::Io) on transport errors
    /// - any framer error for the bytes read
    pub async fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            if let Some(packet) = self.ready.pop_front() {
                return Ok(Some(packet));
            }
            if let Some(e) = self.failed.take() {
                return Err(e);
            }
            if self.eof {
                return Ok(None);
            }

            self.read_buf.reserve(self.read_buffer_size);
            let n = self.reader.read_buf(&mut self.read_buf).await?;

            if n == 0 {
                self.eof = true;
                if let Err(e) = self.framer.finish() {
                    tracing::warn!("Stream closed mid-packet: {}", e);
                    return Err(e);
                }
                tracing::debug!("Stream closed on a packet boundary");
                return Ok(None);
            }

            let chunk = self.read_buf.split().freeze();
            let ready = &mut self.ready;
            if let Err(e) = self.framer.feed_with(chunk, |packet| ready.push_back(packet)) {
                if self.ready.is_empty() {
                    return Err(e);
                }
                self.failed = Some(e);
            }
        }
    }

    /// The framer holding any partially received packet.
    pub fn framer(&self) -> &PacketFramer {
        &self.framer
    }

    /// Whether the underlying stream has reported end of file.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Consume the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Spawn a task that reads packets and forwards them to a bounded channel.
///
/// # Returns
///
/// A tuple of `(Receiver, JoinHandle)`. The task ends with `Ok(())` on a
/// clean stream close or when the receiver is dropped, and with the reader's
/// error otherwise.
pub fn spawn_reader_task<R>(
    reader: R,
    config: ReaderConfig,
) -> (mpsc::Receiver<Packet>, JoinHandle<Result<()>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let reader = PacketReader::with_config(reader, config);
    let task = tokio::spawn(reader_loop(reader, tx));
    (rx, task)
}

/// Main reader loop - pulls packets and hands them to the consumer.
async fn reader_loop<R>(mut reader: PacketReader<R>, tx: mpsc::Sender<Packet>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        let packet = match reader.next_packet().await {
            Ok(Some(packet)) => packet,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::error!("Read loop error: {}", e);
                return Err(e);
            }
        };

        if tx.send(packet).await.is_err() {
            tracing::debug!("Packet receiver dropped, stopping reader");
            return Ok(());
        }
    }
}
