//! Buffered stream over a pluggable byte transport.
//!
//! [`Transport`] is the minimal blocking surface a connection needs:
//! receive with a deadline, complete send, close. [`NetStream`] layers a
//! read accumulator on top so higher layers can read one byte at a time
//! (the handshake does) without per-byte syscalls, and so bytes a
//! handshake reads past its terminator stay queued for the command
//! parser.

use bytes::{Buf, BytesMut};

use crate::{deadline::Deadline, error::NetError};

/// Fill target for the read accumulator.
const BUFFER_TARGET: usize = 4096;

/// Outcome of a receive operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Bytes arrived.
    Data(Vec<u8>),
    /// The deadline passed before any data arrived.
    Pending,
    /// The peer closed the stream.
    Closed,
}

/// A byte transport (plain TCP, TLS, or a test double).
pub trait Transport: Send {
    /// Receive up to `max_len` bytes, waiting no longer than `deadline`.
    fn recv_unbuffered(&mut self, max_len: usize, deadline: Deadline)
    -> Result<Received, NetError>;

    /// Send the whole buffer.
    fn send(&mut self, data: &[u8]) -> Result<(), NetError>;

    /// Release the underlying resources. Idempotent.
    fn close(&mut self);
}

/// Buffered stream for HackVR traffic.
pub struct NetStream {
    transport: Box<dyn Transport>,
    buffer: BytesMut,
}

impl NetStream {
    /// Wrap a transport with an empty accumulator.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport, buffer: BytesMut::new() }
    }

    /// Receive up to `max_len` bytes, preferring buffered data.
    ///
    /// The accumulator is refilled from the transport only while it holds
    /// fewer than 4096 bytes and fewer than `max_len`. On EOF with
    /// buffered data the buffered data is returned first; EOF with an
    /// empty accumulator is [`Received::Closed`]. A reached deadline with
    /// no data is [`Received::Pending`]. `max_len == 0` returns an empty
    /// read immediately.
    pub fn recv(&mut self, max_len: usize, deadline: Deadline) -> Result<Received, NetError> {
        if max_len == 0 {
            return Ok(Received::Data(Vec::new()));
        }
        if self.buffer.len() >= max_len {
            return Ok(Received::Data(self.drain(max_len)));
        }
        if deadline.is_reached() && !deadline.is_empty() {
            return Ok(Received::Pending);
        }

        while self.buffer.len() < BUFFER_TARGET && self.buffer.len() < max_len {
            let needed = BUFFER_TARGET - self.buffer.len();
            match self.transport.recv_unbuffered(needed, deadline)? {
                Received::Pending => break,
                Received::Closed => {
                    if self.buffer.is_empty() {
                        return Ok(Received::Closed);
                    }
                    break;
                }
                Received::Data(data) => {
                    self.buffer.extend_from_slice(&data);
                    if self.buffer.len() >= max_len {
                        break;
                    }
                }
            }
        }

        if self.buffer.is_empty() {
            return Ok(Received::Pending);
        }
        let take = max_len.min(self.buffer.len());
        Ok(Received::Data(self.drain(take)))
    }

    /// Send the whole buffer.
    pub fn send(&mut self, data: &[u8]) -> Result<(), NetError> {
        self.transport.send(data)
    }

    /// Close the underlying transport.
    pub fn close(&mut self) {
        self.transport.close();
    }

    fn drain(&mut self, len: usize) -> Vec<u8> {
        let chunk = self.buffer[..len].to_vec();
        self.buffer.advance(len);
        chunk
    }
}

impl std::fmt::Debug for NetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetStream").field("buffered", &self.buffer.len()).finish()
    }
}
