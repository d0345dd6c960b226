//! Plain TCP transport and listener.
//!
//! Deadlines map onto socket modes: an infinite deadline reads blocking,
//! a reached deadline (or [`Deadline::INSTANT`]) reads non-blocking, and
//! anything else reads with the remaining time as the socket read
//! timeout. Sends always run on a blocking socket so a write either
//! completes or fails.

use std::{
    io::{ErrorKind, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    time::Duration,
};

use socket2::{Domain, Socket, Type};

use crate::{
    deadline::Deadline,
    error::NetError,
    stream::{Received, Transport},
};

/// Poll interval while waiting for an acceptable connection.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Plain TCP byte transport.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Wrap a connected socket.
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Connect to `host:port` and wrap the socket.
    pub fn connect(host: &str, port: u16) -> Result<Self, NetError> {
        let stream = TcpStream::connect((host, port))?;
        Ok(Self::new(stream))
    }
}

impl Transport for TcpTransport {
    fn recv_unbuffered(
        &mut self,
        max_len: usize,
        deadline: Deadline,
    ) -> Result<Received, NetError> {
        if max_len == 0 {
            return Ok(Received::Data(Vec::new()));
        }
        configure_read_mode(&self.stream, deadline)?;
        let mut buffer = vec![0u8; max_len];
        let result = self.stream.read(&mut buffer);
        read_outcome(result, buffer)
    }

    fn send(&mut self, data: &[u8]) -> Result<(), NetError> {
        self.stream.set_nonblocking(false)?;
        self.stream.write_all(data)?;
        Ok(())
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}

/// Put `socket` in the read mode the deadline calls for: blocking for an
/// infinite deadline, non-blocking for a reached one, and a read timeout
/// of the remaining time otherwise.
pub(crate) fn configure_read_mode(socket: &TcpStream, deadline: Deadline) -> Result<(), NetError> {
    if deadline.is_infinite() {
        socket.set_nonblocking(false)?;
        socket.set_read_timeout(None)?;
    } else {
        let remaining = deadline.remaining();
        if remaining.is_zero() {
            socket.set_nonblocking(true)?;
        } else {
            socket.set_nonblocking(false)?;
            socket.set_read_timeout(Some(remaining))?;
        }
    }
    Ok(())
}

/// Map a socket read result onto the receive outcome taxonomy.
pub(crate) fn read_outcome(
    result: std::io::Result<usize>,
    mut buffer: Vec<u8>,
) -> Result<Received, NetError> {
    match result {
        Ok(0) => Ok(Received::Closed),
        Ok(count) => {
            buffer.truncate(count);
            Ok(Received::Data(buffer))
        }
        Err(error) => match error.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
                Ok(Received::Pending)
            }
            // The peer vanished without a close; the stream is done.
            ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset => Ok(Received::Closed),
            _ => Err(error.into()),
        },
    }
}

/// TCP listener for plain connections, bound with `SO_REUSEADDR`.
pub struct RawListener {
    listener: Option<TcpListener>,
}

impl RawListener {
    /// Bind to `host:port`. `host` may be an IP literal or a resolvable
    /// name; the socket family follows the resolved address.
    pub fn bind(host: &str, port: u16) -> Result<Self, NetError> {
        let address = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| NetError::InvalidUrl(format!("no address for host {host}")))?;
        let socket = Socket::new(Domain::for_address(address), Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.bind(&address.into())?;
        socket.listen(128)?;
        let listener: TcpListener = socket.into();
        listener.set_nonblocking(true)?;
        Ok(Self { listener: Some(listener) })
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        let listener = self.listener.as_ref().ok_or(NetError::NotConnected)?;
        Ok(listener.local_addr()?)
    }

    /// Accept one connection before the deadline, or return `None`.
    pub fn accept(
        &mut self,
        deadline: Deadline,
    ) -> Result<Option<(TcpStream, SocketAddr)>, NetError> {
        let listener = self.listener.as_ref().ok_or(NetError::NotConnected)?;
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    stream.set_nonblocking(false)?;
                    return Ok(Some((stream, addr)));
                }
                Err(error) if error.kind() == ErrorKind::WouldBlock => {
                    if deadline.is_reached() {
                        return Ok(None);
                    }
                    std::thread::sleep(ACCEPT_POLL_INTERVAL.min(deadline.remaining()));
                }
                Err(error) if error.kind() == ErrorKind::Interrupted => {}
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Stop listening and release the socket.
    pub fn close(&mut self) {
        self.listener = None;
    }
}
