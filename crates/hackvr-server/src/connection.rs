//! One accepted client connection.
//!
//! A [`Connection`] owns the handshaken stream, a streaming parser, and
//! the application's per-connection session state. [`Connection::poll`]
//! performs one non-blocking read and dispatches every complete frame;
//! I/O or TLS failures and EOF mark the connection disconnected.
//!
//! Lifecycle: Accepted (handshake done) → Active (polling) → Closed.

use std::net::SocketAddr;

use hackvr_net::{ConnectionToken, Deadline, NetError, NetStream, Received};
use hackvr_proto::{ClientCommand, CommandError, Parser, ServerCommand};

/// Sender for server-to-client commands.
pub struct RemoteClient<'a> {
    stream: &'a mut NetStream,
}

impl RemoteClient<'_> {
    /// Encode and transmit one command.
    pub fn send(&mut self, command: &ClientCommand) -> Result<(), NetError> {
        let bytes = command.encode()?;
        self.stream.send(&bytes)
    }
}

/// Per-connection application state.
///
/// `handle_command` only ever sees fully typed arguments. The default
/// `handle_error` logs and drops, matching the frame layer's
/// silent-tolerance posture.
pub trait SessionHandler {
    /// A typed command arrived from this client.
    fn handle_command(&mut self, client: RemoteClient<'_>, command: ServerCommand);

    /// A frame arrived whose name or arguments did not bind.
    fn handle_error(&mut self, name: &str, message: &str, args: &[String]) {
        let details = args.join(" ");
        tracing::warn!(command = name, args = %details, reason = message, "invalid command received");
    }
}

/// A polled server-side connection.
pub struct Connection<S: SessionHandler> {
    stream: NetStream,
    parser: Parser,
    token: ConnectionToken,
    peer_addr: SocketAddr,
    session: S,
    connected: bool,
}

impl<S: SessionHandler> Connection<S> {
    /// Wrap a handshaken stream.
    #[must_use]
    pub fn new(
        stream: NetStream,
        peer_addr: SocketAddr,
        token: ConnectionToken,
        session: S,
    ) -> Self {
        Self { stream, parser: Parser::new(), token, peer_addr, session, connected: true }
    }

    /// Identity negotiated during the handshake.
    #[must_use]
    pub fn token(&self) -> &ConnectionToken {
        &self.token
    }

    /// Remote socket address.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Whether the connection is still up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The application session state.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The application session state, mutably.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Sender for pushing commands to this client outside of dispatch.
    pub fn client(&mut self) -> RemoteClient<'_> {
        RemoteClient { stream: &mut self.stream }
    }

    /// One non-blocking pump: read, parse, dispatch.
    pub fn poll(&mut self) {
        if !self.connected {
            return;
        }
        match self.stream.recv(4096, Deadline::INSTANT) {
            Err(_) | Ok(Received::Closed) => self.disconnect(),
            Ok(Received::Pending) => {}
            Ok(Received::Data(data)) => {
                self.parser.push(&data);
                while let Some(frame) = self.parser.pull() {
                    match ServerCommand::parse(&frame.name, &frame.params) {
                        Ok(command) => {
                            let client = RemoteClient { stream: &mut self.stream };
                            self.session.handle_command(client, command);
                        }
                        Err(CommandError::UnknownCommand) => {
                            self.session.handle_error(&frame.name, "unknown command", &frame.params);
                        }
                        Err(error) => {
                            self.session.handle_error(&frame.name, &error.to_string(), &frame.params);
                        }
                    }
                }
            }
        }
    }

    /// Close the connection. Idempotent.
    pub fn close(&mut self) {
        if self.connected {
            self.disconnect();
        }
    }

    /// Tear down and recover the session state.
    #[must_use]
    pub fn into_session(self) -> S {
        self.session
    }

    fn disconnect(&mut self) {
        self.stream.close();
        self.connected = false;
    }
}
