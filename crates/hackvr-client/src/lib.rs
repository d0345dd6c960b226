//! HackVR client: a polled connection that turns inbound frames into
//! typed [`ClientCommand`]s and lets handlers answer with
//! [`ServerCommand`]s.
//!
//! The client never blocks: [`Client::poll`] performs one non-blocking
//! read, feeds the streaming parser, and dispatches every complete
//! frame. Malformed frames were already dropped by the parser;
//! well-formed frames that fail typed binding go to
//! [`ClientHandler::handle_error`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use hackvr_net::{ConnectionToken, Deadline, NetError, Received};
use hackvr_proto::{ClientCommand, CommandError, Parser, ServerCommand, value::SessionToken};

/// Handler for commands arriving from the server.
///
/// `handle_command` is only invoked with fully typed arguments; anything
/// that fails to bind lands in `handle_error` instead.
pub trait ClientHandler {
    /// A typed command arrived.
    fn handle_command(&mut self, server: RemoteServer<'_>, command: ClientCommand);

    /// A frame arrived whose name or arguments did not bind.
    fn handle_error(&mut self, name: &str, message: &str, args: &[String]) {
        let details = args.join(" ");
        tracing::warn!(command = name, args = %details, reason = message, "invalid command received");
    }
}

/// Sender for client-to-server commands.
pub struct RemoteServer<'a> {
    net: &'a mut hackvr_net::Client,
}

impl RemoteServer<'_> {
    /// Encode and transmit one command.
    pub fn send(&mut self, command: &ServerCommand) -> Result<(), NetError> {
        let bytes = command.encode()?;
        self.net.send(&bytes)
    }
}

/// Networked HackVR client with polling-driven command dispatch.
pub struct Client {
    net: hackvr_net::Client,
    parser: Parser,
    connected: bool,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// A client over real sockets.
    #[must_use]
    pub fn new() -> Self {
        Self::with_net(hackvr_net::Client::new())
    }

    /// A client over a preconfigured network client (custom connector,
    /// TLS config, or timeouts).
    #[must_use]
    pub fn with_net(net: hackvr_net::Client) -> Self {
        Self { net, parser: Parser::new(), connected: false }
    }

    /// Connect to a HackVR URL and perform its handshake.
    pub fn connect(
        &mut self,
        url: &str,
        session_token: Option<SessionToken>,
    ) -> Result<ConnectionToken, NetError> {
        let token = self.net.connect(url, session_token)?;
        self.parser = Parser::new();
        self.connected = true;
        Ok(token)
    }

    /// Whether the connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected && self.net.is_connected()
    }

    /// One non-blocking pump: read, parse, dispatch.
    ///
    /// Disconnects (and closes the stream) on EOF or any I/O or TLS
    /// error.
    pub fn poll<H: ClientHandler>(&mut self, handler: &mut H) {
        if !self.is_connected() {
            return;
        }
        match self.net.recv(4096, Deadline::INSTANT) {
            Err(_) | Ok(Received::Closed) => self.disconnect(),
            Ok(Received::Pending) => {}
            Ok(Received::Data(data)) => {
                self.parser.push(&data);
                while let Some(frame) = self.parser.pull() {
                    dispatch(handler, &mut self.net, &frame.name, &frame.params);
                }
            }
        }
    }

    /// Sender for client-to-server commands.
    pub fn server(&mut self) -> RemoteServer<'_> {
        RemoteServer { net: &mut self.net }
    }

    /// Close the connection. Idempotent.
    pub fn close(&mut self) {
        self.net.close();
        self.connected = false;
    }

    fn disconnect(&mut self) {
        self.net.close();
        self.connected = false;
    }
}

fn dispatch<H: ClientHandler>(
    handler: &mut H,
    net: &mut hackvr_net::Client,
    name: &str,
    args: &[String],
) {
    match ClientCommand::parse(name, args) {
        Ok(command) => handler.handle_command(RemoteServer { net }, command),
        Err(CommandError::UnknownCommand) => {
            handler.handle_error(name, "unknown command", args);
        }
        Err(error) => handler.handle_error(name, &error.to_string(), args),
    }
}
