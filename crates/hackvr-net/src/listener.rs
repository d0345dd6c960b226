//! Server-side listeners and the per-protocol accept handshake.
//!
//! A [`Binding`] couples a [`Listener`] with a [`Protocol`] and performs
//! that dialect's accept-side handshake: for the native dialects the
//! server transmits its hello before reading the client's; for the
//! Upgrade dialects it answers the request with `101 Switching
//! Protocols`. A handshake failure closes the stream and surfaces the
//! error; the listener itself stays usable.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use url::Url;

use crate::{
    deadline::Deadline,
    error::NetError,
    handshake,
    stream::NetStream,
    tcp::{RawListener, TcpTransport},
    tls::{TlsServerCertificate, TlsServerTransport, build_server_config},
    token::{ConnectionToken, Protocol},
};

/// Acceptor of inbound streams.
pub trait Listener: Send {
    /// Accept one stream before the deadline, or return `None`.
    fn accept(&mut self, deadline: Deadline)
    -> Result<Option<(NetStream, SocketAddr)>, NetError>;

    /// The bound local address.
    fn local_addr(&self) -> Result<SocketAddr, NetError>;

    /// Stop listening. Idempotent.
    fn close(&mut self);
}

/// Plain TCP listener.
pub struct PlainListener {
    inner: RawListener,
}

impl PlainListener {
    /// Bind to `host:port` with `SO_REUSEADDR`.
    pub fn bind(host: &str, port: u16) -> Result<Self, NetError> {
        Ok(Self { inner: RawListener::bind(host, port)? })
    }
}

impl Listener for PlainListener {
    fn accept(
        &mut self,
        deadline: Deadline,
    ) -> Result<Option<(NetStream, SocketAddr)>, NetError> {
        let Some((sock, addr)) = self.inner.accept(deadline)? else {
            return Ok(None);
        };
        Ok(Some((NetStream::new(Box::new(TcpTransport::new(sock))), addr)))
    }

    fn local_addr(&self) -> Result<SocketAddr, NetError> {
        self.inner.local_addr()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

/// TLS listener; completes the TLS handshake synchronously on accept.
pub struct TlsListener {
    inner: RawListener,
    config: Arc<rustls::ServerConfig>,
}

impl TlsListener {
    /// Bind to `host:port` and serve `certificate`.
    pub fn bind(
        host: &str,
        port: u16,
        certificate: &TlsServerCertificate,
    ) -> Result<Self, NetError> {
        let config = build_server_config(certificate)?;
        Ok(Self { inner: RawListener::bind(host, port)?, config })
    }
}

impl Listener for TlsListener {
    fn accept(
        &mut self,
        deadline: Deadline,
    ) -> Result<Option<(NetStream, SocketAddr)>, NetError> {
        let Some((sock, addr)) = self.inner.accept(deadline)? else {
            return Ok(None);
        };
        let transport = TlsServerTransport::accept(sock, Arc::clone(&self.config))?;
        Ok(Some((NetStream::new(Box::new(transport)), addr)))
    }

    fn local_addr(&self) -> Result<SocketAddr, NetError> {
        self.inner.local_addr()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

/// One listening endpoint speaking one protocol dialect.
pub struct Binding {
    protocol: Protocol,
    listener: Box<dyn Listener>,
    hello_timeout: Duration,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("protocol", &self.protocol)
            .field("hello_timeout", &self.hello_timeout)
            .finish_non_exhaustive()
    }
}

impl Binding {
    /// Bind a listener for `protocol` on `host:port`.
    ///
    /// TLS dialects require a certificate; plain dialects reject one.
    pub fn bind(
        protocol: Protocol,
        host: &str,
        port: u16,
        certificate: Option<&TlsServerCertificate>,
    ) -> Result<Self, NetError> {
        let listener: Box<dyn Listener> = if protocol.is_secure() {
            let certificate = certificate.ok_or_else(|| {
                NetError::TlsConfig("tls bindings require a certificate".to_string())
            })?;
            Box::new(TlsListener::bind(host, port, certificate)?)
        } else {
            if certificate.is_some() {
                return Err(NetError::TlsConfig(
                    "non-tls bindings do not use certificates".to_string(),
                ));
            }
            Box::new(PlainListener::bind(host, port)?)
        };
        Ok(Self::with_listener(protocol, listener))
    }

    /// Couple `protocol` with an existing listener (tests inject
    /// scripted listeners here).
    #[must_use]
    pub fn with_listener(protocol: Protocol, listener: Box<dyn Listener>) -> Self {
        Self { protocol, listener, hello_timeout: handshake::DEFAULT_HELLO_TIMEOUT }
    }

    /// Override the hello read timeout.
    #[must_use]
    pub fn with_hello_timeout(mut self, timeout: Duration) -> Self {
        self.hello_timeout = timeout;
        self
    }

    /// The dialect this binding speaks.
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        self.listener.local_addr()
    }

    /// Accept one connection and run the accept-side handshake.
    ///
    /// `None` when no connection arrived before the deadline. On a
    /// handshake failure the stream is closed and the error returned;
    /// callers keep accepting.
    pub fn accept(
        &mut self,
        deadline: Deadline,
    ) -> Result<Option<(NetStream, SocketAddr, ConnectionToken)>, NetError> {
        let Some((mut stream, addr)) = self.listener.accept(deadline)? else {
            return Ok(None);
        };
        match self.handshake(&mut stream) {
            Ok(token) => Ok(Some((stream, addr, token))),
            Err(error) => {
                stream.close();
                Err(error)
            }
        }
    }

    /// Stop listening. Idempotent.
    pub fn close(&mut self) {
        self.listener.close();
    }

    fn handshake(&mut self, stream: &mut NetStream) -> Result<ConnectionToken, NetError> {
        let deadline = Deadline::from_now(self.hello_timeout)?;
        if self.protocol.is_upgrade() {
            let request = handshake::receive_upgrade_request(stream, deadline)?;
            handshake::send_upgrade_response(stream)?;
            let mut source_url = Url::parse(&format!(
                "{}://{}{}",
                self.protocol.scheme(),
                request.host,
                request.path
            ))
            .map_err(|error| NetError::Handshake(format!("bad request url: {error}")))?;
            source_url.set_fragment(None);
            Ok(ConnectionToken {
                source_url,
                session_token: request.session_token,
                protocol: self.protocol,
                is_secure: self.protocol.is_secure(),
            })
        } else {
            // Server greets first, then reads the client hello.
            handshake::send_hello(stream, None, None)?;
            let hello = handshake::receive_client_hello(stream, deadline)?;
            Ok(ConnectionToken {
                source_url: hello.source_url,
                session_token: hello.session_token,
                protocol: self.protocol,
                is_secure: self.protocol.is_secure(),
            })
        }
    }
}
