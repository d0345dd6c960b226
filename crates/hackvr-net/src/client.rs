//! Client-side connection establishment.
//!
//! [`Client`] resolves a HackVR URL to a dialect, connects through a
//! [`StreamConnector`], runs the dialect's handshake, and exposes the
//! resulting buffered stream. Connectors are pluggable so tests can
//! substitute scripted transports.

use std::{sync::Arc, time::Duration};

use hackvr_proto::value::SessionToken;
use url::Url;

use crate::{
    deadline::Deadline,
    error::NetError,
    handshake,
    stream::{NetStream, Received},
    tcp::TcpTransport,
    tls::TlsClientTransport,
    token::{ConnectionToken, Protocol},
};

/// Factory for outbound streams.
pub trait StreamConnector {
    /// Open a plain TCP stream to `host:port`.
    fn connect_raw(&mut self, host: &str, port: u16) -> Result<NetStream, NetError>;

    /// Open a TLS stream to `host:port` with SNI set to `host`. `config`
    /// overrides the default (certificate-accepting) client config.
    fn connect_tls(
        &mut self,
        host: &str,
        port: u16,
        config: Option<Arc<rustls::ClientConfig>>,
    ) -> Result<NetStream, NetError>;
}

/// Socket-backed connector used outside tests.
#[derive(Debug, Default)]
pub struct DefaultConnector;

impl StreamConnector for DefaultConnector {
    fn connect_raw(&mut self, host: &str, port: u16) -> Result<NetStream, NetError> {
        Ok(NetStream::new(Box::new(TcpTransport::connect(host, port)?)))
    }

    fn connect_tls(
        &mut self,
        host: &str,
        port: u16,
        config: Option<Arc<rustls::ClientConfig>>,
    ) -> Result<NetStream, NetError> {
        Ok(NetStream::new(Box::new(TlsClientTransport::connect(host, port, config)?)))
    }
}

/// HackVR network client supporting all four URL schemes.
pub struct Client {
    connector: Box<dyn StreamConnector>,
    tls_config: Option<Arc<rustls::ClientConfig>>,
    hello_timeout: Duration,
    stream: Option<NetStream>,
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
        Self::with_connector(Box::new(DefaultConnector))
    }

    /// A client over a custom connector.
    #[must_use]
    pub fn with_connector(connector: Box<dyn StreamConnector>) -> Self {
        Self {
            connector,
            tls_config: None,
            hello_timeout: handshake::DEFAULT_HELLO_TIMEOUT,
            stream: None,
        }
    }

    /// Override the hello read timeout.
    #[must_use]
    pub fn with_hello_timeout(mut self, timeout: Duration) -> Self {
        self.hello_timeout = timeout;
        self
    }

    /// Use a verified TLS client config instead of the development
    /// default.
    #[must_use]
    pub fn with_tls_config(mut self, config: Arc<rustls::ClientConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Connect to a HackVR URL and perform its handshake.
    ///
    /// A fragment on the URL is read as a session token; when
    /// `session_token` is also given the two must be equal.
    ///
    /// # Errors
    ///
    /// [`NetError::UnsupportedScheme`] / [`NetError::InvalidUrl`] for bad
    /// URLs, [`NetError::SessionTokenMismatch`] for conflicting tokens,
    /// [`NetError::Handshake`] / [`NetError::Timeout`] for a misbehaving
    /// peer, or transport errors.
    pub fn connect(
        &mut self,
        url: &str,
        session_token: Option<SessionToken>,
    ) -> Result<ConnectionToken, NetError> {
        let parsed =
            Url::parse(url).map_err(|error| NetError::InvalidUrl(error.to_string()))?;
        let protocol = Protocol::from_scheme(parsed.scheme())
            .ok_or_else(|| NetError::UnsupportedScheme(parsed.scheme().to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| NetError::InvalidUrl("url must include hostname".to_string()))?
            .to_string();
        let port = parsed.port().unwrap_or_else(|| protocol.default_port());
        let session_token = resolve_session_token(&parsed, session_token)?;

        let mut source_url = parsed.clone();
        source_url.set_fragment(None);

        let mut stream = if protocol.is_secure() {
            self.connector.connect_tls(&host, port, self.tls_config.clone())?
        } else {
            self.connector.connect_raw(&host, port)?
        };

        let deadline = Deadline::from_now(self.hello_timeout)?;
        if protocol.is_upgrade() {
            handshake::send_upgrade_request(
                &mut stream,
                &host,
                port,
                &request_path(&parsed),
                session_token.as_ref(),
            )?;
            handshake::receive_upgrade_response(&mut stream, deadline)?;
        } else {
            handshake::send_hello(
                &mut stream,
                Some(source_url.as_str()),
                session_token.as_ref(),
            )?;
            handshake::receive_server_hello(&mut stream, deadline)?;
        }

        self.stream = Some(stream);
        Ok(ConnectionToken {
            source_url,
            session_token,
            protocol,
            is_secure: protocol.is_secure(),
        })
    }

    /// Whether a connection is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Receive from the connection's buffered stream.
    pub fn recv(&mut self, max_len: usize, deadline: Deadline) -> Result<Received, NetError> {
        self.stream.as_mut().ok_or(NetError::NotConnected)?.recv(max_len, deadline)
    }

    /// Send raw bytes on the connection.
    pub fn send(&mut self, data: &[u8]) -> Result<(), NetError> {
        self.stream.as_mut().ok_or(NetError::NotConnected)?.send(data)
    }

    /// Close the connection, if any. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
    }
}

/// Merge an explicit session token with a URL-fragment token.
fn resolve_session_token(
    parsed: &Url,
    explicit: Option<SessionToken>,
) -> Result<Option<SessionToken>, NetError> {
    let Some(fragment) = parsed.fragment().filter(|fragment| !fragment.is_empty()) else {
        return Ok(explicit);
    };
    let fragment_token: SessionToken = fragment
        .parse()
        .map_err(|error| NetError::InvalidUrl(format!("bad session token fragment: {error}")))?;
    match explicit {
        Some(explicit) if explicit != fragment_token => Err(NetError::SessionTokenMismatch),
        Some(explicit) => Ok(Some(explicit)),
        None => Ok(Some(fragment_token)),
    }
}

/// Path (plus query) for the HTTP Upgrade request line.
fn request_path(parsed: &Url) -> String {
    let path = if parsed.path().is_empty() { "/" } else { parsed.path() };
    match parsed.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}
