//! TLS transports, listener, and certificate material.
//!
//! TLS runs over the same deadline-driven TCP sockets as plain
//! connections: the record layer reads through [`rustls::StreamOwned`]
//! while read modes are applied to the underlying socket. Server
//! bindings take a PEM certificate/key pair; the TLS handshake completes
//! synchronously before a connection is handed to the accept logic.
//!
//! The default client configuration does not verify the server
//! certificate and is only suitable for development; production callers
//! must supply their own [`rustls::ClientConfig`].

use std::{io::{Read, Write}, net::TcpStream, path::Path, sync::Arc};

use rustls::{
    ClientConfig, ClientConnection, ServerConfig, ServerConnection, StreamOwned,
    pki_types::ServerName,
};

use crate::{
    deadline::Deadline,
    error::NetError,
    stream::{Received, Transport},
    tcp::{configure_read_mode, read_outcome},
};

/// PEM-encoded certificate chain and private key for TLS servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsServerCertificate {
    /// Certificate chain, PEM.
    pub cert_pem: Vec<u8>,
    /// Private key, PEM.
    pub key_pem: Vec<u8>,
}

impl TlsServerCertificate {
    /// Build from in-memory PEM blobs.
    #[must_use]
    pub fn new(cert_pem: Vec<u8>, key_pem: Vec<u8>) -> Self {
        Self { cert_pem, key_pem }
    }

    /// Load the PEM pair from disk.
    pub fn from_files(cert_file: &Path, key_file: &Path) -> Result<Self, NetError> {
        Ok(Self { cert_pem: std::fs::read(cert_file)?, key_pem: std::fs::read(key_file)? })
    }
}

/// Build a server config from a PEM certificate pair.
pub(crate) fn build_server_config(
    certificate: &TlsServerCertificate,
) -> Result<Arc<ServerConfig>, NetError> {
    let certs = rustls_pemfile::certs(&mut certificate.cert_pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| NetError::TlsConfig(format!("failed to parse certificates: {error}")))?;
    if certs.is_empty() {
        return Err(NetError::TlsConfig("no certificates found".to_string()));
    }

    let key = rustls_pemfile::private_key(&mut certificate.key_pem.as_slice())
        .map_err(|error| NetError::TlsConfig(format!("failed to parse private key: {error}")))?
        .ok_or_else(|| NetError::TlsConfig("no private key found".to_string()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|error| NetError::TlsConfig(format!("invalid tls config: {error}")))?;
    Ok(Arc::new(config))
}

/// Default client config: accepts any server certificate.
///
/// Development posture only; it still encrypts but authenticates
/// nothing. A warning is logged once per connection.
pub(crate) fn insecure_client_config() -> Arc<ClientConfig> {
    let config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(InsecureCertVerifier))
        .with_no_client_auth();
    Arc::new(config)
}

/// TLS client transport over TCP.
pub struct TlsClientTransport {
    stream: StreamOwned<ClientConnection, TcpStream>,
}

impl TlsClientTransport {
    /// Connect, set SNI to `host`, and complete the TLS handshake.
    pub fn connect(
        host: &str,
        port: u16,
        config: Option<Arc<ClientConfig>>,
    ) -> Result<Self, NetError> {
        let config = match config {
            Some(config) => config,
            None => {
                tracing::warn!("using certificate-accepting tls client config");
                insecure_client_config()
            }
        };
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| NetError::TlsConfig(format!("invalid server name: {host}")))?;
        let connection = ClientConnection::new(config, server_name)?;
        let sock = TcpStream::connect((host, port))?;
        let mut stream = StreamOwned::new(connection, sock);
        complete_handshake(&mut stream.conn, &mut stream.sock)?;
        Ok(Self { stream })
    }
}

/// TLS server transport over an accepted TCP socket.
pub struct TlsServerTransport {
    stream: StreamOwned<ServerConnection, TcpStream>,
}

impl TlsServerTransport {
    /// Wrap an accepted socket and complete the TLS handshake.
    pub fn accept(sock: TcpStream, config: Arc<ServerConfig>) -> Result<Self, NetError> {
        let connection = ServerConnection::new(config)?;
        let mut stream = StreamOwned::new(connection, sock);
        complete_handshake(&mut stream.conn, &mut stream.sock)?;
        Ok(Self { stream })
    }
}

/// Drive a TLS handshake to completion on a blocking socket.
fn complete_handshake<C, S>(conn: &mut C, sock: &mut TcpStream) -> Result<(), NetError>
where
    C: std::ops::DerefMut<Target = rustls::ConnectionCommon<S>>,
    S: rustls::SideData,
{
    sock.set_nonblocking(false)?;
    sock.set_read_timeout(None)?;
    while conn.is_handshaking() {
        conn.complete_io(sock)?;
    }
    Ok(())
}

macro_rules! impl_tls_transport {
    ($name:ident) => {
        impl Transport for $name {
            fn recv_unbuffered(
                &mut self,
                max_len: usize,
                deadline: Deadline,
            ) -> Result<Received, NetError> {
                if max_len == 0 {
                    return Ok(Received::Data(Vec::new()));
                }
                configure_read_mode(&self.stream.sock, deadline)?;
                let mut buffer = vec![0u8; max_len];
                let result = self.stream.read(&mut buffer);
                read_outcome(result, buffer)
            }

            fn send(&mut self, data: &[u8]) -> Result<(), NetError> {
                self.stream.sock.set_nonblocking(false)?;
                self.stream.write_all(data)?;
                self.stream.flush()?;
                Ok(())
            }

            fn close(&mut self) {
                self.stream.conn.send_close_notify();
                let _ = self.stream.flush();
                let _ = self.stream.sock.shutdown(std::net::Shutdown::Both);
            }
        }
    };
}

impl_tls_transport!(TlsClientTransport);
impl_tls_transport!(TlsServerTransport);

/// Certificate verifier that accepts any certificate (insecure,
/// development only).
#[derive(Debug)]
struct InsecureCertVerifier;

impl rustls::client::danger::ServerCertVerifier for InsecureCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

