//! Error types for the HackVR transport layer.
//!
//! Two regimes: before a handshake completes every violation is loud
//! ([`NetError::Handshake`] or [`NetError::Timeout`], fatal to that
//! connection); after it, I/O and TLS failures surface here and the poll
//! loop treats them as disconnects.

use thiserror::Error;

/// Errors from connecting, listening, handshaking, and stream I/O.
#[derive(Error, Debug)]
pub enum NetError {
    /// A deadline was reached.
    #[error("deadline reached")]
    Timeout,

    /// The peer violated the handshake protocol.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The URL scheme is not a HackVR protocol.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// The URL could not be parsed or is missing required parts.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// An explicit session token and a URL-fragment token disagree.
    #[error("session token mismatch between fragment and parameter")]
    SessionTokenMismatch,

    /// Certificate or TLS parameter problems.
    #[error("tls configuration: {0}")]
    TlsConfig(String),

    /// TLS protocol failure on an established stream.
    #[error("tls: {0}")]
    Tls(#[from] rustls::Error),

    /// Operation on a client that is not connected.
    #[error("not connected")]
    NotConnected,

    /// Outbound frame failed to encode.
    #[error(transparent)]
    Codec(#[from] hackvr_proto::CodecError),

    /// Underlying socket failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
