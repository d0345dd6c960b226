//! Server-side error type.

use thiserror::Error;

/// Errors raised while configuring or running a server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid binding configuration (certificates, hostnames).
    #[error("configuration: {0}")]
    Config(String),

    /// Failure in the transport layer.
    #[error(transparent)]
    Net(#[from] hackvr_net::NetError),
}
