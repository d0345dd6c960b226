//! HackVR transports.
//!
//! Everything between raw sockets and the command layer: monotonic
//! [`Deadline`]s, the buffered [`NetStream`] over pluggable
//! [`Transport`]s, plain-TCP and TLS connectors and listeners, the four
//! handshake dialects, and the [`ConnectionToken`] a completed handshake
//! produces.
//!
//! # Dialects
//!
//! | Scheme | Transport | Handshake | Default port |
//! |---|---|---|---|
//! | `hackvr` | TCP | hello exchange | 1913 |
//! | `hackvrs` | TLS | hello exchange | 19133 |
//! | `http+hackvr` | TCP | HTTP/1.1 Upgrade | 80 |
//! | `https+hackvr` | TLS | HTTP/1.1 Upgrade | 443 |
//!
//! In the hello dialects the server transmits its hello before reading
//! the client's. All four converge on the same command traffic once the
//! handshake completes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod deadline;
mod error;
mod handshake;
mod listener;
mod stream;
mod tcp;
mod tls;
mod token;

pub use client::{Client, DefaultConnector, StreamConnector};
pub use deadline::Deadline;
pub use error::NetError;
pub use handshake::{DEFAULT_HELLO_TIMEOUT, HELLO_COMMAND};
pub use listener::{Binding, Listener, PlainListener, TlsListener};
pub use stream::{NetStream, Received, Transport};
pub use tcp::{RawListener, TcpTransport};
pub use tls::{TlsClientTransport, TlsServerCertificate, TlsServerTransport};
pub use token::{ConnectionToken, Protocol};
