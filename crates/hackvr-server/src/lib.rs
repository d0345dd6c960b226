//! HackVR server: accept connections on any mix of protocol bindings
//! and pump their commands through typed session handlers.
//!
//! # Architecture
//!
//! The loop is cooperative and single-threaded. [`Server`] owns the
//! listeners and live connections; each iteration performs a
//! non-blocking accept attempt per binding (the handshake runs
//! synchronously under its own 500 ms deadline), a non-blocking poll per
//! connection, and a short sleep. Applications plug in at two seams:
//! [`ServerHandler`] builds per-connection [`SessionHandler`]s, and each
//! session receives typed [`hackvr_proto::ServerCommand`]s plus a
//! [`RemoteClient`] for answering.
//!
//! Applications needing many concurrent handshakes should shard servers;
//! the core intentionally does not thread.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod error;
mod server;

pub use connection::{Connection, RemoteClient, SessionHandler};
pub use error::ServerError;
pub use server::{Server, ServerHandler, StopHandle};
