//! HackVR wire protocol.
//!
//! The protocol is a bidirectional stream of TAB-delimited, CRLF-terminated
//! command lines over a byte transport. This crate is the pure wire layer:
//! no sockets, no clocks, no application state.
//!
//! # Components
//!
//! - [`value`]: typed values of the parameter grammar (ints, floats,
//!   vectors, colors, identifiers, tokens) with canonical serialization
//! - [`codec`]: single-frame encoding with charset validation and the
//!   1024-byte frame limit
//! - [`parser`]: incremental byte-to-frame decoding with overflow-skip
//!   recovery
//! - [`glob`]: selector patterns (`*`, `?`, `{a,b}`, `{m..n}`) over
//!   segmented identifiers
//! - [`command`]: the two command vocabularies as sum types with typed
//!   parse/serialize tables
//!
//! Inbound data flows `bytes → parser → Frame → command::parse → typed
//! handler`; outbound flows `command → params → codec::encode → bytes`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod command;
pub mod error;
pub mod glob;
pub mod parser;
pub mod value;

pub use command::{ClientCommand, ServerCommand};
pub use error::{CodecError, CommandError, GlobError, ParseError};
pub use parser::{Frame, Parser};
