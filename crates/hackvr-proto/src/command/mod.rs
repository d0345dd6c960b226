//! Command vocabulary and typed dispatch tables.
//!
//! The protocol has two fixed vocabularies: [`ClientCommand`] is the set a
//! client receives (server-to-client), [`ServerCommand`] the set a server
//! receives (client-to-server). Each variant carries the command's typed
//! parameters; `parse` binds wire tokens left to right, and `params`
//! produces the canonical serialization.
//!
//! Binding rules:
//! - a missing trailing argument reads as the empty token
//! - an optional parameter is absent exactly when its token is empty
//! - only the final parameter may be a list; tuple lists require a token
//!   count that is a multiple of the tuple size
//! - surplus arguments beyond the parameter list are ignored
//!
//! A failed parse never reaches a handler; callers route
//! [`CommandError`] into their `handle_error` hook instead.

mod client;
mod server;

pub use client::{ClientCommand, Triangle};
pub use server::ServerCommand;

use crate::error::{CommandError, ParseError};

/// Left-to-right reader over wire arguments.
pub(crate) struct Args<'a> {
    values: &'a [String],
    index: usize,
}

impl<'a> Args<'a> {
    pub(crate) fn new(values: &'a [String]) -> Self {
        Self { values, index: 0 }
    }

    /// The next token, or the empty token when the argument list is
    /// exhausted.
    fn next_token(&mut self) -> &'a str {
        let token = self.values.get(self.index).map_or("", String::as_str);
        self.index += 1;
        token
    }

    /// Parse a required parameter.
    pub(crate) fn required<T>(
        &mut self,
        parse: impl FnOnce(&str) -> Result<T, ParseError>,
    ) -> Result<T, CommandError> {
        parse(self.next_token()).map_err(CommandError::from)
    }

    /// Parse an optional parameter; the empty token means absent.
    pub(crate) fn optional<T>(
        &mut self,
        parse: impl FnOnce(&str) -> Result<T, ParseError>,
    ) -> Result<Option<T>, CommandError> {
        let token = self.next_token();
        if token.is_empty() {
            Ok(None)
        } else {
            parse(token).map(Some).map_err(CommandError::from)
        }
    }

    /// A required non-empty string parameter.
    pub(crate) fn string(&mut self) -> Result<String, CommandError> {
        let token = self.next_token();
        if token.is_empty() {
            Err(ParseError::EmptyString.into())
        } else {
            Ok(token.to_string())
        }
    }

    /// An optional string parameter.
    pub(crate) fn optional_string(&mut self) -> Option<String> {
        let token = self.next_token();
        if token.is_empty() { None } else { Some(token.to_string()) }
    }

    /// A possibly-empty string parameter (`ZString` / `AnyValue`).
    pub(crate) fn zstring(&mut self) -> String {
        self.next_token().to_string()
    }

    /// All remaining tokens, for a trailing list parameter.
    pub(crate) fn rest(&mut self) -> &'a [String] {
        let rest = self.values.get(self.index..).unwrap_or(&[]);
        self.index = self.values.len();
        rest
    }

    /// Parse a trailing `list<T>` parameter.
    pub(crate) fn list<T>(
        &mut self,
        parse: impl Fn(&str) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, CommandError> {
        self.rest()
            .iter()
            .map(|token| parse(token).map_err(CommandError::from))
            .collect()
    }
}

/// Serialize an optional parameter: absent values become the empty
/// token.
pub(crate) fn optional_param<T: std::fmt::Display>(value: Option<&T>) -> String {
    value.map_or_else(String::new, ToString::to_string)
}

/// Serialize an optional float with canonical trimming.
pub(crate) fn optional_float(value: Option<f64>) -> String {
    value.map_or_else(String::new, crate::value::format_float)
}
