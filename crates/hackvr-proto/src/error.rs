//! Error types for the HackVR wire layer.
//!
//! Each layer has its own error enum: value-grammar violations
//! ([`ParseError`]), frame codec violations ([`CodecError`]), selector
//! pattern violations ([`GlobError`]), and dispatch failures
//! ([`CommandError`]). The streaming parser reports nothing - malformed
//! frames are dropped silently so a single bad line cannot desynchronize
//! the stream.

use thiserror::Error;

/// A value failed its wire-grammar validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// String parameter was empty where a non-empty value is required.
    #[error("string must be non-empty")]
    EmptyString,

    /// Not `0` or `[1-9][0-9]*`, or out of range.
    #[error("invalid int")]
    InvalidInt,

    /// Not `-?[0-9]+(\.[0-9]+)?`.
    #[error("invalid float")]
    InvalidFloat,

    /// Not the literal `true` or `false`.
    #[error("invalid bool")]
    InvalidBool,

    /// Not `( f f )` / `( f f f )` with optional inner whitespace.
    #[error("invalid vector")]
    InvalidVector,

    /// Not `#` followed by exactly six hex digits.
    #[error("invalid color")]
    InvalidColor,

    /// Wrong length or non-hex characters for a fixed byte string.
    #[error("invalid bytes")]
    InvalidBytes,

    /// Missing scheme, whitespace, or control characters in a URI.
    #[error("invalid uri")]
    InvalidUri,

    /// User id contained LF.
    #[error("userid contains LF")]
    UserIdLineFeed,

    /// User id had leading or trailing whitespace.
    #[error("userid has leading/trailing whitespace")]
    UserIdWhitespace,

    /// User id was 128 characters or longer.
    #[error("userid too long")]
    UserIdTooLong,

    /// Not a segmented identifier or reserved `$` form.
    #[error("invalid identifier")]
    InvalidIdentifier,

    /// Not a member of the expected enum set.
    #[error("invalid enum")]
    InvalidEnum,

    /// Not `v[1-9][0-9]*`.
    #[error("invalid version")]
    InvalidVersion,

    /// Session token was not 43 characters long.
    #[error("invalid session token length")]
    SessionTokenLength,

    /// Session token contained characters outside the base64url alphabet.
    #[error("invalid session token characters")]
    SessionTokenCharacters,

    /// Session token did not decode to exactly 32 bytes.
    #[error("invalid session token bytes")]
    SessionTokenBytes,
}

/// A frame could not be encoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Command name was empty or contained control characters.
    #[error("invalid command name")]
    InvalidName,

    /// A parameter contained a control character other than LF.
    #[error("invalid parameter")]
    InvalidParam,

    /// The encoded line exceeded the 1024-byte frame limit.
    #[error("command exceeds maximum length ({length} > {max})")]
    LineTooLong {
        /// Encoded length including the terminator.
        length: usize,
        /// The frame limit.
        max: usize,
    },
}

/// A selector token or pattern violated the glob grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlobError {
    /// Empty pattern, empty part, or malformed braces.
    #[error("invalid pattern: {0}")]
    InvalidPattern(&'static str),

    /// A group item or literal failed part validation.
    #[error("invalid pattern literal")]
    InvalidLiteral,

    /// A `{m..n}` range had non-numeric endpoints or `m > n`.
    #[error("invalid range")]
    InvalidRange,

    /// `expand` was called on a pattern containing `*` or `?`.
    #[error("cannot expand patterns containing wildcards")]
    WildcardExpansion,
}

/// A command could not be bound to its typed handler signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command name is not in this role's vocabulary.
    #[error("unknown command")]
    UnknownCommand,

    /// A positional or list element failed its value parser.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Trailing tuple-list token count was not a multiple of the tuple size.
    #[error("list tuple payload does not align")]
    TupleMisaligned,
}
