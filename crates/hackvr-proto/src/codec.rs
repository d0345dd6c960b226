//! Frame encoder for the HackVR line protocol.
//!
//! A frame is one command line: `name TAB param TAB ... CR LF`, at most
//! [`MAX_LINE_LENGTH`] bytes including the terminator. The encoder
//! normalizes line endings inside parameters (`CR LF` and lone `CR`
//! become `LF`) so a carriage return can never appear inside a frame
//! body.

use crate::error::CodecError;

/// Maximum encoded frame length in bytes, terminator included.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Whether `value` is a valid command name: non-empty, no control
/// characters.
#[must_use]
pub fn is_valid_name(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(char::is_control)
}

/// Whether `value` is a valid parameter: no control characters except
/// LF.
#[must_use]
pub fn is_valid_param(value: &str) -> bool {
    !value.chars().any(|ch| ch.is_control() && ch != '\n')
}

/// Encode one command line.
///
/// # Errors
///
/// - [`CodecError::InvalidName`] if the name is empty or contains
///   control characters
/// - [`CodecError::InvalidParam`] if a parameter still contains a
///   control character other than LF after newline normalization
/// - [`CodecError::LineTooLong`] if the encoded line exceeds
///   [`MAX_LINE_LENGTH`] bytes
pub fn encode<S: AsRef<str>>(name: &str, params: &[S]) -> Result<Vec<u8>, CodecError> {
    let name = normalize_newlines(name);
    if !is_valid_name(&name) {
        return Err(CodecError::InvalidName);
    }

    let mut line = String::with_capacity(name.len() + 16 * params.len());
    line.push_str(&name);
    for param in params {
        let param = normalize_newlines(param.as_ref());
        if !is_valid_param(&param) {
            return Err(CodecError::InvalidParam);
        }
        line.push('\t');
        line.push_str(&param);
    }
    line.push_str("\r\n");

    if line.len() > MAX_LINE_LENGTH {
        return Err(CodecError::LineTooLong { length: line.len(), max: MAX_LINE_LENGTH });
    }
    Ok(line.into_bytes())
}

fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_tab_joined_crlf_terminated() {
        let bytes = encode("chat", &["user-1", "hello"]).unwrap();
        assert_eq!(bytes, b"chat\tuser-1\thello\r\n");
    }

    #[test]
    fn encodes_without_params() {
        assert_eq!(encode::<&str>("cancel-input", &[]).unwrap(), b"cancel-input\r\n");
    }

    #[test]
    fn normalizes_carriage_returns_in_params() {
        let bytes = encode("chat", &["a\r\nb\rc"]).unwrap();
        assert_eq!(bytes, b"chat\ta\nb\nc\r\n");
    }

    #[test]
    fn rejects_bad_names() {
        assert_eq!(encode::<&str>("", &[]), Err(CodecError::InvalidName));
        assert_eq!(encode::<&str>("ch\x07at", &[]), Err(CodecError::InvalidName));
        // A CR in the name normalizes to LF, which is still a control char.
        assert_eq!(encode::<&str>("ch\rat", &[]), Err(CodecError::InvalidName));
    }

    #[test]
    fn rejects_control_chars_in_params() {
        assert_eq!(encode("chat", &["a\x00b"]), Err(CodecError::InvalidParam));
        // LF is the one permitted control character.
        assert!(encode("chat", &["a\nb"]).is_ok());
    }

    #[test]
    fn enforces_frame_limit() {
        let payload = "a".repeat(MAX_LINE_LENGTH - 7);
        assert!(encode("chat", &[payload.as_str()]).is_ok());
        let payload = "a".repeat(MAX_LINE_LENGTH - 6);
        assert!(matches!(
            encode("chat", &[payload.as_str()]),
            Err(CodecError::LineTooLong { .. })
        ));
    }
}
