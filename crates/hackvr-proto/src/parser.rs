//! Incremental byte-to-frame decoder.
//!
//! [`Parser`] accepts arbitrarily fragmented input via [`Parser::push`]
//! and yields complete frames via [`Parser::pull`]. Malformed lines
//! (stray CR, invalid UTF-8, empty, bad name or parameter) are dropped
//! silently so one bad frame cannot desynchronize the stream. Overlong
//! input trips an overflow mode that discards bytes until the next
//! `CR LF`, after which parsing resumes cleanly; an overlong frame is
//! never partially delivered.

use std::collections::VecDeque;

use bytes::{Buf, BytesMut};

use crate::codec::{MAX_LINE_LENGTH, is_valid_name, is_valid_param};

/// One decoded command line: a name and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command name, the first TAB-delimited field.
    pub name: String,
    /// Remaining TAB-delimited fields.
    pub params: Vec<String>,
}

impl Frame {
    /// Construct a frame from its fields.
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self { name: name.into(), params }
    }
}

/// Streaming frame parser.
///
/// Holds at most [`MAX_LINE_LENGTH`] buffered bytes; everything beyond
/// that is discarded through overflow recovery.
#[derive(Debug, Default)]
pub struct Parser {
    buffer: BytesMut,
    queue: VecDeque<Frame>,
    overflowed: bool,
}

impl Parser {
    /// Create an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes and extract any complete frames.
    pub fn push(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.buffer.extend_from_slice(data);
        self.extract();
    }

    /// Take the next decoded frame, if any.
    pub fn pull(&mut self) -> Option<Frame> {
        self.queue.pop_front()
    }

    fn extract(&mut self) {
        loop {
            if self.overflowed {
                if let Some(terminator) = find_crlf(&self.buffer) {
                    // Discard the tail of the oversized line and resume.
                    self.buffer.advance(terminator + 2);
                    self.overflowed = false;
                    continue;
                }
                // Everything buffered belongs to the oversized line.
                // Keep only a trailing CR, which may pair with an LF in
                // the next push; discarding it would split the recovery
                // terminator and swallow the frame after it.
                let keep = usize::from(self.buffer.last() == Some(&b'\r'));
                let discard = self.buffer.len() - keep;
                self.buffer.advance(discard);
                return;
            }

            let Some(terminator) = find_crlf(&self.buffer) else {
                if self.buffer.len() > MAX_LINE_LENGTH {
                    self.overflowed = true;
                    continue;
                }
                return;
            };

            if terminator + 2 > MAX_LINE_LENGTH {
                // A complete but oversized line; skip it whole so it is
                // never partially delivered.
                self.buffer.advance(terminator + 2);
                continue;
            }

            let line_bytes = self.buffer.split_to(terminator);
            self.buffer.advance(2);

            if line_bytes.contains(&b'\r') {
                continue;
            }
            let Ok(line) = std::str::from_utf8(&line_bytes) else {
                continue;
            };
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split('\t');
            // split always yields at least one item
            let Some(name) = fields.next() else {
                continue;
            };
            if !is_valid_name(name) {
                continue;
            }
            let params: Vec<String> = fields.map(str::to_string).collect();
            if !params.iter().all(|param| is_valid_param(param)) {
                continue;
            }

            self.queue.push_back(Frame::new(name, params));
        }
    }
}

fn find_crlf(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(parser: &mut Parser) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = parser.pull() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn decodes_single_frame() {
        let mut parser = Parser::new();
        parser.push(b"chat\tuser-1\thello\r\n");
        assert_eq!(
            parser.pull(),
            Some(Frame::new("chat", vec!["user-1".into(), "hello".into()]))
        );
        assert_eq!(parser.pull(), None);
    }

    #[test]
    fn holds_partial_lines() {
        let mut parser = Parser::new();
        parser.push(b"chat\thel");
        assert_eq!(parser.pull(), None);
        parser.push(b"lo\r\n");
        assert_eq!(parser.pull(), Some(Frame::new("chat", vec!["hello".into()])));
    }

    #[test]
    fn byte_at_a_time_matches_single_push() {
        let input = b"chat\ta\r\nset-user\tbob\r\n";
        let mut whole = Parser::new();
        whole.push(input);
        let mut trickled = Parser::new();
        for byte in input {
            trickled.push(&[*byte]);
        }
        assert_eq!(drain(&mut whole), drain(&mut trickled));
    }

    #[test]
    fn drops_malformed_lines_silently() {
        let mut parser = Parser::new();
        parser.push(b"\r\n");
        parser.push(b"bad\rcr\r\n");
        parser.push(b"\xff\xfe\r\n");
        parser.push(b"ok\r\n");
        assert_eq!(drain(&mut parser), vec![Frame::new("ok", vec![])]);
    }

    #[test]
    fn drops_lines_with_control_chars() {
        let mut parser = Parser::new();
        parser.push(b"na\x07me\tp\r\n");
        parser.push(b"name\tp\x07\r\n");
        parser.push(b"name\tp\nq\r\n");
        assert_eq!(drain(&mut parser), vec![Frame::new("name", vec!["p\nq".into()])]);
    }

    #[test]
    fn exact_limit_parses_and_over_limit_is_skipped() {
        // 1024 bytes including CR LF.
        let mut parser = Parser::new();
        let name = "a".repeat(MAX_LINE_LENGTH - 2);
        parser.push(name.as_bytes());
        parser.push(b"\r\n");
        assert_eq!(parser.pull(), Some(Frame::new(name, vec![])));

        // 1025 bytes is discarded; the following frame still arrives.
        let mut parser = Parser::new();
        let long = "a".repeat(MAX_LINE_LENGTH - 1);
        parser.push(long.as_bytes());
        parser.push(b"\r\nping\r\n");
        assert_eq!(drain(&mut parser), vec![Frame::new("ping", vec![])]);
    }

    #[test]
    fn overflow_recovery_resumes_at_next_terminator() {
        let mut parser = Parser::new();
        let mut input = vec![b'a'; 1100];
        input.extend_from_slice(b"\r\nping\r\n");
        parser.push(&input);
        assert_eq!(drain(&mut parser), vec![Frame::new("ping", vec![])]);
    }

    #[test]
    fn complete_frames_ahead_of_overflow_are_delivered() {
        let mut parser = Parser::new();
        let mut input = b"chat\thi\r\n".to_vec();
        input.extend_from_slice(&[b'x'; 2000]);
        parser.push(&input);
        assert_eq!(parser.pull(), Some(Frame::new("chat", vec!["hi".into()])));
        assert_eq!(parser.pull(), None);
        parser.push(b"\r\nping\r\n");
        assert_eq!(parser.pull(), Some(Frame::new("ping", vec![])));
    }

    #[test]
    fn overflow_spanning_many_pushes() {
        let mut parser = Parser::new();
        for _ in 0..100 {
            parser.push(&[b'x'; 100]);
        }
        assert_eq!(parser.pull(), None);
        parser.push(b"\r\npong\tv\r\n");
        assert_eq!(drain(&mut parser), vec![Frame::new("pong", vec!["v".into()])]);
    }

    #[test]
    fn overflow_split_before_recovery_terminator_keeps_next_frame() {
        // An overflow line, its terminator, a short valid frame, and the
        // start of another long line. Fragmenting right at the overflow
        // boundary must decode the same as one push.
        let mut tail = b"\r\nu\r\n".to_vec();
        tail.extend_from_slice(&[b'v'; 1020]);

        let mut whole = Parser::new();
        let mut input = vec![b'a'; 1100];
        input.extend_from_slice(&tail);
        whole.push(&input);

        let mut fragmented = Parser::new();
        fragmented.push(&[b'a'; 1100]);
        fragmented.push(&tail);

        assert_eq!(drain(&mut whole), vec![Frame::new("u", vec![])]);
        assert_eq!(drain(&mut fragmented), vec![Frame::new("u", vec![])]);
    }

    #[test]
    fn overflow_terminator_split_between_cr_and_lf() {
        let mut parser = Parser::new();
        let mut input = vec![b'a'; 1100];
        input.push(b'\r');
        parser.push(&input);
        assert_eq!(parser.pull(), None);
        parser.push(b"\nping\r\n");
        assert_eq!(drain(&mut parser), vec![Frame::new("ping", vec![])]);
    }
}
