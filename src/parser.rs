// Fragment parser: one NUL-delimited chunk of an inbound payload -> Frame
use thiserror::Error;

use crate::frame::{Command, Frame};
use crate::headers::Headers;

/// Reasons a fragment could not be turned into a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("fragment has no command line")]
    MissingCommand,
    #[error("fragment is not valid utf-8")]
    InvalidUtf8,
}

/// Parse the raw bytes of a single fragment (NUL terminator already removed).
pub fn parse_fragment_bytes(input: &[u8]) -> Result<Frame, ParseError> {
    let text = std::str::from_utf8(input).map_err(|_| ParseError::InvalidUtf8)?;
    parse_fragment(text)
}

/// Parse a single fragment (NUL terminator already removed).
///
/// Line 0 is the command. Following lines are `key:value` headers, split on
/// the first `:`, up to the first empty line. Everything after that empty
/// line is the body, rejoined with `\n`. A fragment without the separator
/// yields headers only and an empty body.
pub fn parse_fragment(input: &str) -> Result<Frame, ParseError> {
    let normalized = input.replace("\r\n", "\n");
    // EOLs between frames are legal padding in STOMP 1.2
    let trimmed = normalized.trim_start_matches('\n');

    let mut lines = trimmed.split('\n');
    let command = match lines.next() {
        Some(line) if !line.is_empty() => Command::from(line),
        _ => return Err(ParseError::MissingCommand),
    };

    let mut headers = Headers::new();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;
    for line in lines {
        if in_body {
            body_lines.push(line);
            continue;
        }
        if line.is_empty() {
            in_body = true;
            continue;
        }
        let (key, value) = line.split_once(':').unwrap_or((line, ""));
        if key.is_empty() {
            continue;
        }
        headers.insert(key, value);
    }

    Ok(Frame {
        command,
        headers,
        body: body_lines.join("\n"),
    })
}
