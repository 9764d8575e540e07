use bytes::{BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::frame::Frame;
use crate::parser::parse_fragment_bytes;

/// Encode a frame into its wire text.
///
/// The layout is `COMMAND\n`, the header lines joined with `\n`, a blank
/// line, the body and a single NUL terminator. Header order is the caller's
/// insertion order and no headers are added implicitly.
pub fn encode_frame(frame: &Frame) -> String {
    let header_lines = frame
        .headers
        .iter()
        .map(|(k, v)| format!("{}:{}", k, v))
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = String::with_capacity(
        frame.command.as_str().len() + header_lines.len() + frame.body.len() + 4,
    );
    out.push_str(frame.command.as_str());
    out.push('\n');
    out.push_str(&header_lines);
    out.push_str("\n\n");
    out.push_str(&frame.body);
    out.push('\0');
    out
}

/// Decode every frame contained in one inbound transport message.
///
/// Fragments are split on NUL; empty and whitespace-only fragments are
/// keep-alive padding and are dropped. Malformed fragments are logged and
/// skipped so the remaining frames of the payload are still delivered.
pub fn decode_payload(payload: &str) -> Vec<Frame> {
    let mut codec = StompCodec::new();
    let mut buf = BytesMut::from(payload.as_bytes());
    let mut frames = Vec::new();
    loop {
        match codec.decode_eof(&mut buf) {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => break,
            Err(e) => warn!(error = %e, "skipping malformed STOMP fragment"),
        }
    }
    frames
}

fn is_padding(fragment: &[u8]) -> bool {
    match std::str::from_utf8(fragment) {
        Ok(s) => s.trim().is_empty(),
        Err(_) => false,
    }
}

fn parse(fragment: &[u8]) -> Result<Frame, io::Error> {
    parse_fragment_bytes(fragment).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("parse error: {}", e))
    })
}

/// `StompCodec` implements `tokio_util::codec::{Decoder, Encoder}` for
/// NUL-terminated text frames.
///
/// The decoder consumes a fragment from the buffer before parsing it, so an
/// `Err` for one malformed fragment leaves the buffer positioned at the next
/// one. At end of input a trailing fragment without a terminator is still
/// parsed unless it is only whitespace.
pub struct StompCodec {}

impl StompCodec {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for StompCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for StompCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(nul) = src.iter().position(|&b| b == 0) else {
                return Ok(None);
            };
            let chunk = src.split_to(nul + 1);
            let fragment = &chunk[..nul];
            if is_padding(fragment) {
                continue;
            }
            return parse(fragment).map(Some);
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        let rest = buf.split();
        if is_padding(&rest) {
            return Ok(None);
        }
        parse(&rest).map(Some)
    }
}

impl Encoder<Frame> for StompCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let wire = encode_frame(&item);
        dst.reserve(wire.len());
        dst.put_slice(wire.as_bytes());
        Ok(())
    }
}
