//! Wire encoding and payload decoding.

use bytes::BytesMut;
use live_stomp::parser::{ParseError, parse_fragment};
use live_stomp::{Command, Frame, StompCodec, decode_payload, encode_frame};
use tokio_util::codec::{Decoder, Encoder};

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn encode_send_is_exact() {
    let frame = Frame::new(Command::Send)
        .header("destination", "/app/broadcast/1/chat")
        .header("content-type", "application/json")
        .set_body("{\"text\":\"hi\"}");
    assert_eq!(
        encode_frame(&frame),
        "SEND\ndestination:/app/broadcast/1/chat\ncontent-type:application/json\n\n{\"text\":\"hi\"}\0"
    );
}

#[test]
fn encode_subscribe_has_empty_body() {
    let frame = Frame::new(Command::Subscribe)
        .header("id", "sub-1-2")
        .header("destination", "/topic/a");
    assert_eq!(
        encode_frame(&frame),
        "SUBSCRIBE\nid:sub-1-2\ndestination:/topic/a\n\n\0"
    );
}

#[test]
fn encode_without_headers() {
    assert_eq!(
        encode_frame(&Frame::new(Command::Disconnect)),
        "DISCONNECT\n\n\n\0"
    );
}

#[test]
fn encode_does_not_escape_or_add_headers() {
    let frame = Frame::new(Command::Send)
        .header("destination", "/topic/a:b")
        .set_body("line1\nline2");
    let wire = encode_frame(&frame);
    assert!(wire.contains("destination:/topic/a:b\n"));
    assert!(!wire.contains("content-length"));
    assert!(wire.ends_with("line1\nline2\0"));
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn decode_single_message() {
    let frames = decode_payload("MESSAGE\ndestination:/topic/a\nmessage-id:7\n\n{\"n\":1}\0");
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.command, Command::Message);
    assert_eq!(frame.get_header("destination"), Some("/topic/a"));
    assert_eq!(frame.get_header("message-id"), Some("7"));
    assert_eq!(frame.body, "{\"n\":1}");
}

#[test]
fn decode_two_frames_in_one_payload() {
    let frames = decode_payload(
        "CONNECTED\nversion:1.2\n\n\0MESSAGE\ndestination:/topic/a\n\nbody\0",
    );
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].command, Command::Connected);
    assert_eq!(frames[1].command, Command::Message);
    assert_eq!(frames[1].body, "body");
}

#[test]
fn decode_ignores_padding_between_frames() {
    let frames = decode_payload("\n\nMESSAGE\ndestination:/a\n\nx\0\n \n\0   ");
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].body, "x");
}

#[test]
fn decode_heartbeat_only_payload() {
    assert!(decode_payload("\n").is_empty());
    assert!(decode_payload("").is_empty());
}

#[test]
fn decode_crlf_line_endings() {
    let frames = decode_payload("MESSAGE\r\ndestination:/topic/a\r\n\r\nline1\r\nline2\0");
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].get_header("destination"), Some("/topic/a"));
    assert_eq!(frames[0].body, "line1\nline2");
}

#[test]
fn decode_without_blank_separator_has_empty_body() {
    let frames = decode_payload("MESSAGE\ndestination:/topic/a\0");
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].get_header("destination"), Some("/topic/a"));
    assert_eq!(frames[0].body, "");
}

#[test]
fn decode_unterminated_trailing_fragment() {
    let frames = decode_payload("MESSAGE\ndestination:/topic/a\n\npartial");
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].body, "partial");
}

#[test]
fn decode_repeated_header_last_wins() {
    let frames = decode_payload("MESSAGE\ndestination:/a\ndestination:/b\n\n\0");
    assert_eq!(frames[0].headers.len(), 1);
    assert_eq!(frames[0].get_header("destination"), Some("/b"));
}

#[test]
fn decode_header_value_trailing_space_is_kept() {
    let frames = decode_payload("MESSAGE\nkey: value \n\n\0");
    assert_eq!(frames[0].get_header("key"), Some(" value "));
}

#[test]
fn parse_empty_fragment_is_missing_command() {
    assert_eq!(parse_fragment("\r\n\r\n"), Err(ParseError::MissingCommand));
}

// =============================================================================
// tokio-util codec
// =============================================================================

#[test]
fn decoder_waits_for_terminator() {
    let mut codec = StompCodec::new();
    let mut buf = BytesMut::from(&b"MESSAGE\ndestination:/a\n\nhel"[..]);
    assert!(codec.decode(&mut buf).unwrap().is_none());

    buf.extend_from_slice(b"lo\0");
    let frame = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(frame.body, "hello");
    assert!(buf.is_empty());
}

#[test]
fn decoder_skips_malformed_fragment_and_continues() {
    let mut codec = StompCodec::new();
    let mut buf = BytesMut::new();
    buf.extend_from_slice(b"MESS\xffAGE\n\n\0");
    buf.extend_from_slice(b"MESSAGE\ndestination:/a\n\nok\0");

    assert!(codec.decode(&mut buf).is_err());
    let frame = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(frame.body, "ok");
    assert!(codec.decode(&mut buf).unwrap().is_none());
}

#[test]
fn encoder_writes_wire_text() {
    let mut codec = StompCodec::new();
    let mut dst = BytesMut::new();
    let frame = Frame::new(Command::Send)
        .header("destination", "/a")
        .set_body("x");
    codec.encode(frame.clone(), &mut dst).unwrap();
    assert_eq!(&dst[..], encode_frame(&frame).as_bytes());

    let decoded = codec.decode(&mut dst).unwrap().unwrap();
    assert_eq!(decoded, frame);
}
