//! Unit tests for the Frame, Command and Headers types.

use live_stomp::{Command, Frame, Headers};

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn frame_new_creates_empty() {
    let frame = Frame::new(Command::Send);
    assert_eq!(frame.command, Command::Send);
    assert!(frame.headers.is_empty());
    assert!(frame.body.is_empty());
}

#[test]
fn command_from_known_tokens() {
    assert_eq!(Command::from("CONNECTED"), Command::Connected);
    assert_eq!(Command::from("MESSAGE"), Command::Message);
    assert_eq!(Command::from("ERROR"), Command::Error);
}

#[test]
fn command_keeps_unknown_tokens() {
    let cmd = Command::from("RECEIPT");
    assert_eq!(cmd, Command::Other("RECEIPT".to_string()));
    assert_eq!(cmd.as_str(), "RECEIPT");
}

#[test]
fn command_tokens_are_case_sensitive() {
    assert_eq!(Command::from("message"), Command::Other("message".to_string()));
}

// =============================================================================
// Builder Pattern Tests
// =============================================================================

#[test]
fn frame_header_preserves_order() {
    let frame = Frame::new(Command::Send)
        .header("z-header", "z")
        .header("a-header", "a")
        .header("m-header", "m");
    let keys: Vec<&str> = frame.headers.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["z-header", "a-header", "m-header"]);
}

#[test]
fn frame_header_repeated_key_overwrites() {
    let frame = Frame::new(Command::Send)
        .header("destination", "/topic/a")
        .header("destination", "/topic/b");
    assert_eq!(frame.headers.len(), 1);
    assert_eq!(frame.get_header("destination"), Some("/topic/b"));
}

#[test]
fn frame_set_body() {
    let frame = Frame::new(Command::Send).set_body("{\"a\":1}");
    assert_eq!(frame.body, "{\"a\":1}");
}

#[test]
fn frame_get_header_missing() {
    let frame = Frame::new(Command::Send).header("destination", "/topic/a");
    assert_eq!(frame.get_header("content-type"), None);
    assert!(!frame.headers.contains_key("content-type"));
}

// =============================================================================
// Headers Tests
// =============================================================================

#[test]
fn headers_lookup_is_case_sensitive() {
    let mut headers = Headers::new();
    headers.insert("Destination", "/topic/a");
    assert_eq!(headers.get("destination"), None);
    assert_eq!(headers.get("Destination"), Some("/topic/a"));
}

#[test]
fn headers_extend_overwrites() {
    let mut headers: Headers = vec![("a", "1"), ("b", "2")].into_iter().collect();
    headers.extend(vec![("b", "3"), ("c", "4")]);
    let pairs: Vec<_> = headers.iter().collect();
    assert_eq!(pairs, vec![("a", "1"), ("b", "3"), ("c", "4")]);
}

// =============================================================================
// Display Tests
// =============================================================================

#[test]
fn frame_display_lists_headers_and_body_size() {
    let frame = Frame::new(Command::Message)
        .header("destination", "/topic/a")
        .set_body("hello");
    let shown = frame.to_string();
    assert_eq!(
        shown,
        "Command: MESSAGE\ndestination: /topic/a\nBody (5 bytes)\n"
    );
}
