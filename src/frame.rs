use std::fmt;

use crate::headers::Headers;

/// STOMP command tokens understood by the client.
///
/// Anything else received from the server is kept verbatim in
/// `Command::Other` so it can be logged and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Connected,
    Subscribe,
    Send,
    Message,
    Disconnect,
    Error,
    Other(String),
}

impl Command {
    pub fn as_str(&self) -> &str {
        match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Subscribe => "SUBSCRIBE",
            Command::Send => "SEND",
            Command::Message => "MESSAGE",
            Command::Disconnect => "DISCONNECT",
            Command::Error => "ERROR",
            Command::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "CONNECT" => Command::Connect,
            "CONNECTED" => Command::Connected,
            "SUBSCRIBE" => Command::Subscribe,
            "SEND" => Command::Send,
            "MESSAGE" => Command::Message,
            "DISCONNECT" => Command::Disconnect,
            "ERROR" => Command::Error,
            other => Command::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single STOMP frame: command, ordered headers and a text body.
///
/// Frames are ephemeral: they are built right before encoding or produced
/// by the decoder for one inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Headers,
    /// Text body; empty when the frame carries none.
    pub body: String,
}

impl Frame {
    /// Create a frame with no headers and an empty body.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Headers::new(),
            body: String::new(),
        }
    }

    /// Add a header (builder style). A repeated key overwrites the earlier
    /// value.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set the frame body (builder style).
    pub fn set_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command: {}", self.command)?;
        write!(f, "{}", self.headers)?;
        writeln!(f, "Body ({} bytes)", self.body.len())
    }
}
