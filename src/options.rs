use std::fmt;
use std::time::Duration;

use crate::frame::{Command, Frame};

/// Heart-beat intervals advertised in the CONNECT frame, in milliseconds.
///
/// The client only advertises these values. It never emits heart-beat
/// pulses and never times out a silent server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    /// How often the client offers to send heart-beats.
    pub send_ms: u64,
    /// How often the client asks to receive heart-beats.
    pub receive_ms: u64,
}

impl Heartbeat {
    pub fn new(send_ms: u64, receive_ms: u64) -> Self {
        Self {
            send_ms,
            receive_ms,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    /// Same interval in both directions. Saturates at `u64::MAX` ms.
    pub fn from_duration(interval: Duration) -> Self {
        let ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        Self::new(ms, ms)
    }

    /// Parse a `heart-beat` header value (`"cx,cy"`).
    ///
    /// Missing or invalid fields default to `0`.
    pub fn parse(header: &str) -> Self {
        let mut parts = header.split(',');
        let cx = parts
            .next()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let cy = parts
            .next()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Self::new(cx, cy)
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new(10000, 10000)
    }
}

impl fmt::Display for Heartbeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.send_ms, self.receive_ms)
    }
}

/// Options used to build the CONNECT frame.
///
/// The defaults produce `accept-version:1.2` and `heart-beat:10000,10000`
/// and nothing else. `host` and extra `headers` are passed through opaquely;
/// an extra header with the same name as a built-in one replaces it.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub accept_version: String,
    pub heartbeat: Heartbeat,
    pub host: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            accept_version: "1.2".to_string(),
            heartbeat: Heartbeat::default(),
            host: None,
            headers: Vec::new(),
        }
    }
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_version(mut self, version: impl Into<String>) -> Self {
        self.accept_version = version.into();
        self
    }

    pub fn heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Add an opaque CONNECT header (e.g. a broker token).
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub(crate) fn connect_frame(&self) -> Frame {
        let mut frame = Frame::new(Command::Connect)
            .header("accept-version", self.accept_version.as_str())
            .header("heart-beat", self.heartbeat.to_string());
        if let Some(host) = &self.host {
            frame = frame.header("host", host.as_str());
        }
        for (k, v) in &self.headers {
            frame = frame.header(k.as_str(), v.as_str());
        }
        frame
    }
}
