//! Transport seam between the STOMP client and the underlying socket.
//!
//! The client never touches a socket type directly. It asks a [`Connector`]
//! to open a [`Socket`], which is a sink of outbound text payloads paired
//! with a stream of inbound text payloads. [`WsConnector`] is the production
//! implementation over `tokio-tungstenite`; tests plug in an in-memory one.

use std::io;
use std::pin::Pin;

use futures::future::{self, BoxFuture};
use futures::{FutureExt, Sink, SinkExt, Stream, StreamExt, TryStreamExt};
use thiserror::Error;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, trace};

/// Errors raised by a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("transport closed")]
    Closed,
}

/// Outbound half of a socket: accepts encoded frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Inbound half of a socket: yields one item per transport message. A
/// message may carry several frames.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// An open duplex connection.
pub struct Socket {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens sockets for a `StompClient`.
///
/// `open` resolving to `Ok` is the socket-open event; an `Err` is a
/// transport error before anything was exchanged.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<Socket, TransportError>>;
}

/// WebSocket connector used by default.
///
/// Only text messages reach the codec; binary, ping and pong messages are
/// dropped (tungstenite answers pings itself).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<Socket, TransportError>> {
        let url = url.to_string();
        async move {
            let (ws, response) = tokio_tungstenite::connect_async(url.as_str()).await?;
            debug!(url = %url, status = %response.status(), "websocket handshake completed");

            let (sink, stream) = ws.split();
            let sink = sink
                .sink_map_err(TransportError::from)
                .with(|text: String| future::ready(Ok::<_, TransportError>(Message::Text(text.into()))));
            let stream = stream
                .map_err(TransportError::from)
                .try_filter_map(|message| {
                    future::ready(Ok(match message {
                        Message::Text(text) => Some(text.as_str().to_owned()),
                        other => {
                            trace!(kind = message_kind(&other), "ignoring non-text message");
                            None
                        }
                    }))
                });

            Ok(Socket {
                sink: Box::pin(sink),
                stream: Box::pin(stream),
            })
        }
        .boxed()
    }
}

fn message_kind(message: &Message) -> &'static str {
    match message {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
        Message::Frame(_) => "frame",
    }
}
