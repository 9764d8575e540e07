//! Lightweight STOMP 1.2 client over a single WebSocket.
//!
//! `StompClient` multiplexes any number of destination subscriptions over
//! one socket. Subscriptions made before the handshake completes are queued
//! and flushed when CONNECTED arrives, and every registered destination is
//! re-subscribed after a reconnect.
//!
//! ```no_run
//! use live_stomp::{StompClient, resolve_ws_url};
//!
//! # async fn run() -> Result<(), live_stomp::ConnError> {
//! let client = StompClient::new(resolve_ws_url(Some("https://shop.example.com"), "/ws"));
//! client.subscribe("/topic/broadcast/42/chat", |body, _headers| {
//!     println!("chat: {}", body);
//! });
//! client.connect().await?;
//! client.send("/app/broadcast/42/chat", r#"{"text":"hi"}"#);
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod connection;
pub mod endpoint;
pub mod frame;
pub mod headers;
pub mod options;
pub mod parser;
pub mod registry;
pub mod subscription;
pub mod transport;

pub use codec::{StompCodec, decode_payload, encode_frame};
pub use connection::{ConnError, ConnectFuture, ConnectionState, StompClient};
pub use endpoint::{DEFAULT_WS_PATH, resolve_ws_url};
pub use frame::{Command, Frame};
pub use headers::Headers;
pub use options::{ConnectOptions, Heartbeat};
pub use registry::MessageHandler;
pub use subscription::{ReceivedMessage, Subscription};
pub use transport::{Connector, Socket, TransportError, WsConnector};
