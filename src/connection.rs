use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::{self, BoxFuture, Shared};
use futures::{FutureExt, SinkExt, StreamExt};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::codec::{decode_payload, encode_frame};
use crate::frame::{Command, Frame};
use crate::headers::Headers;
use crate::options::{ConnectOptions, Heartbeat};
use crate::registry::{MessageHandler, Registry};
use crate::subscription::Subscription;
use crate::transport::{Connector, Socket, TransportError, WsConnector};

/// Errors that settle a `connect()` attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnError {
    /// The socket failed before the STOMP handshake completed.
    #[error("transport open failed: {0}")]
    TransportOpen(String),
    /// The socket closed before a CONNECTED frame arrived.
    #[error("transport closed before CONNECTED was received")]
    ClosedBeforeConnected,
}

/// Lifecycle of a `StompClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket; never connected or fully disconnected.
    Idle,
    /// Socket opening or CONNECT sent, CONNECTED not yet received.
    Connecting,
    /// CONNECTED received; SEND and SUBSCRIBE frames may be emitted.
    Connected,
    /// The transport failed or closed. `connect()` starts over.
    Closed,
}

/// Memoized outcome of a connect attempt. Every clone settles the same way.
pub type ConnectFuture = Shared<BoxFuture<'static, Result<(), ConnError>>>;

/// A subscribe request made before the connection was established.
struct PendingSubscription {
    destination: String,
    handler: MessageHandler,
}

/// The client's view of its current socket.
struct SocketHandle {
    /// Generation id; events from older sockets are ignored.
    id: u64,
    /// Set once the transport reports open.
    open: bool,
    outbound: mpsc::UnboundedSender<String>,
    /// Dropping this aborts a socket that is still opening.
    _shutdown: oneshot::Sender<()>,
}

impl SocketHandle {
    /// Queue a frame for the writer. Silently dropped unless the socket is
    /// open.
    fn write(&self, frame: &Frame) -> bool {
        if !self.open {
            return false;
        }
        trace!(socket = self.id, command = %frame.command, "queueing frame");
        self.outbound.send(encode_frame(frame)).is_ok()
    }
}

struct Inner {
    state: ConnectionState,
    attempt: Option<ConnectFuture>,
    resolver: Option<oneshot::Sender<Result<(), ConnError>>>,
    socket: Option<SocketHandle>,
    registry: Registry,
    pending: Vec<PendingSubscription>,
    next_socket_id: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            attempt: None,
            resolver: None,
            socket: None,
            registry: Registry::default(),
            pending: Vec::new(),
            next_socket_id: 0,
        }
    }
}

/// STOMP client multiplexing subscriptions over one persistent socket.
///
/// All operations except `connect` are synchronous. The socket is driven by
/// a background Tokio task per connect attempt; that task feeds transport
/// events (open, message, error, close) back into the client under a short
/// lock. Subscriber callbacks run on that task, outside the lock, so they
/// may call back into the client.
///
/// Cloning a `StompClient` yields another handle to the same session.
#[derive(Clone)]
pub struct StompClient {
    url: String,
    options: ConnectOptions,
    connector: Arc<dyn Connector>,
    inner: Arc<Mutex<Inner>>,
}

impl StompClient {
    /// Client for `url` using the WebSocket transport and default options.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_options(url, ConnectOptions::default())
    }

    pub fn with_options(url: impl Into<String>, options: ConnectOptions) -> Self {
        Self::with_connector(url, options, WsConnector)
    }

    /// Client with a custom transport.
    pub fn with_connector(
        url: impl Into<String>,
        options: ConnectOptions,
        connector: impl Connector,
    ) -> Self {
        Self {
            url: url.into(),
            options,
            connector: Arc::new(connector),
            inner: Arc::new(Mutex::new(Inner::new())),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.state() == ConnectionState::Connecting
    }

    /// Open the transport and perform the STOMP handshake.
    ///
    /// Idempotent: when already connected the returned future is ready, and
    /// while an attempt is in flight every caller gets a clone of the same
    /// future instead of a second socket. The future resolves once CONNECTED
    /// has been received and pending subscriptions have been flushed, or
    /// fails with a `ConnError` if the transport errors or closes first.
    ///
    /// There is no timeout. If `disconnect()` is called while the attempt is
    /// in flight, the returned future never settles.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) -> ConnectFuture {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Connected {
            return future::ready(Ok(())).boxed().shared();
        }
        if let Some(attempt) = &inner.attempt {
            return attempt.clone();
        }

        let (resolver, outcome) = oneshot::channel::<Result<(), ConnError>>();
        let attempt = outcome
            .then(|settled| match settled {
                Ok(result) => future::ready(result).left_future(),
                // abandoned by disconnect()
                Err(_) => future::pending().right_future(),
            })
            .boxed()
            .shared();

        inner.next_socket_id += 1;
        let id = inner.next_socket_id;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        inner.socket = Some(SocketHandle {
            id,
            open: false,
            outbound: outbound_tx,
            _shutdown: shutdown_tx,
        });
        inner.state = ConnectionState::Connecting;
        inner.attempt = Some(attempt.clone());
        inner.resolver = Some(resolver);
        drop(inner);

        debug!(url = %self.url, socket = id, "opening transport");
        let events = SocketEvents {
            inner: Arc::downgrade(&self.inner),
            id,
        };
        tokio::spawn(run_socket(
            self.connector.clone(),
            self.url.clone(),
            encode_frame(&self.options.connect_frame()),
            events,
            outbound_rx,
            shutdown_rx,
        ));

        attempt
    }

    /// Register `on_message` for `destination`.
    ///
    /// When connected, a SUBSCRIBE frame is sent right away, even if the
    /// destination already has subscribers. Otherwise the request is queued
    /// and flushed when CONNECTED arrives.
    pub fn subscribe<F>(&self, destination: impl Into<String>, on_message: F)
    where
        F: Fn(&str, &Headers) + Send + Sync + 'static,
    {
        self.subscribe_handler(destination, MessageHandler::new(on_message));
    }

    /// Like `subscribe`, with a handler whose identity the caller controls.
    /// Registering the same handler twice for one destination delivers once.
    pub fn subscribe_handler(&self, destination: impl Into<String>, handler: MessageHandler) {
        let destination = destination.into();
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Connected {
            if let Some(socket) = &inner.socket {
                socket.write(&subscribe_frame(&destination));
            }
            inner.registry.insert(destination, handler);
            return;
        }
        trace!(destination = %destination, "queueing subscription until connected");
        inner.pending.push(PendingSubscription {
            destination,
            handler,
        });
    }

    /// Subscribe and receive messages as a `Stream` instead of a callback.
    pub fn subscribe_stream(&self, destination: impl Into<String>) -> Subscription {
        let (subscription, handler) = Subscription::channel(destination.into());
        self.subscribe_handler(subscription.destination().to_string(), handler);
        subscription
    }

    /// Send a JSON body to `destination`.
    ///
    /// A no-op unless the socket is open; there is no outbox.
    pub fn send(&self, destination: &str, body: &str) {
        let inner = self.inner.lock();
        match &inner.socket {
            Some(socket) if socket.open => {
                socket.write(&send_frame(destination, body));
            }
            _ => trace!(destination, "socket not open, dropping SEND"),
        }
    }

    /// Tear the session down.
    ///
    /// Sends DISCONNECT if the socket is open, closes the socket (or aborts
    /// it while it is still opening) and forgets every subscription, pending
    /// request and in-flight connect attempt. Safe to call repeatedly.
    pub fn disconnect(&self) {
        let mut inner = self.inner.lock();
        if let Some(socket) = inner.socket.take() {
            debug!(socket = socket.id, "disconnecting");
            socket.write(&Frame::new(Command::Disconnect));
            // dropping the handle closes the writer after the DISCONNECT
            drop(socket);
        }
        inner.state = ConnectionState::Idle;
        inner.attempt = None;
        inner.resolver = None;
        inner.registry.clear();
        inner.pending.clear();
    }
}

/// Transport event handlers bound to one socket generation.
struct SocketEvents {
    inner: Weak<Mutex<Inner>>,
    id: u64,
}

impl SocketEvents {
    /// Run `f` only if this socket is still the client's current one.
    fn with_current<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> Option<R> {
        let inner = self.inner.upgrade()?;
        let mut guard = inner.lock();
        if guard.socket.as_ref().map(|s| s.id) != Some(self.id) {
            return None;
        }
        Some(f(&mut *guard))
    }

    fn on_open(&self) -> bool {
        self.with_current(|inner| {
            if let Some(socket) = inner.socket.as_mut() {
                socket.open = true;
            }
        })
        .is_some()
    }

    fn on_message(&self, payload: &str) {
        for frame in decode_payload(payload) {
            match &frame.command {
                Command::Connected => self.on_connected(&frame),
                Command::Message => self.dispatch(&frame),
                Command::Error => warn!(
                    socket = self.id,
                    message = frame.get_header("message").unwrap_or(""),
                    "server sent ERROR frame"
                ),
                other => trace!(socket = self.id, command = %other, "ignoring frame"),
            }
        }
    }

    fn on_connected(&self, frame: &Frame) {
        let server_heartbeat = frame
            .get_header("heart-beat")
            .map(Heartbeat::parse)
            .unwrap_or_else(Heartbeat::disabled);
        debug!(
            socket = self.id,
            version = frame.get_header("version").unwrap_or("?"),
            heartbeat = %server_heartbeat,
            "STOMP session established"
        );

        self.with_current(|inner| {
            inner.state = ConnectionState::Connected;

            let mut seen: HashSet<String> = HashSet::new();
            let mut destinations: Vec<String> = Vec::new();
            for dest in inner.registry.destinations() {
                if seen.insert(dest.to_string()) {
                    destinations.push(dest.to_string());
                }
            }
            for pending in std::mem::take(&mut inner.pending) {
                if seen.insert(pending.destination.clone()) {
                    destinations.push(pending.destination.clone());
                }
                inner.registry.insert(pending.destination, pending.handler);
            }

            if let Some(socket) = &inner.socket {
                for dest in &destinations {
                    socket.write(&subscribe_frame(dest));
                }
            }
            if let Some(resolver) = inner.resolver.take() {
                let _ = resolver.send(Ok(()));
            }
        });
    }

    fn dispatch(&self, frame: &Frame) {
        let Some(destination) = frame.get_header("destination") else {
            trace!(socket = self.id, "MESSAGE without destination");
            return;
        };
        let Some(handlers) = self.with_current(|inner| inner.registry.handlers(destination)) else {
            return;
        };
        if handlers.is_empty() {
            trace!(destination, "no subscribers, dropping MESSAGE");
            return;
        }
        for (i, handler) in handlers.iter().enumerate() {
            // a callback may have torn the session down
            if i > 0 && self.with_current(|_| ()).is_none() {
                trace!(destination, "session ended during dispatch");
                return;
            }
            if !handler.invoke(&frame.body, &frame.headers) {
                warn!(destination, "subscriber callback panicked");
            }
        }
    }

    fn on_error(&self, error: &TransportError) {
        debug!(socket = self.id, error = %error, "transport error");
        self.settle(ConnError::TransportOpen(error.to_string()));
    }

    fn on_close(&self) {
        debug!(socket = self.id, "transport closed");
        self.settle(ConnError::ClosedBeforeConnected);
    }

    /// Move to `Closed` and reject the pending attempt, if still unsettled.
    fn settle(&self, error: ConnError) {
        self.with_current(|inner| {
            inner.state = ConnectionState::Closed;
            inner.attempt = None;
            inner.socket = None;
            if let Some(resolver) = inner.resolver.take() {
                let _ = resolver.send(Err(error));
            }
        });
    }
}

/// Drive one socket from open to close.
async fn run_socket(
    connector: Arc<dyn Connector>,
    url: String,
    connect_frame: String,
    events: SocketEvents,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let opened = tokio::select! {
        _ = &mut shutdown => {
            debug!(socket = events.id, "connect abandoned while opening");
            return;
        }
        result = connector.open(&url) => result,
    };

    let Socket {
        mut sink,
        mut stream,
    } = match opened {
        Ok(socket) => socket,
        Err(e) => {
            events.on_error(&e);
            return;
        }
    };

    if !events.on_open() {
        let _ = sink.close().await;
        return;
    }
    if let Err(e) = sink.send(connect_frame).await {
        events.on_error(&e);
        return;
    }

    loop {
        tokio::select! {
            biased;
            out = outbound.recv() => match out {
                Some(text) => {
                    if let Err(e) = sink.send(text).await {
                        events.on_error(&e);
                        return;
                    }
                }
                None => {
                    // client dropped the handle: everything queued is flushed
                    let _ = sink.close().await;
                    return;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(payload)) => events.on_message(&payload),
                Some(Err(e)) => {
                    events.on_error(&e);
                    return;
                }
                None => {
                    events.on_close();
                    return;
                }
            },
        }
    }
}

fn subscribe_frame(destination: &str) -> Frame {
    Frame::new(Command::Subscribe)
        .header("id", subscription_id())
        .header("destination", destination)
}

fn send_frame(destination: &str, body: &str) -> Frame {
    Frame::new(Command::Send)
        .header("destination", destination)
        .header("content-type", "application/json")
        .set_body(body)
}

/// `sub-<unix millis>-<random>`
fn subscription_id() -> String {
    format!("sub-{}-{}", current_millis(), rand::random::<u32>())
}

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
