//! In-memory transport used by the client tests.
//!
//! `MockConnector` opens sockets backed by unbounded channels and hands the
//! server side of each one to the test as a `MockServer`.

#![allow(dead_code)]

use futures::channel::mpsc as fmpsc;
use futures::future::{self, BoxFuture};
use futures::{FutureExt, SinkExt, StreamExt};
use live_stomp::{Connector, Frame, Socket, TransportError, decode_payload};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

pub const WAIT: Duration = Duration::from_secs(2);

pub const CONNECTED: &str = "CONNECTED\nversion:1.2\nheart-beat:0,0\n\n\0";

/// Server side of one mock socket.
pub struct MockServer {
    from_client: fmpsc::UnboundedReceiver<String>,
    to_client: Option<fmpsc::UnboundedSender<Result<String, TransportError>>>,
}

impl MockServer {
    /// Next frame written by the client.
    pub async fn next_frame(&mut self) -> Frame {
        let payload = timeout(WAIT, self.from_client.next())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client closed the socket");
        let mut frames = decode_payload(&payload);
        assert_eq!(frames.len(), 1, "one frame per write: {:?}", payload);
        frames.remove(0)
    }

    /// Resolves with `true` once the client side has closed its writer.
    pub async fn client_closed(&mut self) -> bool {
        matches!(timeout(WAIT, self.from_client.next()).await, Ok(None))
    }

    /// No frame pending right now.
    pub fn idle(&mut self) -> bool {
        !matches!(self.from_client.next().now_or_never(), Some(Some(_)))
    }

    /// Push a raw transport message to the client. Lost if the client has
    /// already dropped its end.
    pub fn push(&self, payload: &str) {
        if let Some(tx) = &self.to_client {
            let _ = tx.unbounded_send(Ok(payload.to_string()));
        }
    }

    pub fn accept(&self) {
        self.push(CONNECTED);
    }

    pub fn message(&self, destination: &str, body: &str) {
        self.push(&format!(
            "MESSAGE\ndestination:{}\nmessage-id:1\nsubscription:s\n\n{}\0",
            destination, body
        ));
    }

    /// Raise a transport error on the client stream.
    pub fn fail(&self) {
        if let Some(tx) = &self.to_client {
            let _ = tx.unbounded_send(Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "reset by peer",
            ))));
        }
    }

    /// Close the server end without an error.
    pub fn close(&mut self) {
        self.to_client = None;
    }
}

#[derive(Clone)]
pub struct MockConnector {
    opens: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
    servers: mpsc::UnboundedSender<MockServer>,
}

impl MockConnector {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Make subsequent opens fail with a transport error.
    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

impl Connector for MockConnector {
    fn open(&self, _url: &str) -> BoxFuture<'static, Result<Socket, TransportError>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return future::ready(Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))))
            .boxed();
        }

        let (client_tx, server_rx) = fmpsc::unbounded::<String>();
        let (server_tx, client_rx) = fmpsc::unbounded::<Result<String, TransportError>>();
        let _ = self.servers.send(MockServer {
            from_client: server_rx,
            to_client: Some(server_tx),
        });

        let socket = Socket {
            sink: Box::pin(client_tx.sink_map_err(|_| TransportError::Closed)),
            stream: Box::pin(client_rx),
        };
        future::ready(Ok(socket)).boxed()
    }
}

/// Connector plus the receiver of every server it opens.
pub fn mock() -> (MockConnector, mpsc::UnboundedReceiver<MockServer>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connector = MockConnector {
        opens: Arc::new(AtomicUsize::new(0)),
        refuse: Arc::new(AtomicBool::new(false)),
        servers: tx,
    };
    (connector, rx)
}

pub async fn next_server(servers: &mut mpsc::UnboundedReceiver<MockServer>) -> MockServer {
    timeout(WAIT, servers.recv())
        .await
        .expect("timed out waiting for the client to open a socket")
        .expect("connector dropped")
}

/// Poll `cond` until it holds or the wait budget runs out.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
