use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::headers::Headers;
use crate::registry::MessageHandler;

/// A MESSAGE frame delivered to a stream subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub destination: String,
    pub body: String,
    pub headers: Headers,
}

/// Channel-backed subscription returned by `StompClient::subscribe_stream`.
///
/// `Subscription` implements `futures::Stream<Item = ReceivedMessage>`. The
/// stream ends when the client drops the underlying handler, which happens
/// on `disconnect()`. Dropping the `Subscription` only stops delivery; the
/// handler stays registered until the next disconnect.
pub struct Subscription {
    destination: String,
    receiver: mpsc::UnboundedReceiver<ReceivedMessage>,
}

impl Subscription {
    pub(crate) fn channel(destination: String) -> (Self, MessageHandler) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dest = destination.clone();
        let handler = MessageHandler::new(move |body, headers| {
            // receiver gone: nothing left to deliver to
            let _ = tx.send(ReceivedMessage {
                destination: dest.clone(),
                body: body.to_string(),
                headers: headers.clone(),
            });
        });
        (
            Self {
                destination,
                receiver: rx,
            },
            handler,
        )
    }

    /// Returns the destination this subscription listens to.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Consume the `Subscription` and return the underlying receiver.
    pub fn into_receiver(self) -> mpsc::UnboundedReceiver<ReceivedMessage> {
        self.receiver
    }
}

impl Stream for Subscription {
    type Item = ReceivedMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
