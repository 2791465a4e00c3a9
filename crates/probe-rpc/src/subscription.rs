//! Typed event subscriptions.

use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::RpcError;

/// A stream of payloads for one subscribed event name.
///
/// Each subscription owns a private queue fed by the connection's reader
/// task; consuming an event here never removes it from other
/// subscriptions. The stream ends when the connection closes.
///
/// Payload-free events use `EventStream<()>`.
pub struct EventStream<T> {
    receiver: mpsc::UnboundedReceiver<Value>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> EventStream<T> {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<Value>) -> Self {
        Self {
            receiver,
            _payload: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned> Stream for EventStream<T> {
    type Item = Result<T, RpcError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut().receiver.poll_recv(cx) {
            Poll::Ready(Some(payload)) => Poll::Ready(Some(
                serde_json::from_value(payload)
                    .map_err(|err| RpcError::InvalidResult(err.to_string())),
            )),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
