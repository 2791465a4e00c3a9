//! Request/response correlation and event fan-out over one duplex channel.
//!
//! One dedicated reader task drains the inbound stream and fans each
//! message out: responses complete the pending invocation with the matching
//! id, events are cloned to every live subscriber of that event name. No
//! waiter ever touches the shared stream directly, so an invocation
//! suspended on its response never blocks other invocations or event
//! delivery.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{Result, RpcError};
use crate::message::{EventMessage, InboundMessage, Request, Response};
use crate::subscription::EventStream;

type PendingSlot = oneshot::Sender<Result<Value>>;

/// Correlation state shared between invocations and the reader task.
#[derive(Default)]
struct Shared {
    /// Pending waiters keyed by request id. Insert on send; single remove
    /// on matched response, closure, or cancellation.
    pending: Mutex<HashMap<u64, PendingSlot>>,
    /// Live event subscriptions, one multicast group per event name.
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>,
    /// Terminal error, set once when the reader loop exits.
    closed: Mutex<Option<RpcError>>,
}

impl Shared {
    /// Completes the pending invocation matching the response id.
    ///
    /// A response for an unknown id (an abandoned invocation; ids are
    /// never reused) is dropped without raising.
    fn complete(&self, response: Response) {
        let slot = self.pending.lock().expect("pending table poisoned").remove(&response.id);
        match slot {
            Some(slot) => {
                let outcome = match response.error {
                    Some(err) => Err(RpcError::Remote {
                        code: err.code,
                        message: err.message,
                    }),
                    None => Ok(response.result.unwrap_or(Value::Null)),
                };
                // The waiter may have been cancelled after the table lookup
                // raced; a dead slot is fine.
                let _ = slot.send(outcome);
            }
            None => debug!(id = response.id, "response for unknown or abandoned request"),
        }
    }

    /// Offers an event to every subscriber of its exact name.
    ///
    /// Delivery is a clone per subscriber; a dead subscriber is pruned and
    /// never blocks the others or the reader loop.
    fn publish(&self, event: EventMessage) {
        let mut subscribers = self.subscribers.lock().expect("subscriber table poisoned");
        if let Some(list) = subscribers.get_mut(&event.method) {
            let payload = event.params.unwrap_or(Value::Null);
            list.retain(|tx| tx.send(payload.clone()).is_ok());
            if list.is_empty() {
                subscribers.remove(&event.method);
            }
        }
    }

    /// Records the terminal error, fails every outstanding invocation
    /// individually, and ends all event streams.
    fn close(&self, reason: RpcError) {
        *self.closed.lock().expect("closed flag poisoned") = Some(reason.clone());

        let pending: Vec<_> = {
            let mut table = self.pending.lock().expect("pending table poisoned");
            table.drain().collect()
        };
        for (id, slot) in pending {
            debug!(id, "failing pending request on close");
            let _ = slot.send(Err(reason.clone()));
        }

        // Dropping the senders ends every subscriber stream.
        self.subscribers.lock().expect("subscriber table poisoned").clear();
    }

    fn closed_reason(&self) -> Option<RpcError> {
        self.closed.lock().expect("closed flag poisoned").clone()
    }
}

/// One protocol connection: id allocation, pending-request correlation,
/// and event fan-out.
///
/// The connection is transport-agnostic: it writes serialized request
/// frames to the outbound channel and expects the transport to feed inbound
/// frames into the receiver handed to [`Connection::new`]. Any number of
/// invocations may run concurrently from independent tasks.
pub struct Connection {
    outbound: mpsc::Sender<String>,
    next_id: AtomicU64,
    shared: Arc<Shared>,
    reader: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl Connection {
    /// Creates the connection and spawns its reader task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(outbound: mpsc::Sender<String>, inbound: mpsc::Receiver<String>) -> Arc<Self> {
        let shared = Arc::new(Shared::default());
        let reader = tokio::spawn(read_loop(inbound, Arc::clone(&shared)));
        Arc::new(Self {
            outbound,
            next_id: AtomicU64::new(0),
            shared,
            reader: Mutex::new(Some(reader)),
        })
    }

    /// Invokes a command and deserializes its result payload.
    pub async fn invoke<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let value = self.invoke_raw(method, params).await?;
        serde_json::from_value(value).map_err(|err| RpcError::InvalidResult(err.to_string()))
    }

    /// Invokes a command that declares no returns, discarding the payload.
    pub async fn invoke_unit<P: Serialize>(&self, method: &str, params: Option<P>) -> Result<()> {
        self.invoke_raw(method, params).await.map(|_| ())
    }

    /// Invokes a command, yielding the raw result payload.
    ///
    /// Allocates the next request id, writes the serialized frame, and
    /// suspends until the response with that exact id arrives. Dropping
    /// the returned future abandons the wait and removes the pending
    /// entry, so a late response is dropped instead of raising.
    pub async fn invoke_raw<P: Serialize>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<Value> {
        if self.shared.closed_reason().is_some() {
            return Err(RpcError::ChannelClosed);
        }

        let params = params
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| RpcError::InvalidParams(err.to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request {
            id,
            method: method.to_string(),
            params,
        };
        let frame = serde_json::to_string(&request)
            .map_err(|err| RpcError::InvalidParams(err.to_string()))?;

        let (slot, completion) = oneshot::channel();
        self.shared
            .pending
            .lock()
            .expect("pending table poisoned")
            .insert(id, slot);
        let _guard = PendingGuard {
            shared: Arc::clone(&self.shared),
            id,
        };

        // Re-check after the insert: a close racing in between has already
        // drained the table, and our slot would never be completed.
        if self.shared.closed_reason().is_some() {
            return Err(RpcError::ChannelClosed);
        }

        if self.outbound.send(frame).await.is_err() {
            return Err(RpcError::ChannelClosed);
        }

        match completion.await {
            Ok(outcome) => outcome,
            // Slot dropped without a send; the reader is gone.
            Err(_) => Err(RpcError::ChannelClosed),
        }
    }

    /// Subscribes to every event with the exact wire name `method`.
    ///
    /// Each subscription receives its own copy of every matching event;
    /// subscriptions never partition the stream.
    pub fn subscribe<T: DeserializeOwned>(&self, method: &str) -> EventStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.shared.closed_reason().is_none() {
            self.shared
                .subscribers
                .lock()
                .expect("subscriber table poisoned")
                .entry(method.to_string())
                .or_default()
                .push(tx);
        }
        // On a closed connection the sender drops here and the stream
        // ends immediately.
        EventStream::new(rx)
    }

    /// The terminal error observed by the reader loop, once the
    /// connection is dead.
    pub fn closed_reason(&self) -> Option<RpcError> {
        self.shared.closed_reason()
    }

    /// Awaits reader-task shutdown, yielding its terminal result.
    pub async fn join_reader(&self) -> Result<()> {
        let handle = self.reader.lock().expect("reader handle poisoned").take();
        match handle {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(err) => {
                    error!("reader task panicked: {err}");
                    Err(RpcError::ChannelClosed)
                }
            },
            None => Ok(()),
        }
    }
}

/// Removes the pending entry when an invocation is abandoned.
///
/// Ids are never reused, so removal is enough: a response arriving after
/// cancellation finds no slot and is dropped.
struct PendingGuard {
    shared: Arc<Shared>,
    id: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Ok(mut table) = self.shared.pending.lock() {
            table.remove(&self.id);
        }
    }
}

/// The single reader: drains the inbound channel and fans out.
async fn read_loop(mut inbound: mpsc::Receiver<String>, shared: Arc<Shared>) -> Result<()> {
    let result = loop {
        let Some(frame) = inbound.recv().await else {
            debug!("inbound channel closed");
            break Ok(());
        };
        match InboundMessage::parse(&frame) {
            Ok(InboundMessage::Response(response)) => shared.complete(response),
            Ok(InboundMessage::Event(event)) => shared.publish(event),
            Err(err) => {
                error!("fatal: {err}");
                break Err(err);
            }
        }
    };

    let reason = match &result {
        Ok(()) => RpcError::ChannelClosed,
        Err(err) => err.clone(),
    };
    shared.close(reason);
    if result.is_err() {
        warn!("connection dead after malformed inbound message");
    }
    result
}
