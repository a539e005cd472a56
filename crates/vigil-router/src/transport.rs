//! Push-capable transport seam
//!
//! The router is generic over `PushTransport`; production wires a real
//! socket layer behind it, tests and single-process deployments use
//! `ChannelTransport`, which gives FIFO delivery per connection.

use std::collections::HashMap;
use std::future::Future;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use vigil_core::{ConnectionId, VigilError, VigilResult};

/// One-way push channel to a connected client
pub trait PushTransport: Send + Sync + 'static {
    /// Deliver a payload to one connection. An error is a per-connection
    /// failure; it never concerns other connections.
    fn send(
        &self,
        connection: ConnectionId,
        payload: Bytes,
    ) -> impl Future<Output = VigilResult<()>> + Send;
}

/// In-process transport over per-connection mpsc channels
pub struct ChannelTransport {
    channels: RwLock<HashMap<ConnectionId, mpsc::Sender<Bytes>>>,
    capacity: usize,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> Self {
        ChannelTransport {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Open a channel for a connection, replacing any previous one.
    /// The receiver half belongs to the connection handler.
    pub fn open(&self, connection: ConnectionId) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.channels.write().insert(connection, tx);
        rx
    }

    /// Drop the channel; later sends fail as ordinary delivery failures
    pub fn close(&self, connection: ConnectionId) {
        self.channels.write().remove(&connection);
    }

    pub fn is_open(&self, connection: ConnectionId) -> bool {
        self.channels.read().contains_key(&connection)
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new(64)
    }
}

impl PushTransport for ChannelTransport {
    fn send(
        &self,
        connection: ConnectionId,
        payload: Bytes,
    ) -> impl Future<Output = VigilResult<()>> + Send {
        // Clone the sender before the await so no lock is held across it
        let sender = self.channels.read().get(&connection).cloned();
        async move {
            match sender {
                Some(tx) => tx
                    .send(payload)
                    .await
                    .map_err(|_| VigilError::DeliveryFailed(connection)),
                None => Err(VigilError::DeliveryFailed(connection)),
            }
        }
    }
}
