//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The Connection Queue: a thread-safe registry the I/O reactor and the game
//! thread both touch, but never the same way. The I/O thread is the sole
//! mutator of a connection's transport and protocol state; the game thread
//! is the sole reader of inbound events and sole writer of outbound events.

use crate::connection::Connection;
use crate::error::{GatewayError, Result};
use crate::types::{ConnectionId, ConnectionIdAllocator, ConnectionInfo};
use dashmap::DashMap;
use mudgate_telnet::{InboundEvent, OutboundEvent};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared, thread-safe registry of live connections.
#[derive(Clone, Default)]
pub struct ConnectionQueue {
    connections: Arc<DashMap<ConnectionId, Arc<Mutex<Connection>>>>,
    allocator: Arc<ConnectionIdAllocator>,
}

impl ConnectionQueue {
    /// An empty queue with its own id allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next connection id. Exposed so a `Listener` can allocate an
    /// id before it finishes constructing the `Connection` around an
    /// accepted socket.
    pub fn allocate_id(&self) -> ConnectionId {
        self.allocator.next()
    }

    /// Register a freshly constructed connection.
    pub fn insert(&self, connection: Connection) {
        let id = connection.id();
        self.connections.insert(id, Arc::new(Mutex::new(connection)));
    }

    /// Remove and drop a connection, if present.
    pub fn remove(&self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    /// A handle to the connection, for the I/O thread to drive reads/writes
    /// against, or `None` if it has already been torn down.
    pub fn get(&self, id: ConnectionId) -> Option<Arc<Mutex<Connection>>> {
        self.connections.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Summaries of every live connection.
    pub fn snapshot(&self) -> Vec<ConnectionInfo> {
        self.connections
            .iter()
            .map(|entry| {
                let conn = entry.value().try_lock();
                match conn {
                    Ok(conn) => ConnectionInfo {
                        id: conn.id(),
                        peer_addr: conn.peer_addr(),
                        active: conn.is_active(),
                    },
                    Err(_) => ConnectionInfo {
                        id: *entry.key(),
                        peer_addr: "0.0.0.0:0".parse().unwrap(),
                        active: false,
                    },
                }
            })
            .collect()
    }

    /// Queue an outbound event for a connection, from the game thread.
    pub async fn send(&self, id: ConnectionId, event: OutboundEvent) -> Result<()> {
        let conn = self.get(id).ok_or(GatewayError::UnknownConnection(id))?;
        conn.lock().await.enqueue_outbound(event);
        Ok(())
    }

    /// Drain every connection's inbound events, for the game thread to
    /// consume in one pass.
    pub async fn drain_inbound(&self) -> Vec<(ConnectionId, Vec<InboundEvent>)> {
        let ids: Vec<ConnectionId> = self.connections.iter().map(|e| *e.key()).collect();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(conn) = self.get(id) {
                let events = conn.lock().await.drain_inbound();
                if !events.is_empty() {
                    out.push((id, events));
                }
            }
        }
        out
    }

    /// Ask every connection with pending outbound work to write it to the
    /// wire, removing any that asked to disconnect. Called by the game
    /// thread once it has finished enqueueing this tick's responses.
    pub async fn process_out_events(&self) -> Vec<ConnectionId> {
        let ids: Vec<ConnectionId> = self.connections.iter().map(|e| *e.key()).collect();
        let mut disconnected = Vec::new();
        for id in ids {
            let Some(conn) = self.get(id) else { continue };
            let mut guard = conn.lock().await;
            if !guard.has_pending_outbound() {
                continue;
            }
            match guard.process_outbound().await {
                Ok(true) => disconnected.push(id),
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(connection = %id, %err, "outbound write failed, disconnecting");
                    disconnected.push(id);
                }
            }
        }
        for id in &disconnected {
            tracing::debug!(connection = %id, "connection removed from queue");
            crate::metrics::record_connection_disconnected();
            self.remove(*id);
        }
        disconnected
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_queue_is_empty() {
        let queue = ConnectionQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn allocated_ids_increase() {
        let queue = ConnectionQueue::new();
        let a = queue.allocate_id();
        let b = queue.allocate_id();
        assert!(a.raw() < b.raw());
    }

    #[tokio::test]
    async fn send_to_unknown_connection_is_an_error() {
        let queue = ConnectionQueue::new();
        let id = queue.allocate_id();
        let result = queue.send(id, OutboundEvent::StatusReq).await;
        assert!(result.is_err());
    }
}
