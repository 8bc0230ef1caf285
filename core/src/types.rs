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

//! Connection identity and lifecycle state shared across the queue, listener,
//! and link.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};

/// A process-wide monotonically-increasing connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u32);

impl ConnectionId {
    /// Wrap a raw id. Exposed for tests and for callers reconstructing an id
    /// from a persisted/logged value; normal construction goes through
    /// [`ConnectionIdAllocator`].
    pub fn from_raw(raw: u32) -> Self {
        ConnectionId(raw)
    }

    /// The raw numeric id.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Mints monotonically-increasing [`ConnectionId`]s. Owned by the `Link`, shared
/// with every `Listener` registered to it.
#[derive(Debug, Default)]
pub struct ConnectionIdAllocator {
    next: AtomicU32,
}

impl ConnectionIdAllocator {
    /// A fresh allocator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next id.
    pub fn next(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Summary information about a live connection, independent of its transport.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// The connection's id.
    pub id: ConnectionId,
    /// The peer's socket address.
    pub peer_addr: SocketAddr,
    /// Whether the connection has completed its handshake.
    pub active: bool,
}
