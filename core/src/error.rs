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

//! The gateway's unified error taxonomy. Every fallible operation in this
//! crate and in `mudgate-gateway` returns [`Result`], so callers match on
//! [`GatewayError`]'s variants instead of downcasting.

use crate::types::ConnectionId;
use std::io;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Everything that can go wrong running the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Registration-time configuration mistake: duplicate name, unknown
    /// address, or unknown TLS context. Surfaced synchronously; never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// A socket read/write, TLS handshake, or WebSocket upgrade failed.
    /// Logged, then converted into a `Disconnect` event for the affected
    /// connection; never aborts the process.
    #[error("transport error on {id}: {source}")]
    Transport {
        /// The connection the failure occurred on.
        id: ConnectionId,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Malformed sub-negotiation contents or an unsupported option
    /// negotiation. Recovered locally: the connection continues.
    #[error("protocol error on {id}: {reason}")]
    Protocol {
        /// The connection the error occurred on.
        id: ConnectionId,
        /// A short description of what was malformed or unsupported.
        reason: String,
    },

    /// The requested connection id is not present in the queue.
    #[error("no such connection: {0}")]
    UnknownConnection(ConnectionId),
}

impl GatewayError {
    /// True for errors that are local to one connection and do not need the
    /// caller to do anything beyond logging — the connection already knows
    /// how to recover or has already been scheduled for teardown.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GatewayError::Protocol { .. })
    }

    /// True for errors that terminate a single connection rather than the
    /// whole listener/link.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, GatewayError::Transport { .. } | GatewayError::Protocol { .. } | GatewayError::UnknownConnection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_are_recoverable() {
        let err = GatewayError::Protocol { id: ConnectionId::from_raw(1), reason: "bad naws".into() };
        assert!(err.is_recoverable());
        assert!(err.is_connection_error());
    }

    #[test]
    fn config_errors_are_not_connection_errors() {
        let err = GatewayError::Config("duplicate listener name".into());
        assert!(!err.is_connection_error());
        assert!(!err.is_recoverable());
    }
}
