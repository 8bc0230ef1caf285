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

//! Connection-level plumbing for a MUD gateway: the transport adapter, the
//! connection queue the game thread drives, configuration, errors, and
//! metrics. Protocol decoding itself lives in `mudgate-telnet`; this crate
//! wires that engine to real sockets and exposes the thread-safe surface a
//! host game interacts with.
//!
//! Layering: `Listener` (in `mudgate-gateway`) accepts sockets and hands them
//! to [`ConnectionQueue`], which owns [`Connection`]s. Each `Connection`
//! pairs a [`Transport`] with a `mudgate_telnet::TelnetEngine`.

#![warn(missing_docs, future_incompatible, rust_2018_idioms)]

pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod types;

pub use config::{GatewayConfig, ListenerConfig, ListenerKind};
pub use connection::{Connection, ReadOutcome, Transport};
pub use error::{GatewayError, Result};
pub use queue::ConnectionQueue;
pub use types::{ConnectionId, ConnectionIdAllocator, ConnectionInfo};
