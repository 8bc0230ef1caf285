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

//! Builder-pattern configuration for listeners and the gateway as a whole.
//! Validation happens once, at registration time, rather than being
//! rediscovered by each accept loop.

use crate::error::GatewayError;
use std::net::SocketAddr;
use std::time::Duration;

/// Which wire protocol a listener terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// Raw telnet over TCP.
    Telnet,
    /// Telnet over TCP wrapped in TLS.
    TelnetTls,
    /// Telnet framed over a WebSocket connection.
    WebSocket,
    /// Telnet framed over a WebSocket connection wrapped in TLS.
    WebSocketTls,
}

impl ListenerKind {
    /// Whether this kind requires a TLS context to be registered.
    pub fn requires_tls(self) -> bool {
        matches!(self, ListenerKind::TelnetTls | ListenerKind::WebSocketTls)
    }
}

/// Configuration for a single listening socket.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    name: String,
    bind_addr: Option<SocketAddr>,
    address_name: Option<String>,
    tls_name: Option<String>,
    kind: ListenerKind,
    handshake_deadline: Duration,
    max_connections: usize,
    read_chunk_size: usize,
    idle_timeout: Option<Duration>,
}

impl ListenerConfig {
    /// Start building a listener configuration. `name` identifies this
    /// listener for later `stop_listening` calls and diagnostics.
    pub fn new(name: impl Into<String>, kind: ListenerKind) -> Self {
        ListenerConfig {
            name: name.into(),
            bind_addr: None,
            address_name: None,
            tls_name: None,
            kind,
            handshake_deadline: Duration::from_millis(500),
            max_connections: 1024,
            read_chunk_size: 1024,
            idle_timeout: None,
        }
    }

    /// Cap the number of simultaneously accepted connections for this
    /// listener. Default 1024.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Override the default 1 KiB read chunk size used for stream
    /// transports.
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Disconnect a connection that has sent nothing for this long. Disabled
    /// by default.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Bind directly to a socket address.
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    /// Bind to an address previously registered with the link under `name`.
    pub fn bind_named(mut self, name: impl Into<String>) -> Self {
        self.address_name = Some(name.into());
        self
    }

    /// Use the TLS context previously registered with the link under `name`.
    pub fn with_tls(mut self, name: impl Into<String>) -> Self {
        self.tls_name = Some(name.into());
        self
    }

    /// Override the default 500ms handshake deadline.
    pub fn handshake_deadline(mut self, deadline: Duration) -> Self {
        self.handshake_deadline = deadline;
        self
    }

    /// This listener's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The listener's protocol kind.
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// The configured handshake deadline.
    pub fn deadline(&self) -> Duration {
        self.handshake_deadline
    }

    /// The configured connection cap.
    pub fn connections(&self) -> usize {
        self.max_connections
    }

    /// The configured read chunk size.
    pub fn chunk_size(&self) -> usize {
        self.read_chunk_size
    }

    /// The configured idle timeout, if any.
    pub fn idle_timeout_duration(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// The directly bound address, if any.
    pub fn bind_addr(&self) -> Option<SocketAddr> {
        self.bind_addr
    }

    /// The named address this listener resolves against, if any.
    pub fn address_name(&self) -> Option<&str> {
        self.address_name.as_deref()
    }

    /// The named TLS context this listener resolves against, if any.
    pub fn tls_name(&self) -> Option<&str> {
        self.tls_name.as_deref()
    }

    /// Check internal consistency: exactly one address source, and a TLS
    /// context iff the kind requires one.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.name.is_empty() {
            return Err(GatewayError::Config("listener name must not be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(GatewayError::Config(format!(
                "listener '{}' has max_connections set to zero",
                self.name
            )));
        }
        if self.bind_addr.is_none() && self.address_name.is_none() {
            return Err(GatewayError::Config(format!(
                "listener '{}' has no bind address configured",
                self.name
            )));
        }
        if self.bind_addr.is_some() && self.address_name.is_some() {
            return Err(GatewayError::Config(format!(
                "listener '{}' configured with both a direct and a named address",
                self.name
            )));
        }
        if self.kind.requires_tls() && self.tls_name.is_none() {
            return Err(GatewayError::Config(format!(
                "listener '{}' requires a TLS context but none is registered",
                self.name
            )));
        }
        if !self.kind.requires_tls() && self.tls_name.is_some() {
            return Err(GatewayError::Config(format!(
                "listener '{}' has a TLS context registered but its kind does not use TLS",
                self.name
            )));
        }
        Ok(())
    }
}

/// Top-level configuration for the gateway process.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    listeners: Vec<ListenerConfig>,
}

impl GatewayConfig {
    /// An empty configuration with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener configuration. Does not validate; call
    /// [`GatewayConfig::validate`] once all listeners are added.
    pub fn add_listener(mut self, listener: ListenerConfig) -> Self {
        self.listeners.push(listener);
        self
    }

    /// The configured listeners.
    pub fn listeners(&self) -> &[ListenerConfig] {
        &self.listeners
    }

    /// Validate every listener and ensure listener names are unique.
    pub fn validate(&self) -> Result<(), GatewayError> {
        for listener in &self.listeners {
            listener.validate()?;
        }
        let mut names: Vec<&str> = self.listeners.iter().map(|l| l.name()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(GatewayError::Config("duplicate listener name".into()));
        }
        Ok(())
    }
}
