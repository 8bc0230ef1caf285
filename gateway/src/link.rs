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

//! The process-global registry a host game builds once: named bound
//! addresses, named TLS contexts, and named listeners. Registration is
//! configuration-time only; everything fails fast with a configuration error
//! rather than silently overwriting a prior entry.

use crate::listener::Listener;
use mudgate_core::{ConnectionQueue, GatewayError, ListenerConfig, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_rustls::TlsAcceptor;
use tracing::info;

/// Process-global registry of addresses, TLS contexts, and listeners.
pub struct Link {
    addresses: HashMap<String, SocketAddr>,
    tls_contexts: HashMap<String, TlsAcceptor>,
    listener_configs: HashMap<String, ListenerConfig>,
    running: HashMap<String, Arc<Mutex<Listener>>>,
    queue: ConnectionQueue,
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

impl Link {
    /// An empty link backed by a fresh connection queue.
    pub fn new() -> Self {
        Link {
            addresses: HashMap::new(),
            tls_contexts: HashMap::new(),
            listener_configs: HashMap::new(),
            running: HashMap::new(),
            queue: ConnectionQueue::new(),
        }
    }

    /// The connection queue every listener registered to this link feeds.
    pub fn queue(&self) -> &ConnectionQueue {
        &self.queue
    }

    /// Register a named bound address for listeners to reference.
    pub fn register_address(&mut self, name: impl Into<String>, addr: SocketAddr) -> Result<()> {
        let name = name.into();
        if self.addresses.contains_key(&name) {
            return Err(GatewayError::Config(format!("address '{name}' already registered")));
        }
        self.addresses.insert(name, addr);
        Ok(())
    }

    /// Register a named TLS server context for listeners to reference.
    pub fn register_ssl(&mut self, name: impl Into<String>, acceptor: TlsAcceptor) -> Result<()> {
        let name = name.into();
        if self.tls_contexts.contains_key(&name) {
            return Err(GatewayError::Config(format!("TLS context '{name}' already registered")));
        }
        self.tls_contexts.insert(name, acceptor);
        Ok(())
    }

    /// Register a listener configuration. Validated immediately; resolution
    /// of its named address/TLS context happens at
    /// [`Link::start_listening`].
    pub fn register_listener(&mut self, config: ListenerConfig) -> Result<()> {
        config.validate()?;
        let name = config.name().to_string();
        if self.listener_configs.contains_key(&name) {
            return Err(GatewayError::Config(format!("listener '{name}' already registered")));
        }
        self.listener_configs.insert(name, config);
        Ok(())
    }

    fn resolve_addr(&self, config: &ListenerConfig) -> Result<SocketAddr> {
        if let Some(addr) = config.bind_addr() {
            return Ok(addr);
        }
        let name = config.address_name().expect("validated: one of bind_addr/address_name is set");
        self.addresses
            .get(name)
            .copied()
            .ok_or_else(|| GatewayError::Config(format!("listener '{}' references unknown address '{name}'", config.name())))
    }

    fn resolve_tls(&self, config: &ListenerConfig) -> Result<Option<TlsAcceptor>> {
        match config.tls_name() {
            None => Ok(None),
            Some(name) => self
                .tls_contexts
                .get(name)
                .cloned()
                .map(Some)
                .ok_or_else(|| GatewayError::Config(format!("listener '{}' references unknown TLS context '{name}'", config.name()))),
        }
    }

    /// Bind and spawn every registered listener. A listener already started
    /// is left running; listeners are additive across repeated calls.
    pub async fn start_listening(&mut self) -> Result<()> {
        let names: Vec<String> = self.listener_configs.keys().cloned().collect();
        for name in names {
            if self.running.contains_key(&name) {
                continue;
            }
            let config = self.listener_configs.get(&name).expect("just listed").clone();
            let addr = self.resolve_addr(&config)?;
            let tls = self.resolve_tls(&config)?;
            let listener = Listener::bind(&config, addr, tls, self.queue.clone()).await?;
            let handle = Arc::new(Mutex::new(listener));
            let spawned = Arc::clone(&handle);
            tokio::spawn(async move {
                spawned.lock().await.run().await;
            });
            info!(listener = %name, %addr, "listening");
            self.running.insert(name, handle);
        }
        Ok(())
    }

    /// Stop one listener by name. Unaffected by in-flight connections, which
    /// run to their natural disconnect.
    pub async fn stop_listening(&mut self, name: &str) -> Result<()> {
        let handle = self.running.remove(name).ok_or_else(|| GatewayError::Config(format!("listener '{name}' is not running")))?;
        handle.lock().await.stop();
        Ok(())
    }

    /// Stop every running listener.
    pub async fn stop_all(&mut self) {
        let names: Vec<String> = self.running.keys().cloned().collect();
        for name in names {
            let _ = self.stop_listening(&name).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mudgate_core::ListenerKind;

    #[test]
    fn duplicate_address_registration_fails() {
        let mut link = Link::new();
        link.register_address("main", "127.0.0.1:4000".parse().unwrap()).unwrap();
        let err = link.register_address("main", "127.0.0.1:4001".parse().unwrap());
        assert!(err.is_err());
    }

    #[test]
    fn duplicate_listener_registration_fails() {
        let mut link = Link::new();
        let config = ListenerConfig::new("mud", ListenerKind::Telnet).bind("127.0.0.1:4000".parse().unwrap());
        link.register_listener(config.clone()).unwrap();
        assert!(link.register_listener(config).is_err());
    }

    #[tokio::test]
    async fn stop_listening_on_unknown_name_fails() {
        let mut link = Link::new();
        assert!(link.stop_listening("nope").await.is_err());
    }
}
