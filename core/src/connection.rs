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

//! A single client connection: a transport, the telnet engine that decodes
//! and encodes it, and the inbound/outbound event deques the game thread and
//! the I/O thread hand events through.

use crate::error::{GatewayError, Result};
use crate::types::ConnectionId;
use futures_util::{SinkExt, StreamExt};
use mudgate_telnet::{InboundEvent, OutboundEvent, Protocol, TelnetEngine};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;

const READ_CHUNK: usize = 1024;

/// What a single [`Transport::read_chunk`] call observed.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Bytes arrived and should be fed to the protocol engine.
    Data(Vec<u8>),
    /// The transport produced a non-data frame (WebSocket ping/pong) with
    /// nothing for the engine; the connection is still open.
    Idle,
    /// The peer closed its end of the connection.
    Closed,
}

/// The concrete wire transport underneath a connection. Closed and matched on
/// directly rather than boxed, since the set of transports never grows at
/// runtime.
pub enum Transport {
    /// Plain TCP, raw telnet bytes.
    Plain(TcpStream),
    /// TCP wrapped in a server-side TLS session, raw telnet bytes.
    Tls(Box<TlsStream<TcpStream>>),
    /// Telnet framed as WebSocket text/binary messages over plain TCP.
    WebSocket(Box<WebSocketStream<TcpStream>>),
    /// Telnet framed as WebSocket text/binary messages over TLS.
    WebSocketTls(Box<WebSocketStream<TlsStream<TcpStream>>>),
}

impl Transport {
    /// Read the next chunk of bytes from the peer. Stream transports
    /// distinguish a real read from peer-initiated EOF; message-framed
    /// transports distinguish a data frame from a non-data frame (ping/pong)
    /// and from the peer's close frame.
    pub async fn read_chunk(&mut self, chunk_size: usize) -> io::Result<ReadOutcome> {
        match self {
            Transport::Plain(stream) => read_stream_chunk(stream, chunk_size).await,
            Transport::Tls(stream) => read_stream_chunk(stream.as_mut(), chunk_size).await,
            Transport::WebSocket(ws) => read_ws_chunk(ws.as_mut()).await,
            Transport::WebSocketTls(ws) => read_ws_chunk(ws.as_mut()).await,
        }
    }

    /// Write a buffer of bytes to the peer, flushing stream transports or
    /// wrapping the buffer as one binary WebSocket message.
    pub async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Transport::Plain(stream) => write_stream_all(stream, bytes).await,
            Transport::Tls(stream) => write_stream_all(stream.as_mut(), bytes).await,
            Transport::WebSocket(ws) => write_ws_all(ws.as_mut(), bytes).await,
            Transport::WebSocketTls(ws) => write_ws_all(ws.as_mut(), bytes).await,
        }
    }

    /// The protocol kind the engine should be constructed with for this
    /// transport.
    pub fn protocol(&self) -> Protocol {
        match self {
            Transport::Plain(_) | Transport::Tls(_) => Protocol::Telnet,
            Transport::WebSocket(_) | Transport::WebSocketTls(_) => Protocol::WebSocket,
        }
    }
}

async fn read_stream_chunk<S: AsyncReadExt + Unpin>(stream: &mut S, chunk_size: usize) -> io::Result<ReadOutcome> {
    let mut buf = vec![0u8; chunk_size];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Ok(ReadOutcome::Closed);
    }
    buf.truncate(n);
    Ok(ReadOutcome::Data(buf))
}

async fn write_stream_all<S: AsyncWriteExt + Unpin>(stream: &mut S, bytes: &[u8]) -> io::Result<()> {
    stream.write_all(bytes).await?;
    stream.flush().await
}

async fn read_ws_chunk<S>(ws: &mut WebSocketStream<S>) -> io::Result<ReadOutcome>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    match ws.next().await {
        Some(Ok(WsMessage::Binary(data))) => Ok(ReadOutcome::Data(data.to_vec())),
        Some(Ok(WsMessage::Text(text))) => Ok(ReadOutcome::Data(text.as_bytes().to_vec())),
        Some(Ok(WsMessage::Close(_))) => Ok(ReadOutcome::Closed),
        Some(Ok(_)) => Ok(ReadOutcome::Idle),
        Some(Err(err)) => Err(io::Error::other(err)),
        None => Ok(ReadOutcome::Closed),
    }
}

async fn write_ws_all<S>(ws: &mut WebSocketStream<S>, bytes: &[u8]) -> io::Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    ws.send(WsMessage::Binary(bytes.to_vec().into()))
        .await
        .map_err(io::Error::other)
}

/// One client connection: identity, transport, protocol engine, and the
/// deques the I/O thread and the game thread hand events through.
pub struct Connection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    transport: Transport,
    engine: TelnetEngine,
    inbound: VecDeque<InboundEvent>,
    outbound: VecDeque<OutboundEvent>,
    is_writing: bool,
    read_chunk_size: usize,
}

impl Connection {
    /// Build a connection around an accepted transport. Does not perform any
    /// I/O; call [`Connection::start`] once it is registered with the queue.
    pub fn new(id: ConnectionId, peer_addr: SocketAddr, transport: Transport) -> Self {
        let engine = TelnetEngine::new(transport.protocol());
        Connection {
            id,
            peer_addr,
            transport,
            engine,
            inbound: VecDeque::new(),
            outbound: VecDeque::new(),
            is_writing: false,
            read_chunk_size: READ_CHUNK,
        }
    }

    /// This connection's id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The peer's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Override the read chunk size used for stream transports, e.g. from a
    /// listener's configured `ListenerConfig::read_chunk_size`.
    pub fn set_read_chunk_size(&mut self, size: usize) {
        self.read_chunk_size = size;
    }

    /// Begin the telnet handshake and flush its initial negotiation bytes to
    /// the wire.
    #[tracing::instrument(skip(self), fields(connection = %self.id))]
    pub async fn start(&mut self) -> Result<()> {
        self.engine.start();
        tracing::debug!("engine started, negotiation bytes queued");
        self.flush_outbox().await
    }

    /// Read one chunk from the transport and feed it to the engine, pushing
    /// any resulting events onto the inbound deque. Returns `Ok(true)` once
    /// the peer has gone away (EOF, a WebSocket close frame, or a transport
    /// error), in which case an `InboundEvent::Disconnect` has been pushed
    /// and an `OutboundEvent::Disconnected` has been queued so the next
    /// `process_out_events` tears the connection down.
    pub async fn on_receive(&mut self) -> Result<bool> {
        let outcome = match self.transport.read_chunk(self.read_chunk_size).await {
            Ok(outcome) => outcome,
            Err(source) => {
                tracing::error!(connection = %self.id, %source, "transport read failed");
                self.schedule_disconnect();
                return Ok(true);
            }
        };

        match outcome {
            ReadOutcome::Closed => {
                tracing::debug!(connection = %self.id, "peer closed connection");
                self.schedule_disconnect();
                Ok(true)
            }
            ReadOutcome::Idle => Ok(false),
            ReadOutcome::Data(bytes) => {
                tracing::trace!(connection = %self.id, bytes = bytes.len(), "read chunk");
                let events = self.engine.receive(&bytes);
                self.inbound.extend(events);
                self.flush_outbox().await?;
                Ok(false)
            }
        }
    }

    /// Surface a `Disconnect` to the game and queue the teardown event that
    /// `process_out_events` uses to actually remove the connection, keeping
    /// destruction on that single code path regardless of which side noticed
    /// the connection was gone first.
    fn schedule_disconnect(&mut self) {
        self.inbound.push_back(InboundEvent::Disconnect);
        self.outbound.push_back(OutboundEvent::Disconnected);
    }

    /// Complete the handshake deadline: idempotent, emits `Ready` and any
    /// parked outbound work queued before it.
    #[tracing::instrument(skip(self), fields(connection = %self.id))]
    pub async fn finish_ready(&mut self) -> Result<()> {
        let events = self.engine.finish_ready();
        if events.iter().any(|e| matches!(e, InboundEvent::Ready)) {
            tracing::debug!("connection reached ready");
        }
        self.inbound.extend(events);
        self.flush_outbox().await
    }

    /// Drain and return every inbound event produced since the last call.
    /// Called exclusively by the game thread.
    pub fn drain_inbound(&mut self) -> Vec<InboundEvent> {
        self.inbound.drain(..).collect()
    }

    /// Queue an event from the game for delivery to the peer. Called
    /// exclusively by the game thread; does not perform I/O itself.
    pub fn enqueue_outbound(&mut self, event: OutboundEvent) {
        self.outbound.push_back(event);
    }

    /// Whether this connection has outbound work waiting to be written.
    pub fn has_pending_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Hand every queued outbound event to the engine and write whatever it
    /// produces. Returns `true` if the game asked to disconnect.
    pub async fn process_outbound(&mut self) -> Result<bool> {
        let mut disconnecting = false;
        while let Some(event) = self.outbound.pop_front() {
            if matches!(event, OutboundEvent::Disconnected) {
                disconnecting = true;
            }
            self.engine.process_from_mud(event);
        }
        self.flush_outbox().await?;
        Ok(disconnecting)
    }

    /// Write whatever the engine has queued, then check again: the single
    /// writer keeps chaining writes until the outbox is drained dry rather
    /// than stopping after one pass, so bytes queued while a write was in
    /// flight aren't left behind.
    async fn flush_outbox(&mut self) -> Result<()> {
        loop {
            let bytes = self.engine.take_outbox();
            if bytes.is_empty() {
                return Ok(());
            }
            self.is_writing = true;
            let result = self.transport.write_all(&bytes).await;
            self.is_writing = false;
            result.map_err(|source| GatewayError::Transport { id: self.id, source })?;
        }
    }

    /// Whether the handshake has completed.
    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_connection_has_no_pending_outbound() {
        // Construction without a real socket is exercised via the queue's
        // integration tests (tests/loopback.rs), which drive a real
        // `TcpStream` pair; this module's unit scope is the deque bookkeeping
        // that doesn't need a transport at all.
        let mut deque: VecDeque<OutboundEvent> = VecDeque::new();
        assert!(deque.is_empty());
        deque.push_back(OutboundEvent::StatusReq);
        assert!(!deque.is_empty());
    }
}
