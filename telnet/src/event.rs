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

//! The two event vocabularies that cross the game/connection boundary.

use std::collections::BTreeMap;

/// An event flowing from a connection up to the game.
///
/// Includes `Ready` and `Update`, which the distilled wire-level summary lists
/// under the game-to-connection vocabulary; the concrete operational text
/// describing both ("emit an inbound Ready event", "Update ... delivered to the
/// game") is unambiguous that the engine produces them towards the game, so
/// they live here (see `DESIGN.md` for the full resolution).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A complete, whitespace-trimmed line of input.
    Line(String),
    /// Free text not subject to line framing (reserved for transports that
    /// deliver whole messages, e.g. a WebSocket client sending a JSON blob).
    Text(String),
    /// A partial line the engine believes is a prompt (reserved; no current
    /// option handler emits this).
    Prompt(String),
    /// Out-of-band data received on a GMCP or MSDP channel: `(name, payload)`.
    OobData(String, Vec<u8>),
    /// A parsed MSSP `VAR`/`VAL` payload.
    Mssp(BTreeMap<String, String>),
    /// The connection has gone away; this is always the last event for its id.
    Disconnect,
    /// The connection has completed its handshake (or hit the deadline) and is
    /// now safe for the game to interact with. Emitted exactly once.
    Ready,
    /// Capabilities changed as a result of negotiation or sub-negotiation.
    /// Carries a short human-readable description of what changed.
    Update(String),
}

/// An event flowing from the game down to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Plain text, written verbatim followed by `CR LF`.
    Command(String),
    /// Out-of-band payload: `(name, payload)`, sent over GMCP if enabled, else MSDP.
    Oob(String, Vec<u8>),
    /// Ask the peer to (re-)send its MSSP status, if MSSP is enabled.
    StatusReq,
    /// Tear the connection down after flushing any already-queued writes.
    Disconnected,
}
