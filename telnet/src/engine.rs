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

//! [`TelnetEngine`]: the per-connection orchestrator. Owns the option state
//! table, handshake tracker, line buffer, and capabilities; consumes inbound
//! bytes and produces game-facing events, and consumes game-facing commands
//! and produces outbound bytes.
//!
//! This is a single data-driven state table, not a class-per-option hierarchy:
//! every option is handled by the same negotiation dispatch in
//! [`TelnetEngine::receive_negotiation`], keyed by option code.

use crate::capabilities::{Capabilities, Protocol};
use crate::constants::*;
use crate::event::{InboundEvent, OutboundEvent};
use crate::message::{TelnetMessage, parse_message};
use crate::option::{HandshakeTracker, OptionState};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// How long after `start()` the engine forces the ready transition if the peer
/// has not answered every negotiation it started. See `DESIGN.md` for why this
/// default is a `Listener`-level config knob rather than a hard constant.
pub const DEFAULT_HANDSHAKE_DEADLINE_MS: u64 = 500;

/// The per-connection TELNET protocol state machine.
#[derive(Debug)]
pub struct TelnetEngine {
    states: BTreeMap<u8, OptionState>,
    handshake: HandshakeTracker,
    capabilities: Capabilities,
    active: bool,
    changed: bool,
    line_buffer: Vec<u8>,
    pending_outbound: Vec<OutboundEvent>,
    outbox: Vec<u8>,
}

impl TelnetEngine {
    /// A fresh engine for a connection that has not yet called [`Self::start`].
    pub fn new(protocol: Protocol) -> Self {
        TelnetEngine {
            states: BTreeMap::new(),
            handshake: HandshakeTracker::new(),
            capabilities: Capabilities::for_protocol(protocol),
            active: false,
            changed: false,
            line_buffer: Vec::new(),
            pending_outbound: Vec::new(),
            outbox: Vec::new(),
        }
    }

    /// Whether the connection has completed (or been forced through) its
    /// handshake and is safe for the game to interact with.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// A read-only snapshot of the connection's negotiated capabilities.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Drain and return bytes the engine has queued for the wire.
    pub fn take_outbox(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbox)
    }

    /// Initialise the state table, send our proactive negotiations, and arm the
    /// handshake deadline (the caller owns the timer; this only sets up the
    /// state that `finish_ready` later reads). Returns nothing: any inbound
    /// events triggered by `start()` itself would only happen if the deadline
    /// were zero, which it never is.
    pub fn start(&mut self) {
        for &code in SUPPORTED {
            self.states.insert(code, OptionState::default());
        }

        for &code in START_LOCAL {
            self.write_negotiation(WILL, code);
            self.states.entry(code).or_default().local.negotiating = true;
            self.handshake.register_local(code);
        }

        for &code in START_REMOTE {
            self.write_negotiation(DO, code);
            self.states.entry(code).or_default().remote.negotiating = true;
            self.handshake.register_remote(code);
        }

        debug!(local = ?START_LOCAL, remote = ?START_REMOTE, "telnet engine started");
    }

    /// Feed newly-arrived bytes through the parser, update state, and collect
    /// the inbound events produced along the way.
    pub fn receive(&mut self, bytes: &[u8]) -> Vec<InboundEvent> {
        let mut incoming = bytes.to_vec();
        let mut out = Vec::new();

        loop {
            let (msg, consumed) = match parse_message(&incoming) {
                Some(pair) => pair,
                None => break,
            };
            incoming.drain(..consumed);
            self.process_message(msg, &mut out);
        }

        out
    }

    fn process_message(&mut self, msg: TelnetMessage, out: &mut Vec<InboundEvent>) {
        match msg {
            TelnetMessage::Data(data) => self.receive_data(&data, out),
            TelnetMessage::Negotiation { verb, option } => self.receive_negotiation(verb, option),
            TelnetMessage::SubNegotiation { option, payload } => self.receive_subnegotiation(option, &payload, out),
            TelnetMessage::Command(_cmd) => trace!("ignoring bare telnet command (NOP/GA no-op)"),
        }

        if self.active {
            if self.changed {
                self.changed = false;
                out.push(InboundEvent::Update("capabilities changed".to_string()));
            }
        } else if self.handshake.empty() {
            out.extend(self.finish_ready());
        }
    }

    fn receive_data(&mut self, data: &[u8], out: &mut Vec<InboundEvent>) {
        self.line_buffer.extend_from_slice(data);

        while let Some(pos) = self.line_buffer.iter().position(|&b| is_line_terminator(b)) {
            let mut end = pos + 1;
            // Swallow the paired byte of a CRLF or LFCR terminator so it
            // doesn't start an empty line of its own.
            if end < self.line_buffer.len() && is_line_terminator(self.line_buffer[end]) && self.line_buffer[end] != self.line_buffer[pos] {
                end += 1;
            }
            let line: Vec<u8> = self.line_buffer.drain(..end).collect();
            let trimmed = trim_ascii_whitespace(&line);
            if !trimmed.is_empty() {
                out.push(InboundEvent::Line(String::from_utf8_lossy(trimmed).into_owned()));
            }
        }
    }

    fn write_negotiation(&mut self, verb: u8, option: u8) {
        self.outbox.extend_from_slice(&[IAC, verb, option]);
    }

    fn receive_negotiation(&mut self, verb: u8, code: u8) {
        if !supports_any(code) {
            match verb {
                WILL => self.write_negotiation(DONT, code),
                DO => self.write_negotiation(WONT, code),
                WONT | DONT => {}
                _ => {}
            }
            return;
        }

        match verb {
            WILL => self.receive_will(code),
            DO => self.receive_do(code),
            WONT => self.receive_wont(code),
            DONT => self.receive_dont(code),
            _ => {}
        }
    }

    fn receive_will(&mut self, code: u8) {
        if !supports_remote(code) {
            warn!(option = code, "rejecting unsupported remote option");
            self.write_negotiation(DONT, code);
            return;
        }

        let was_negotiating = self.states.get(&code).is_some_and(|s| s.remote.negotiating);
        let already_enabled = self.states.get(&code).is_some_and(|s| s.remote.enabled);

        if was_negotiating {
            let state = self.states.entry(code).or_default();
            state.remote.negotiating = false;
            if !already_enabled {
                state.remote.enabled = true;
                self.enable_remote(code);
            }
            self.mark_remote_answered(code);
        } else {
            self.states.entry(code).or_default().remote.enabled = true;
            self.write_negotiation(DO, code);
            self.enable_remote(code);
            self.mark_remote_answered(code);
        }
    }

    fn receive_do(&mut self, code: u8) {
        if !supports_local(code) {
            warn!(option = code, "rejecting unsupported local option");
            self.write_negotiation(WONT, code);
            return;
        }

        let was_negotiating = self.states.get(&code).is_some_and(|s| s.local.negotiating);
        let already_enabled = self.states.get(&code).is_some_and(|s| s.local.enabled);

        if was_negotiating {
            let state = self.states.entry(code).or_default();
            state.local.negotiating = false;
            if !already_enabled {
                state.local.enabled = true;
                self.enable_local(code);
            }
            self.mark_local_answered(code);
        } else {
            self.states.entry(code).or_default().local.enabled = true;
            self.write_negotiation(WILL, code);
            self.enable_local(code);
            self.mark_local_answered(code);
        }
    }

    fn receive_wont(&mut self, code: u8) {
        let Some(state) = self.states.get_mut(&code) else { return };
        if state.remote.enabled {
            state.remote.enabled = false;
            self.disable_remote(code);
        }
        let negotiating = self.states.get(&code).is_some_and(|s| s.remote.negotiating);
        if negotiating {
            self.states.get_mut(&code).unwrap().remote.negotiating = false;
            self.mark_remote_answered(code);
        }
    }

    fn receive_dont(&mut self, code: u8) {
        let Some(state) = self.states.get_mut(&code) else { return };
        if state.local.enabled {
            state.local.enabled = false;
            self.disable_local(code);
        }
        let negotiating = self.states.get(&code).is_some_and(|s| s.local.negotiating);
        if negotiating {
            self.states.get_mut(&code).unwrap().local.negotiating = false;
            self.mark_local_answered(code);
        }
    }

    fn mark_local_answered(&mut self, code: u8) {
        let state = self.states.entry(code).or_default();
        if !state.local.answered {
            state.local.answered = true;
            self.handshake.complete_local(code);
        }
    }

    fn mark_remote_answered(&mut self, code: u8) {
        let state = self.states.entry(code).or_default();
        if !state.remote.answered {
            state.remote.answered = true;
            self.handshake.complete_remote(code);
        }
    }

    fn receive_subnegotiation(&mut self, option: u8, payload: &[u8], out: &mut Vec<InboundEvent>) {
        if !supports_any(option) {
            return;
        }

        match option {
            NAWS => self.handle_naws(payload),
            MTTS => self.handle_mtts(payload),
            MSSP => self.handle_mssp(payload, out),
            GMCP => self.handle_gmcp(payload, out),
            MSDP => self.handle_msdp(payload, out),
            _ => {
                // Accepted option with no payload interpretation (MXP, LINEMODE,
                // MCCP2/3): presence is already tracked by the negotiation handler.
            }
        }
    }

    fn handle_naws(&mut self, payload: &[u8]) {
        if payload.len() < 4 {
            warn!(len = payload.len(), "malformed NAWS subnegotiation, dropping");
            return;
        }
        if !self.capabilities.naws {
            self.capabilities.naws = true;
            self.changed = true;
        }
    }

    fn handle_mtts(&mut self, payload: &[u8]) {
        // IS = 0 marker byte, then the terminal-type string.
        if payload.first() != Some(&0) {
            return;
        }
        let name = String::from_utf8_lossy(&payload[1..]).into_owned();
        if !self.capabilities.mtts {
            self.capabilities.mtts = true;
            self.changed = true;
        }
        if self.capabilities.client_name.as_deref() != Some(name.as_str()) {
            self.capabilities.client_name = Some(name);
            self.changed = true;
        }
    }

    fn handle_mssp(&mut self, payload: &[u8], out: &mut Vec<InboundEvent>) {
        const VAR: u8 = 1;
        const VAL: u8 = 2;

        let mut map = BTreeMap::new();
        let mut i = 0;
        while i < payload.len() {
            if payload[i] != VAR {
                warn!("malformed MSSP subnegotiation, dropping remainder");
                break;
            }
            i += 1;
            let name_start = i;
            while i < payload.len() && payload[i] != VAL {
                i += 1;
            }
            let name = String::from_utf8_lossy(&payload[name_start..i]).into_owned();
            if i >= payload.len() {
                break;
            }
            i += 1; // skip VAL
            let val_start = i;
            while i < payload.len() && payload[i] != VAR {
                i += 1;
            }
            let value = String::from_utf8_lossy(&payload[val_start..i]).into_owned();
            map.insert(name, value);
        }

        if !self.capabilities.mssp {
            self.capabilities.mssp = true;
            self.changed = true;
        }
        out.push(InboundEvent::Mssp(map));
    }

    /// Whether `code` is actually running, on either side, rather than
    /// merely accepted as a known option. A sub-negotiation for an option
    /// that was never negotiated on is noise, not data.
    fn option_enabled(&self, code: u8) -> bool {
        self.states.get(&code).is_some_and(|s| s.local.enabled || s.remote.enabled)
    }

    fn handle_gmcp(&mut self, payload: &[u8], out: &mut Vec<InboundEvent>) {
        if !self.option_enabled(GMCP) {
            trace!("dropping GMCP subnegotiation: option not enabled");
            return;
        }
        if !self.capabilities.gmcp {
            self.capabilities.gmcp = true;
            self.capabilities.oob = true;
            self.changed = true;
        }
        let text = String::from_utf8_lossy(payload);
        let (package, body) = text.split_once(' ').unwrap_or((text.as_ref(), ""));
        out.push(InboundEvent::OobData(package.to_string(), body.as_bytes().to_vec()));
    }

    fn handle_msdp(&mut self, payload: &[u8], out: &mut Vec<InboundEvent>) {
        const MSDP_VAR: u8 = 1;
        const MSDP_VAL: u8 = 2;

        if !self.option_enabled(MSDP) {
            trace!("dropping MSDP subnegotiation: option not enabled");
            return;
        }
        if !self.capabilities.msdp {
            self.capabilities.msdp = true;
            self.capabilities.oob = true;
            self.changed = true;
        }

        if payload.first() != Some(&MSDP_VAR) {
            warn!("malformed MSDP subnegotiation, dropping");
            return;
        }
        let mut i = 1;
        let name_start = i;
        while i < payload.len() && payload[i] != MSDP_VAL {
            i += 1;
        }
        let name = String::from_utf8_lossy(&payload[name_start..i]).into_owned();
        let value = if i < payload.len() { payload[i + 1..].to_vec() } else { Vec::new() };
        out.push(InboundEvent::OobData(name, value));
    }

    /// Engine hook: the peer now runs `code` on its end (we `DO`, they `WILL`).
    fn enable_remote(&mut self, code: u8) {
        match code {
            SGA => self.capabilities.sga = true,
            LINEMODE => self.capabilities.linemode = true,
            _ => {}
        }
        self.changed = true;
    }

    /// Engine hook: we now run `code` on our end (we `WILL`, they `DO`).
    fn enable_local(&mut self, code: u8) {
        match code {
            SGA => self.capabilities.sga = true,
            TELOPT_EOR => {}
            _ => {}
        }
        self.changed = true;
    }

    fn disable_remote(&mut self, code: u8) {
        match code {
            SGA => self.capabilities.sga = false,
            LINEMODE => self.capabilities.linemode = false,
            _ => {}
        }
        self.changed = true;
    }

    fn disable_local(&mut self, code: u8) {
        if code == SGA {
            self.capabilities.sga = false;
        }
        self.changed = true;
    }

    /// Called once, either when the handshake tracker empties or the deadline
    /// timer fires. Idempotent.
    pub fn finish_ready(&mut self) -> Vec<InboundEvent> {
        if self.active {
            return Vec::new();
        }
        self.active = true;

        let pending = std::mem::take(&mut self.pending_outbound);
        for event in pending {
            self.dispatch_outbound(event);
        }

        vec![InboundEvent::Ready]
    }

    /// Accept a game-originated event. Before `Ready` this parks the event in
    /// order; after, it is dispatched directly to the wire.
    pub fn process_from_mud(&mut self, event: OutboundEvent) {
        if self.active {
            self.dispatch_outbound(event);
        } else {
            self.pending_outbound.push(event);
        }
    }

    fn dispatch_outbound(&mut self, event: OutboundEvent) {
        match event {
            OutboundEvent::Command(text) => {
                self.outbox.extend_from_slice(text.as_bytes());
                self.outbox.extend_from_slice(b"\r\n");
            }
            OutboundEvent::Oob(name, payload) => {
                let option = if self.capabilities.gmcp {
                    GMCP
                } else if self.capabilities.msdp {
                    MSDP
                } else {
                    return;
                };
                let mut body = name.into_bytes();
                if option == GMCP {
                    body.push(b' ');
                }
                body.extend_from_slice(&payload);
                self.outbox.push(IAC);
                self.outbox.push(SB);
                self.outbox.push(option);
                self.outbox.extend_from_slice(&body);
                self.outbox.push(IAC);
                self.outbox.push(SE);
            }
            OutboundEvent::StatusReq => {
                if self.capabilities.mssp {
                    self.outbox.push(IAC);
                    self.outbox.push(SB);
                    self.outbox.push(MSSP);
                    self.outbox.push(IAC);
                    self.outbox.push(SE);
                }
            }
            OutboundEvent::Disconnected => {
                // Transport teardown is the Connection's job; the engine only
                // needs to stop accepting further writes, which `Disconnected`
                // being terminal for the connection already guarantees.
            }
        }
    }
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |p| p + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_engine() -> TelnetEngine {
        TelnetEngine::new(Protocol::Telnet)
    }

    #[test]
    fn start_announces_every_start_local_option() {
        let mut engine = new_engine();
        engine.start();
        let outbox = engine.take_outbox();
        for &code in START_LOCAL {
            assert!(
                outbox.windows(3).any(|w| w == [IAC, WILL, code]),
                "missing IAC WILL {code}"
            );
        }
        for &code in START_LOCAL {
            assert!(engine_handshake_local_contains(&engine, code));
        }
    }

    fn engine_handshake_local_contains(engine: &TelnetEngine, code: u8) -> bool {
        engine.handshake.local.contains(&code)
    }

    #[test]
    fn quiet_client_reaches_ready_on_explicit_deadline_call() {
        let mut engine = new_engine();
        engine.start();
        assert!(!engine.is_active());
        let events = engine.finish_ready();
        assert_eq!(events, vec![InboundEvent::Ready]);
        assert!(engine.is_active());
        // idempotent
        assert_eq!(engine.finish_ready(), Vec::new());
    }

    #[test]
    fn immediate_line_then_ready_at_deadline() {
        let mut engine = new_engine();
        engine.start();
        let events = engine.receive(b"hi\n");
        assert!(events.is_empty(), "not active yet, nothing to report besides handshake state");
        let ready = engine.finish_ready();
        assert_eq!(ready, vec![InboundEvent::Ready]);
    }

    #[test]
    fn sga_handshake_completes_and_clears_tracker() {
        let mut engine = new_engine();
        engine.start();
        assert!(engine.handshake.local.contains(&SGA));
        engine.receive(&[IAC, DO, SGA]);
        assert!(engine.states[&SGA].local.enabled);
        assert!(!engine.handshake.local.contains(&SGA));
    }

    #[test]
    fn unsupported_option_is_refused_without_state_entry() {
        let mut engine = new_engine();
        engine.receive(&[IAC, WILL, 77]);
        let outbox = engine.take_outbox();
        assert_eq!(outbox, vec![IAC, DONT, 77]);
        assert!(!engine.states.contains_key(&77));
    }

    #[test]
    #[tracing_test::traced_test]
    fn unsupported_option_rejection_is_logged() {
        let mut engine = new_engine();
        engine.receive(&[IAC, WILL, 77]);
        assert!(logs_contain("rejecting unsupported remote option"));
    }

    #[test]
    fn bare_cr_terminates_a_line_same_as_lf() {
        let mut engine = new_engine();
        engine.finish_ready();
        let events = engine.receive(b"look\r");
        assert!(events.contains(&InboundEvent::Line("look".to_string())));
    }

    #[test]
    fn escaped_iac_survives_into_line_event() {
        let mut engine = new_engine();
        engine.finish_ready();
        let events = engine.receive(&[b'A', IAC, IAC, b'B', b'\n']);
        let expected = String::from_utf8_lossy(b"A\xffB").into_owned();
        assert!(events.contains(&InboundEvent::Line(expected)));
    }

    #[test]
    fn gmcp_subnegotiation_is_dropped_when_not_enabled() {
        let mut engine = new_engine();
        engine.finish_ready();
        // No WILL/DO exchange for GMCP happened, so it was never enabled.
        let events = engine.receive(&[IAC, SB, GMCP, b'C', b'o', b'r', b'e', b'.', b'H', b'i', b' ', b'{', b'}', IAC, SE]);
        assert!(!events.iter().any(|e| matches!(e, InboundEvent::OobData(..))));
        assert!(!engine.capabilities().gmcp);
    }

    #[test]
    fn gmcp_subnegotiation_emits_oob_when_enabled() {
        let mut engine = new_engine();
        engine.finish_ready();
        // Manually enable GMCP as if negotiated.
        engine.receive(&[IAC, WILL, GMCP]);
        let events = engine.receive(&[IAC, SB, GMCP, b'C', b'o', b'r', b'e', b'.', b'H', b'i', b' ', b'{', b'}', IAC, SE]);
        assert!(events.iter().any(|e| matches!(e, InboundEvent::OobData(name, _) if name == "Core.Hi")));
    }

    #[test]
    fn outbound_events_before_ready_are_parked_and_replayed_in_order() {
        let mut engine = new_engine();
        engine.process_from_mud(OutboundEvent::Command("one".into()));
        engine.process_from_mud(OutboundEvent::Command("two".into()));
        assert!(engine.take_outbox().is_empty());
        engine.finish_ready();
        let outbox = engine.take_outbox();
        let text = String::from_utf8_lossy(&outbox);
        assert!(text.find("one").unwrap() < text.find("two").unwrap());
    }
}
