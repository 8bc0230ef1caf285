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

//! Per-option negotiation bookkeeping: the [`Perspective`]/[`OptionState`] pair
//! tracked for every supported option code, and the [`HandshakeTracker`] that
//! drives the connection's ready transition.

use std::collections::BTreeSet;

/// One side's view of a single option: whether it is running, whether a request
/// is outstanding, and whether the handshake tracker has already been notified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Perspective {
    /// The peer agreed this side runs the option.
    pub enabled: bool,
    /// We have an outstanding request the peer has not answered yet.
    pub negotiating: bool,
    /// The handshake tracker has already been told this negotiation concluded.
    pub answered: bool,
}

/// The state for one option code: how it stands on our end ("local", we WILL/they DO)
/// and on the peer's end ("remote", we DO/they WILL).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionState {
    /// This end runs the option.
    pub local: Perspective,
    /// The peer runs the option.
    pub remote: Perspective,
}

/// Bookkeeping of which option negotiations are still open, i.e. awaiting a peer
/// reply. A connection is ready to declare itself [`Self::empty`] once every
/// negotiation it started has been answered or refused.
#[derive(Debug, Clone, Default)]
pub struct HandshakeTracker {
    /// Options for which we expect a `DO`/`DONT` reply.
    pub local: BTreeSet<u8>,
    /// Options for which we expect a `WILL`/`WONT` reply.
    pub remote: BTreeSet<u8>,
    /// Options needing an additional post-negotiation round-trip (e.g. TTYPE
    /// cycling). No option implemented today populates this, but the slot is
    /// part of the tracker's emptiness test.
    pub special: BTreeSet<u8>,
}

impl HandshakeTracker {
    /// A tracker with nothing outstanding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that we're expecting a `DO`/`DONT` reply for `code`.
    pub fn register_local(&mut self, code: u8) {
        self.local.insert(code);
    }

    /// Record that we're expecting a `WILL`/`WONT` reply for `code`.
    pub fn register_remote(&mut self, code: u8) {
        self.remote.insert(code);
    }

    /// Mark the local-side negotiation for `code` as concluded.
    pub fn complete_local(&mut self, code: u8) {
        self.local.remove(&code);
    }

    /// Mark the remote-side negotiation for `code` as concluded.
    pub fn complete_remote(&mut self, code: u8) {
        self.remote.remove(&code);
    }

    /// True once every set is empty: nothing is outstanding, and the connection
    /// may transition to ready.
    pub fn empty(&self) -> bool {
        self.local.is_empty() && self.remote.is_empty() && self.special.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        assert!(HandshakeTracker::new().empty());
    }

    #[test]
    fn register_then_complete_is_idempotent_on_emptiness() {
        let mut t = HandshakeTracker::new();
        t.register_local(3);
        assert!(!t.empty());
        t.complete_local(3);
        assert!(t.empty());
        // completing again is a no-op, not an error
        t.complete_local(3);
        assert!(t.empty());
    }

    #[test]
    fn local_and_remote_are_independent() {
        let mut t = HandshakeTracker::new();
        t.register_local(3);
        t.register_remote(31);
        t.complete_local(3);
        assert!(!t.empty());
        t.complete_remote(31);
        assert!(t.empty());
    }
}
