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

//! The byte parser: a pure, re-entrant function mapping a buffer's head to
//! zero-or-one framed [`TelnetMessage`] plus the number of bytes it consumed.
//!
//! `parse_message` never errors: input it cannot yet complete is signalled by
//! `None`, leaving the buffer untouched so the caller can retry once more
//! bytes arrive.

use crate::constants::{IAC, SB, SE, is_negotiation_verb};

/// A single framed unit out of the telnet byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetMessage {
    /// Application payload, with any `IAC IAC` already collapsed to one `IAC` byte.
    Data(Vec<u8>),
    /// A bare `IAC <cmd>` for a `cmd` that is not one of the negotiation verbs or `SB`.
    Command(u8),
    /// `IAC <WILL|WONT|DO|DONT> <opt>`.
    Negotiation { verb: u8, option: u8 },
    /// `IAC SB <opt> … IAC SE`, payload is the bytes strictly between `<opt>` and the
    /// terminating `IAC SE`, with any embedded `IAC IAC` left exactly as received.
    SubNegotiation { option: u8, payload: Vec<u8> },
}

/// Parse one message off the head of `buf`.
///
/// Returns `Some((message, consumed))` when a complete frame is present, or `None`
/// if `buf` does not yet hold a full frame. On `None` the caller must not advance
/// its read cursor; more bytes are required.
pub fn parse_message(buf: &[u8]) -> Option<(TelnetMessage, usize)> {
    let b0 = *buf.first()?;

    if b0 != IAC {
        let end = buf.iter().position(|&b| b == IAC).unwrap_or(buf.len());
        return Some((TelnetMessage::Data(buf[..end].to_vec()), end));
    }

    let b1 = *buf.get(1)?;

    if b1 == IAC {
        return Some((TelnetMessage::Data(vec![IAC]), 2));
    }

    if is_negotiation_verb(b1) {
        let opt = *buf.get(2)?;
        return Some((TelnetMessage::Negotiation { verb: b1, option: opt }, 3));
    }

    if b1 == SB {
        let option = *buf.get(2)?;
        // We need the option byte plus a terminating (unescaped) IAC SE: 5 bytes minimum.
        if buf.len() < 5 {
            return None;
        }
        let body = &buf[3..];
        let mut i = 0;
        while i + 1 < body.len() {
            if body[i] == IAC {
                if body[i + 1] == IAC {
                    // escaped IAC inside the payload, skip both bytes
                    i += 2;
                    continue;
                }
                if body[i + 1] == SE {
                    let payload = body[..i].to_vec();
                    let consumed = 3 + i + 2;
                    return Some((TelnetMessage::SubNegotiation { option, payload }, consumed));
                }
            }
            i += 1;
        }
        return None;
    }

    Some((TelnetMessage::Command(b1), 2))
}

/// Serialise a [`TelnetMessage`] back to wire bytes, escaping `IAC` in `Data` and
/// leaving `SubNegotiation` payloads exactly as given (callers are responsible for
/// having already escaped them, matching the parser's own "preserved as-is" policy).
pub fn serialize_message(msg: &TelnetMessage) -> Vec<u8> {
    match msg {
        TelnetMessage::Data(bytes) => {
            let mut out = Vec::with_capacity(bytes.len());
            for &b in bytes {
                out.push(b);
                if b == IAC {
                    out.push(IAC);
                }
            }
            out
        }
        TelnetMessage::Command(cmd) => vec![IAC, *cmd],
        TelnetMessage::Negotiation { verb, option } => vec![IAC, *verb, *option],
        TelnetMessage::SubNegotiation { option, payload } => {
            let mut out = Vec::with_capacity(payload.len() + 5);
            out.push(IAC);
            out.push(SB);
            out.push(*option);
            out.extend_from_slice(payload);
            out.push(IAC);
            out.push(SE);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DO, DONT, WILL, WONT};

    #[test]
    fn data_stops_at_iac() {
        let (msg, consumed) = parse_message(b"hello\xffmore").unwrap();
        assert_eq!(msg, TelnetMessage::Data(b"hello".to_vec()));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn data_consumes_whole_buffer_without_iac() {
        let (msg, consumed) = parse_message(b"hello").unwrap();
        assert_eq!(msg, TelnetMessage::Data(b"hello".to_vec()));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn escaped_iac_is_single_data_byte() {
        let (msg, consumed) = parse_message(&[IAC, IAC]).unwrap();
        assert_eq!(msg, TelnetMessage::Data(vec![IAC]));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn negotiation_frame() {
        let (msg, consumed) = parse_message(&[IAC, WILL, 3]).unwrap();
        assert_eq!(msg, TelnetMessage::Negotiation { verb: WILL, option: 3 });
        assert_eq!(consumed, 3);
    }

    #[test]
    fn bare_command() {
        let (msg, consumed) = parse_message(&[IAC, 241]).unwrap();
        assert_eq!(msg, TelnetMessage::Command(241));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn subnegotiation_with_embedded_escaped_iac() {
        let bytes = [IAC, SB, 70, IAC, IAC, IAC, SE];
        let (msg, consumed) = parse_message(&bytes).unwrap();
        assert_eq!(
            msg,
            TelnetMessage::SubNegotiation { option: 70, payload: vec![IAC, IAC] }
        );
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn truncated_inputs_return_none_and_consume_nothing() {
        assert_eq!(parse_message(&[IAC]), None);
        assert_eq!(parse_message(&[IAC, WILL]), None);
        assert_eq!(parse_message(&[IAC, SB, 1, 0x41, 0x42]), None);
    }

    #[test]
    fn incremental_feed_matches_whole_buffer_feed() {
        let whole = [IAC, SB, 201, b'a', b'b', IAC, SE, b'x', b'y', IAC, WILL, 3];
        let mut offset = 0;
        let mut whole_msgs = Vec::new();
        while let Some((msg, n)) = parse_message(&whole[offset..]) {
            whole_msgs.push(msg);
            offset += n;
        }

        // Simulate a byte-at-a-time feed into a growing buffer.
        let mut acc: Vec<u8> = Vec::new();
        let mut fed_msgs = Vec::new();
        for &b in &whole {
            acc.push(b);
            loop {
                match parse_message(&acc) {
                    Some((msg, n)) => {
                        fed_msgs.push(msg);
                        acc.drain(..n);
                    }
                    None => break,
                }
            }
        }

        assert_eq!(whole_msgs, fed_msgs);
        assert_eq!(acc, whole[offset..]);
    }

    #[test]
    fn round_trip_negotiation() {
        let msg = TelnetMessage::Negotiation { verb: DO, option: 31 };
        let bytes = serialize_message(&msg);
        let (parsed, consumed) = parse_message(&bytes).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn round_trip_subnegotiation_without_embedded_iac() {
        let msg = TelnetMessage::SubNegotiation { option: GMCP_FOR_TEST, payload: b"Core.Hello".to_vec() };
        let bytes = serialize_message(&msg);
        let (parsed, consumed) = parse_message(&bytes).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(consumed, bytes.len());
    }

    const GMCP_FOR_TEST: u8 = 201;

    #[test]
    fn unsupported_verb_byte_mix() {
        // DONT with truncation
        assert_eq!(parse_message(&[IAC, DONT]), None);
        assert_eq!(parse_message(&[IAC, WONT]), None);
    }
}
