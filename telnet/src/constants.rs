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

//! Well-known TELNET command bytes and option codes (RFC 854 plus the
//! MUD-extension options this gateway cares about).

/// Suppress Go Ahead.
pub const SGA: u8 = 3;
/// Terminal Type / MUD Terminal Type Standard.
pub const MTTS: u8 = 24;
/// End Of Record marker option.
pub const TELOPT_EOR: u8 = 25;
/// Negotiate About Window Size.
pub const NAWS: u8 = 31;
/// Line Mode.
pub const LINEMODE: u8 = 34;
/// MUD New-Environ Standard.
pub const MNES: u8 = 39;
/// MUD Server Data Protocol.
pub const MSDP: u8 = 69;
/// MUD Server Status Protocol.
pub const MSSP: u8 = 70;
/// MUD Client Compression Protocol v2.
pub const MCCP2: u8 = 86;
/// MUD Client Compression Protocol v3.
pub const MCCP3: u8 = 87;
/// MUD eXtension Protocol.
pub const MXP: u8 = 91;
/// Generic MUD Communication Protocol.
pub const GMCP: u8 = 201;

/// End Of Record.
pub const EOR: u8 = 239;
/// Subnegotiation End.
pub const SE: u8 = 240;
/// No Operation.
pub const NOP: u8 = 241;
/// Go Ahead.
pub const GA: u8 = 249;
/// Subnegotiation Begin.
pub const SB: u8 = 250;
/// Indicates the sender will enable an option.
pub const WILL: u8 = 251;
/// Indicates the sender will not enable an option.
pub const WONT: u8 = 252;
/// Requests the peer enable an option.
pub const DO: u8 = 253;
/// Requests the peer not enable an option.
pub const DONT: u8 = 254;
/// Interpret As Command: the telnet escape byte.
pub const IAC: u8 = 255;

const LF: u8 = 10;
const CR: u8 = 13;

/// Is this command byte one of the four negotiation verbs?
pub fn is_negotiation_verb(cmd: u8) -> bool {
    matches!(cmd, WILL | WONT | DO | DONT)
}

/// Line terminators accepted when splitting the application data stream into lines.
pub fn is_line_terminator(byte: u8) -> bool {
    byte == LF || byte == CR
}

/// Options this gateway knows how to negotiate at all. Anything else is refused outright.
pub const SUPPORTED: &[u8] = &[SGA, NAWS, MTTS, MXP, MSSP, MCCP2, MCCP3, GMCP, MSDP, LINEMODE, TELOPT_EOR];

/// Options we proactively announce with `IAC WILL` at connection start.
pub const START_LOCAL: &[u8] = &[SGA, MSSP, GMCP, MSDP, TELOPT_EOR];

/// Options we proactively request with `IAC DO` at connection start.
pub const START_REMOTE: &[u8] = &[NAWS, MTTS, LINEMODE];

/// Options we are willing to run ourselves if the peer asks with `DO`.
pub const SUPPORT_LOCAL: &[u8] = START_LOCAL;

/// Options we are willing to let the peer run if it announces with `WILL`.
pub const SUPPORT_REMOTE: &[u8] = &[SGA, NAWS, MTTS, MSSP, GMCP, MSDP, LINEMODE, TELOPT_EOR];

/// Is `code` one of the options this gateway knows at all?
pub fn supports_any(code: u8) -> bool {
    SUPPORTED.contains(&code)
}

/// Is `code` one this gateway is willing to run on its own end?
pub fn supports_local(code: u8) -> bool {
    SUPPORT_LOCAL.contains(&code)
}

/// Is `code` one this gateway is willing to let the peer run?
pub fn supports_remote(code: u8) -> bool {
    SUPPORT_REMOTE.contains(&code)
}
