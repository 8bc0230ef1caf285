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

//! Telnet protocol engine for the gateway: a byte-level parser for the
//! interleaved TELNET data/control stream ([`message`]), a per-option
//! negotiation state machine with a bounded handshake ([`option`],
//! [`engine`]), and a [`tokio_util::codec`] pair ([`codec`]) composing the two
//! for use with `Framed`.
//!
//! The design is intentionally a single data-driven state table keyed by
//! option code rather than one type per option: every option shares the same
//! WILL/WONT/DO/DONT dispatch, and option-specific behaviour is a handful of
//! small functions (`enable_local`, `enable_remote`, and the sub-negotiation
//! parsers) rather than a trait object per option.
#![warn(missing_docs, future_incompatible, rust_2018_idioms)]

mod capabilities;
mod codec;
mod constants;
mod engine;
mod error;
mod event;
mod message;
mod option;

pub use capabilities::{Capabilities, ColorDepth, Protocol};
pub use codec::TelnetCodec;
pub use constants::{
    DO, DONT, EOR, GA, GMCP, IAC, LINEMODE, MCCP2, MCCP3, MNES, MSDP, MSSP, MTTS, MXP, NAWS, NOP, SB, SE,
    SGA, SUPPORT_LOCAL, SUPPORT_REMOTE, SUPPORTED, START_LOCAL, START_REMOTE, TELOPT_EOR, WILL, WONT,
};
pub use engine::{DEFAULT_HANDSHAKE_DEADLINE_MS, TelnetEngine};
pub use error::CodecError;
pub use event::{InboundEvent, OutboundEvent};
pub use message::{TelnetMessage, parse_message, serialize_message};
pub use option::{HandshakeTracker, OptionState, Perspective};
