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

//! The [`Capabilities`] snapshot a connection accumulates as negotiation and
//! sub-negotiation progress, surfaced to the game once the connection reaches
//! [`crate::event::InboundEvent::Ready`].

/// Which wire protocol terminated this connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// RFC 854 TELNET, optionally TLS-wrapped.
    #[default]
    Telnet,
    /// WebSocket message framing, optionally TLS-wrapped.
    WebSocket,
}

/// Colour depth the client has advertised, richest-known as of the last MTTS cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepth {
    /// No colour support advertised.
    #[default]
    None,
    /// 16-colour ANSI.
    Ansi,
    /// 256-colour xterm palette.
    Xterm,
    /// 24-bit true colour.
    TrueColor,
}

/// Everything the gateway knows about a connection's client, built up purely
/// from option negotiation and sub-negotiation payloads. Mutable only by the
/// [`crate::engine::TelnetEngine`] that owns the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Which wire protocol terminated this connection.
    pub protocol: Protocol,
    /// Best known colour depth.
    pub color: ColorDepth,
    /// Client has signalled UTF-8 text.
    pub utf8: bool,
    /// MXP (MUD eXtension Protocol) is enabled.
    pub mxp: bool,
    /// Any out-of-band channel (GMCP or MSDP) is enabled.
    pub oob: bool,
    /// MSDP is enabled.
    pub msdp: bool,
    /// GMCP is enabled.
    pub gmcp: bool,
    /// MSSP is enabled.
    pub mssp: bool,
    /// MTTS/TTYPE has completed at least one cycle.
    pub mtts: bool,
    /// NAWS (window size) is enabled.
    pub naws: bool,
    /// MCCP2 is enabled. Always false: this gateway never accepts MCCP2/MCCP3.
    pub mccp2: bool,
    /// Suppress Go Ahead is enabled. Defaults to true: we offer it proactively.
    pub sga: bool,
    /// Line mode is enabled. Defaults to true: we request it proactively.
    pub linemode: bool,
    /// Client has identified itself as a screen reader.
    pub screen_reader: bool,
    /// Client has identified itself as VT100-compatible.
    pub vt100: bool,
    /// Client supports mouse tracking.
    pub mouse_tracking: bool,
    /// Client supports OSC colour palette queries.
    pub osc_color_palette: bool,
    /// MNES (MUD New-Environ Standard) is enabled.
    pub mnes: bool,
    /// Connection arrived via a known proxy.
    pub proxy: bool,
    /// Client name, if learned from an MTTS/TTYPE cycle.
    pub client_name: Option<String>,
    /// Client version, if the client encoded one in its MTTS string.
    pub client_version: Option<String>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            protocol: Protocol::default(),
            color: ColorDepth::default(),
            utf8: false,
            mxp: false,
            oob: false,
            msdp: false,
            gmcp: false,
            mssp: false,
            mtts: false,
            naws: false,
            mccp2: false,
            sga: true,
            linemode: true,
            screen_reader: false,
            vt100: false,
            mouse_tracking: false,
            osc_color_palette: false,
            mnes: false,
            proxy: false,
            client_name: None,
            client_version: None,
        }
    }
}

impl Capabilities {
    /// A fresh snapshot for a connection speaking `protocol`.
    pub fn for_protocol(protocol: Protocol) -> Self {
        Capabilities { protocol, ..Capabilities::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let caps = Capabilities::default();
        assert!(caps.sga);
        assert!(caps.linemode);
        assert!(!caps.mxp);
        assert_eq!(caps.protocol, Protocol::Telnet);
        assert_eq!(caps.color, ColorDepth::None);
    }
}
