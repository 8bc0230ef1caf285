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

//! [`TelnetCodec`] composes the pure byte parser in [`crate::message`] with
//! `tokio_util::codec::{Decoder, Encoder}` so a connection can be driven as
//! `Framed<TcpStream, TelnetCodec>`.

use crate::error::CodecError;
use crate::message::{TelnetMessage, parse_message, serialize_message};
use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Frames a byte stream into [`TelnetMessage`]s and back. Stateless beyond the
/// buffering `tokio_util::codec::Framed` already does for us; all protocol state
/// (option table, handshake tracker, capabilities) lives in
/// [`crate::engine::TelnetEngine`], not here.
#[derive(Debug, Default)]
pub struct TelnetCodec;

impl TelnetCodec {
    /// A fresh codec instance.
    pub fn new() -> Self {
        TelnetCodec
    }
}

impl Decoder for TelnetCodec {
    type Item = TelnetMessage;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match parse_message(src) {
            Some((msg, consumed)) => {
                src.advance(consumed);
                Ok(Some(msg))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<TelnetMessage> for TelnetCodec {
    type Error = CodecError;

    fn encode(&mut self, item: TelnetMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&serialize_message(&item));
        Ok(())
    }
}
