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

//! Error type surfaced by [`crate::codec::TelnetCodec`]. The byte parser itself
//! never errors (see [`crate::message::parse_message`]); this type exists purely
//! because `tokio_util::codec::{Decoder, Encoder}` require one, and because the
//! underlying I/O can fail independently of framing.

use std::io;

/// Everything that can go wrong encoding or decoding a telnet frame.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The underlying transport read or write failed.
    #[error("telnet transport I/O error: {0}")]
    Io(#[from] io::Error),
}
