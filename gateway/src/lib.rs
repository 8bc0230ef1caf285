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

//! Process-level wiring for a mudgate gateway: [`Link`] holds named bound
//! addresses, TLS contexts, and listeners; each [`Listener`] accepts sockets
//! and hands them to a [`mudgate_core::ConnectionQueue`].
//!
//! A host game builds a `Link`, registers addresses/TLS contexts/listeners
//! against it, calls [`Link::start_listening`], and then drives its own loop
//! against the `ConnectionQueue` it gets back.

#![warn(missing_docs, future_incompatible, rust_2018_idioms)]

pub mod link;
pub mod listener;

pub use link::Link;
pub use listener::Listener;
