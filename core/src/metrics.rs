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

//! Metric names and thin recording helpers, kept in one place so the counter
//! and gauge names used across the crate don't drift.

use std::time::Duration;

const CONNECTIONS_LIVE: &str = "mudgate_connections_live";
const CONNECTIONS_ACCEPTED: &str = "mudgate_connections_accepted_total";
const CONNECTIONS_DISCONNECTED: &str = "mudgate_connections_disconnected_total";
const PROTOCOL_ERRORS_RECOVERED: &str = "mudgate_protocol_errors_recovered_total";
const HANDSHAKE_LATENCY: &str = "mudgate_handshake_latency_seconds";

/// Record that a connection was accepted.
pub fn record_connection_accepted() {
    metrics::counter!(CONNECTIONS_ACCEPTED).increment(1);
    metrics::gauge!(CONNECTIONS_LIVE).increment(1.0);
}

/// Record that a connection was torn down.
pub fn record_connection_disconnected() {
    metrics::counter!(CONNECTIONS_DISCONNECTED).increment(1);
    metrics::gauge!(CONNECTIONS_LIVE).decrement(1.0);
}

/// Record a protocol error that was handled locally without tearing the
/// connection down.
pub fn record_protocol_error_recovered() {
    metrics::counter!(PROTOCOL_ERRORS_RECOVERED).increment(1);
}

/// Record how long a connection took to reach `Ready`, whether by explicit
/// answer or by hitting the handshake deadline.
pub fn record_handshake_latency(elapsed: Duration) {
    metrics::histogram!(HANDSHAKE_LATENCY).record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_helpers_do_not_panic_without_an_installed_recorder() {
        record_connection_accepted();
        record_connection_disconnected();
        record_protocol_error_recovered();
        record_handshake_latency(Duration::from_millis(12));
    }
}
