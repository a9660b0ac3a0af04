//! Tunable knobs shared by all transports.

use std::time::Duration;

/// Construction-time settings for servers and clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// A connection that stays silent this long is dropped.
    pub read_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
        }
    }
}
