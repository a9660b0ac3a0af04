//! Endpoint construction settings.

use transport::TransportConfig;

/// Settings fixed when an endpoint is created.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Name announced to the session roster.
    pub username: String,
    /// Socket-layer tuning passed through to the transports.
    pub transport: TransportConfig,
}

impl RelayConfig {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            transport: TransportConfig::default(),
        }
    }

    #[must_use]
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}
