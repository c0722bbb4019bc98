//! Configuration builder

use crate::types::{Config, ProxyConfig};
use std::net::SocketAddr;
use std::time::Duration;

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set proxy configuration
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = proxy;
        self
    }

    /// Set listen address
    pub fn listen(mut self, addr: SocketAddr) -> Self {
        self.config.gateway.listen = addr;
        self
    }

    /// Set the upstream deadline
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.gateway.request_timeout = timeout;
        self
    }

    /// Set the response byte ceiling
    pub fn max_response_bytes(mut self, limit: usize) -> Self {
        self.config.proxy.max_response_bytes = limit;
        self
    }

    /// Set the expected Basic credentials
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.auth.username = Some(username.into());
        self.config.auth.password = Some(password.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> courier_core::Result<Config> {
        crate::validator::validate_config(&self.config)?;
        Ok(self.config)
    }
}
