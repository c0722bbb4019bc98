//! Configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Listener and request lifecycle settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Forwarding behaviour
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Basic credentials guarding `/proxy`
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Deadline for one upstream exchange (connect, headers and body read)
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Graceful shutdown timeout (wait for in-flight requests)
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// Max inbound request body size (bytes)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout: default_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Forwarding configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyConfig {
    /// Ceiling on captured upstream response bytes
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,

    /// Content type reported when upstream sends none
    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    /// Relay the upstream status instead of always answering 200
    #[serde(default)]
    pub forward_upstream_status: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            max_response_bytes: default_max_response_bytes(),
            default_content_type: default_content_type(),
            forward_upstream_status: false,
        }
    }
}

/// Basic authentication configuration
///
/// Both values are usually injected through `AUTH_USERNAME` and
/// `AUTH_PASSWORD`; the validator rejects a config where either is missing.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Expected username
    #[serde(default)]
    pub username: Option<String>,

    /// Expected password
    #[serde(default)]
    pub password: Option<String>,

    /// Realm advertised in the `WWW-Authenticate` challenge
    #[serde(default = "default_realm")]
    pub realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            realm: default_realm(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("realm", &self.realm)
            .finish()
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_timeout() -> Duration {
    Duration::from_millis(5000)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10 MB
}

fn default_max_response_bytes() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

fn default_realm() -> String {
    "Secure Area".to_string()
}
