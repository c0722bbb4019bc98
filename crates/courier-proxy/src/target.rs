//! Forwarding target extraction

use courier_core::{Error, Result};
use http::HeaderMap;
use std::fmt;
use url::Url;

/// Header naming the URL the request is relayed to
pub const TARGET_URL_HEADER: &str = "target-url";

/// A validated absolute URL taken from the `Target-URL` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget(Url);

impl ForwardTarget {
    /// Parse an absolute URL
    pub fn parse(raw: &str) -> Result<Self> {
        Url::parse(raw.trim())
            .map(Self)
            .map_err(|e| Error::InvalidTarget(e.to_string()))
    }

    /// Read and validate the target from request headers
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let value = headers.get(TARGET_URL_HEADER).ok_or(Error::MissingTarget)?;

        let raw = value
            .to_str()
            .map_err(|_| Error::InvalidTarget("header value is not visible ASCII".to_string()))?;

        Self::parse(raw)
    }

    /// The parsed URL
    pub fn url(&self) -> &Url {
        &self.0
    }

    /// The URL as a string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ForwardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
