//! HTTP client for relaying requests to the forwarding target

use crate::reader::{read_bounded, CapturedBody};
use crate::target::ForwardTarget;
use async_trait::async_trait;
use bytes::Bytes;
use courier_config::Config;
use courier_core::{Error, Result};
use http::{Method, StatusCode};
use std::time::Duration;

/// One outbound request: target, method and optional body
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Where to send it
    pub target: ForwardTarget,
    /// Inbound method, reused as is
    pub method: Method,
    /// Inbound body; `None` for GET and HEAD
    pub body: Option<Bytes>,
}

impl ForwardRequest {
    /// Build an outbound request, dropping the body for GET and HEAD
    pub fn new(method: Method, target: ForwardTarget, body: Bytes) -> Self {
        let body = if method == Method::GET || method == Method::HEAD {
            None
        } else {
            Some(body)
        };

        Self {
            target,
            method,
            body,
        }
    }
}

/// What came back from the target
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    /// Upstream status code
    pub status: StatusCode,
    /// Upstream `Content-Type`, if any
    pub content_type: Option<String>,
    /// Captured body, possibly truncated
    pub body: CapturedBody,
}

/// Sends a request to its target and captures the reply
#[async_trait]
pub trait Forward: Send + Sync {
    /// Relay one request. Implementations enforce their own deadline and
    /// report it as [`Error::UpstreamTimeout`].
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamReply>;
}

/// reqwest-backed forwarder with a shared deadline and response ceiling
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
    timeout: Duration,
    max_response_bytes: usize,
}

impl HttpForwarder {
    /// Create a forwarder
    pub fn new(timeout: Duration, max_response_bytes: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout,
            max_response_bytes,
        })
    }

    /// Create a forwarder from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.gateway.request_timeout,
            config.proxy.max_response_bytes,
        )
    }

    /// Get the configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the response ceiling
    pub fn max_response_bytes(&self) -> usize {
        self.max_response_bytes
    }

    /// Send and read back, without the deadline
    async fn exchange(&self, request: ForwardRequest) -> Result<UpstreamReply> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::InvalidRequest(format!("Unsupported method: {e}")))?;

        let mut builder = self.client.request(method, request.target.as_str());
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Error::upstream)?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| Error::Upstream(format!("Invalid upstream status: {e}")))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = read_bounded(response.bytes_stream(), self.max_response_bytes)
            .await
            .map_err(Error::upstream)?;

        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            capped = body.is_capped(),
            "Upstream response captured"
        );

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Forward for HttpForwarder {
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamReply> {
        // Send and body read share one deadline. The timer belongs to the
        // timeout future and is dropped with it on every return path, along
        // with any in-flight connection and partially read body.
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::UpstreamTimeout),
        }
    }
}
