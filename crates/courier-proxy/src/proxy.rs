//! The forwarding pipeline: authenticate, validate, capture body, forward

use crate::client::{Forward, ForwardRequest, HttpForwarder, UpstreamReply};
use crate::outcome::{ProxyOutcome, ResponseWriter};
use crate::target::ForwardTarget;
use bytes::Bytes;
use courier_auth::BasicAuth;
use courier_config::Config;
use courier_core::{Body, Error, Result};
use http::{Request, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::fmt;
use std::sync::Arc;

/// Authenticated forwarding proxy
#[derive(Clone)]
pub struct ForwardProxy {
    auth: Arc<BasicAuth>,
    forwarder: Arc<dyn Forward>,
    writer: ResponseWriter,
    max_body_size: usize,
}

impl fmt::Debug for ForwardProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardProxy")
            .field("auth", &self.auth)
            .field("writer", &self.writer)
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}

impl ForwardProxy {
    /// Create a proxy around an arbitrary forwarder
    pub fn new(
        auth: BasicAuth,
        forwarder: Arc<dyn Forward>,
        writer: ResponseWriter,
        max_body_size: usize,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            forwarder,
            writer,
            max_body_size,
        }
    }

    /// Create a proxy backed by [`HttpForwarder`]
    pub fn from_config(config: &Config) -> Result<Self> {
        let auth = BasicAuth::from_config(&config.auth)?;
        let forwarder = Arc::new(HttpForwarder::from_config(config)?);

        Ok(Self::new(
            auth,
            forwarder,
            ResponseWriter::from_config(config),
            config.gateway.max_body_size,
        ))
    }

    /// Run one request through the pipeline
    pub async fn handle<B>(&self, req: Request<B>) -> ProxyOutcome
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match self.relay(req).await {
            Ok(reply) => ProxyOutcome::Success(reply),
            Err(e) => e.into(),
        }
    }

    /// Render an outcome as a response
    pub fn respond(&self, outcome: ProxyOutcome) -> Result<Response<Body>> {
        self.writer.write(outcome)
    }

    async fn relay<B>(&self, req: Request<B>) -> Result<UpstreamReply>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        // Both checks run before a single body byte is read.
        self.auth.authenticate(req.headers())?;
        let target = ForwardTarget::from_headers(req.headers())?;

        let (parts, body) = req.into_parts();
        let body = self.read_body(body).await?;

        tracing::debug!(
            host = target.url().host_str().unwrap_or_default(),
            method = %parts.method,
            body_bytes = body.len(),
            "Forwarding request"
        );

        self.forwarder
            .forward(ForwardRequest::new(parts.method, target, body))
            .await
    }

    async fn read_body<B>(&self, body: B) -> Result<Bytes>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let collected = Limited::new(body, self.max_body_size)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    Error::PayloadTooLarge {
                        limit: self.max_body_size,
                    }
                } else {
                    Error::InvalidRequest(format!("Failed to read request body: {e}"))
                }
            })?;

        Ok(collected.to_bytes())
    }
}
