//! Request context and utilities

use http::Method;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Header carrying the request ID back to the caller
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Context attached to each request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request ID for tracing
    pub request_id: String,

    /// Inbound method
    pub method: Method,

    /// Inbound path
    pub path: String,

    started: Instant,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path: path.into(),
            started: Instant::now(),
        }
    }

    /// Time since the request was accepted
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
