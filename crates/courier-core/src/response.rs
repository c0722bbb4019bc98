//! Response builder and utilities

use crate::Result;
use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use serde::{Deserialize, Serialize};

/// Body type alias
pub type Body = Full<Bytes>;

/// JSON error body returned for every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short error label
    pub error: String,

    /// Optional detail, e.g. the transport error text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    /// Error body without details
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Attach a detail string
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Response builder for convenient response construction
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(header::HeaderName, String)>,
}

impl ResponseBuilder {
    /// Create a new response builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    /// Set a header
    pub fn header(mut self, name: header::HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Build response with empty body
    pub fn build(self) -> Result<Response<Body>> {
        self.bytes(Bytes::new())
    }

    /// Build response with a raw body; headers are taken as set
    pub fn bytes(self, body: impl Into<Bytes>) -> Result<Response<Body>> {
        let mut response = Response::builder().status(self.status);

        for (name, value) in self.headers {
            response = response.header(name, value);
        }

        Ok(response.body(Full::new(body.into()))?)
    }

    /// Build response with text body
    pub fn text(self, body: impl Into<String>) -> Result<Response<Body>> {
        self.header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .bytes(body.into())
    }

    /// Build response with JSON body
    pub fn json_body<T: Serialize>(self, body: &T) -> Result<Response<Body>> {
        let json = serde_json::to_vec(body)?;

        self.header(header::CONTENT_TYPE, "application/json")
            .bytes(json)
    }
}

/// Convenience functions for common responses
pub mod responses {
    use super::*;

    /// 200 OK
    pub fn ok() -> ResponseBuilder {
        ResponseBuilder::new(StatusCode::OK)
    }

    /// JSON error response with the given status
    pub fn json_error(status: StatusCode, body: &ErrorBody) -> Result<Response<Body>> {
        ResponseBuilder::new(status).json_body(body)
    }

    /// 401 Unauthorized with a Basic challenge
    pub fn unauthorized(realm: &str) -> Result<Response<Body>> {
        ResponseBuilder::new(StatusCode::UNAUTHORIZED)
            .header(
                header::WWW_AUTHENTICATE,
                format!("Basic realm=\"{}\"", realm.replace('"', "")),
            )
            .text("Unauthorized")
    }

    /// 404 Not Found
    pub fn not_found() -> Result<Response<Body>> {
        json_error(StatusCode::NOT_FOUND, &ErrorBody::new("Not Found"))
    }

    /// 500 Internal Server Error
    pub fn internal_error(message: impl Into<String>) -> Result<Response<Body>> {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorBody::new("Internal error").with_details(message),
        )
    }
}
