//! Mapping forwarding outcomes onto caller-facing responses

use crate::client::UpstreamReply;
use courier_config::Config;
use courier_core::response::responses;
use courier_core::{Body, Error, ErrorBody, ResponseBuilder, Result};
use http::{header, Response, StatusCode};

/// Result of one pass through the forwarding pipeline
#[derive(Debug)]
pub enum ProxyOutcome {
    /// Upstream answered within the deadline
    Success(UpstreamReply),
    /// Missing or wrong Basic credentials
    Unauthenticated,
    /// The caller sent something unusable
    ClientError {
        /// Status reported to the caller (400 or 413)
        status: StatusCode,
        /// `error` field of the JSON body
        message: String,
        /// Optional `details` field
        details: Option<String>,
    },
    /// Upstream did not complete within the deadline
    UpstreamTimeout,
    /// Any other failure reaching or reading from upstream
    UpstreamError(String),
}

impl ProxyOutcome {
    /// Status code this outcome is reported with, before status pass-through
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyOutcome::Success(_) => StatusCode::OK,
            ProxyOutcome::Unauthenticated => StatusCode::UNAUTHORIZED,
            ProxyOutcome::ClientError { status, .. } => *status,
            ProxyOutcome::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyOutcome::UpstreamError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_error(error: &Error, message: &str, details: Option<String>) -> Self {
        ProxyOutcome::ClientError {
            status: error.to_status_code(),
            message: message.to_string(),
            details,
        }
    }
}

impl From<Error> for ProxyOutcome {
    fn from(error: Error) -> Self {
        match error {
            Error::MissingTarget => {
                let message = error.to_string();
                Self::client_error(&error, &message, None)
            }
            Error::InvalidTarget(ref details) => {
                let details = details.clone();
                Self::client_error(&error, "Invalid Target-URL header", Some(details))
            }
            Error::PayloadTooLarge { .. } => {
                let details = error.to_string();
                Self::client_error(&error, "Request body too large", Some(details))
            }
            Error::InvalidRequest(ref details) => {
                let details = details.clone();
                Self::client_error(&error, "Invalid request", Some(details))
            }
            Error::Authentication(_) => ProxyOutcome::Unauthenticated,
            Error::UpstreamTimeout => ProxyOutcome::UpstreamTimeout,
            Error::Upstream(message) => ProxyOutcome::UpstreamError(message),
            other => ProxyOutcome::UpstreamError(other.to_string()),
        }
    }
}

/// Writes a [`ProxyOutcome`] as an HTTP response
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    realm: String,
    default_content_type: String,
    forward_upstream_status: bool,
}

impl ResponseWriter {
    /// Create a writer
    pub fn new(
        realm: impl Into<String>,
        default_content_type: impl Into<String>,
        forward_upstream_status: bool,
    ) -> Self {
        Self {
            realm: realm.into(),
            default_content_type: default_content_type.into(),
            forward_upstream_status,
        }
    }

    /// Create a writer from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.auth.realm.clone(),
            config.proxy.default_content_type.clone(),
            config.proxy.forward_upstream_status,
        )
    }

    /// Render the outcome
    pub fn write(&self, outcome: ProxyOutcome) -> Result<Response<Body>> {
        match outcome {
            ProxyOutcome::Success(reply) => {
                let status = if self.forward_upstream_status {
                    reply.status
                } else {
                    StatusCode::OK
                };
                let content_type = reply
                    .content_type
                    .unwrap_or_else(|| self.default_content_type.clone());

                ResponseBuilder::new(status)
                    .header(header::CONTENT_TYPE, content_type)
                    .bytes(reply.body.into_bytes())
            }
            ProxyOutcome::Unauthenticated => responses::unauthorized(&self.realm),
            ProxyOutcome::ClientError {
                status,
                message,
                details,
            } => {
                let mut body = ErrorBody::new(message);
                body.details = details;
                responses::json_error(status, &body)
            }
            ProxyOutcome::UpstreamTimeout => responses::json_error(
                StatusCode::GATEWAY_TIMEOUT,
                &ErrorBody::new(Error::UpstreamTimeout.to_string()),
            ),
            ProxyOutcome::UpstreamError(message) => responses::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorBody::new("Proxy error").with_details(message),
            ),
        }
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
