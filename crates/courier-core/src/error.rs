//! Error types for Courier

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for Courier
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed inbound request (unreadable body and the like)
    #[error("Invalid HTTP request: {0}")]
    InvalidRequest(String),

    /// The `Target-URL` header was not supplied
    #[error("Target-URL header is missing")]
    MissingTarget,

    /// The `Target-URL` header is not an absolute URL
    #[error("Invalid Target-URL header: {0}")]
    InvalidTarget(String),

    /// Inbound request body exceeded the configured limit
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes
        limit: usize,
    },

    /// Missing or wrong Basic credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Upstream did not answer within the deadline
    #[error("request timed out")]
    UpstreamTimeout,

    /// Any other transport failure talking to the target
    #[error("{0}")]
    Upstream(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP builder error
    #[error("HTTP error: {0}")]
    HttpError(#[from] http::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert error to HTTP status code
    pub fn to_status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::InvalidRequest(_) | Error::MissingTarget | Error::InvalidTarget(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller is at fault (4xx)
    pub fn is_client_error(&self) -> bool {
        self.to_status_code().is_client_error()
    }

    /// Create an upstream error from any error, keeping its source chain
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error,
    {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        Error::Upstream(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(Error::MissingTarget.to_status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::InvalidTarget("relative URL without a base".to_string()).to_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Authentication("bad password".to_string()).to_status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::UpstreamTimeout.to_status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            Error::Upstream("connection refused".to_string()).to_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::PayloadTooLarge { limit: 10 }.to_status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(Error::MissingTarget.is_client_error());
        assert!(!Error::UpstreamTimeout.is_client_error());
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_upstream_keeps_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = Error::upstream(Outer(io));

        let message = err.to_string();
        assert!(message.starts_with("error sending request"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(Error::UpstreamTimeout.to_string(), "request timed out");
        assert_eq!(Error::MissingTarget.to_string(), "Target-URL header is missing");
    }
}
