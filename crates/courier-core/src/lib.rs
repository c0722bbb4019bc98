//! # Courier Core
//!
//! Foundational types shared by every crate of the Courier forwarding proxy:
//! - Error type and its mapping onto HTTP status codes
//! - Response builder and canned error bodies
//! - Per-request context used for logging

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use request::{RequestContext, REQUEST_ID_HEADER};
pub use response::{Body, ErrorBody, ResponseBuilder};

// Re-export commonly used HTTP types
pub use bytes::Bytes;
pub use http::{Method, Request, Response, StatusCode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::request::RequestContext;
    pub use crate::response::{responses, Body, ErrorBody, ResponseBuilder};
}
