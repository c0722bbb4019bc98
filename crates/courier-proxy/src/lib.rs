//! # Courier Proxy
//!
//! The forwarding pipeline behind `/proxy`:
//! - Basic credential check
//! - `Target-URL` validation
//! - Outbound dispatch under a single deadline
//! - Bounded, incremental capture of the upstream body
//! - Outcome to response mapping

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod client;
pub mod outcome;
pub mod proxy;
pub mod reader;
pub mod target;

pub use client::{Forward, ForwardRequest, HttpForwarder, UpstreamReply};
pub use outcome::{ProxyOutcome, ResponseWriter};
pub use proxy::ForwardProxy;
pub use reader::{read_bounded, CapturedBody};
pub use target::{ForwardTarget, TARGET_URL_HEADER};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{Forward, ForwardRequest, HttpForwarder, UpstreamReply};
    pub use crate::outcome::{ProxyOutcome, ResponseWriter};
    pub use crate::proxy::ForwardProxy;
    pub use crate::target::ForwardTarget;
}
