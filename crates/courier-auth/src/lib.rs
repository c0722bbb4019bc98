//! Authentication for the Courier forwarding proxy

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod basic;

pub use basic::{BasicAuth, Credentials};
