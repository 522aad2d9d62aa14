//! Middleware components for the relay

pub mod cors;
pub mod logging;
pub mod rate_limit;
pub mod security_headers;
