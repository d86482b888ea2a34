//! API middleware and request extractors

pub mod client_ip;
pub mod logging;
pub mod metrics;
pub mod security;
pub mod user_auth;

pub use client_ip::ClientIp;
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use security::security_headers_middleware;
pub use user_auth::{AuthUser, OptionalUser, RequireUser};
