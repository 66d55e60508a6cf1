//! Site proxy library.
//!
//! Browse any site through a single origin: targets are embedded in the
//! path under a routing prefix, upstream responses lose their framing
//! restrictions, and HTML/CSS references are rewritten to stay on the proxy.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod rewrite;
pub mod routing;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
