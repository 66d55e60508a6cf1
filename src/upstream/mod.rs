//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyRequest + TargetUrl
//!     → forward.rs (outbound headers, body policy, response deadline)
//!     → client.rs (configured reqwest client: redirects, pooling, connect timeout)
//!     → UpstreamResponse (status, headers, final URL, body stream)
//!     → body.rs (bounded buffering for the rewrite branch)
//! ```

pub mod body;
pub mod client;
pub mod forward;

pub use body::{buffer_with_limit, Buffered};
pub use client::build_client;
pub use forward::{carries_body, BodyStream, Forwarder, ProxyRequest, UpstreamResponse};
