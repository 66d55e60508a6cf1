//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → limits.rs (in-flight permit or 503)
//!
//! Outbound request:
//!     → headers.rs (strip hop-by-hop)
//!     → Pass to upstream client
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop, relax framing restrictions)
//!     → Pass to content branch (rewrite or stream)
//! ```

pub mod headers;
pub mod limits;

pub use headers::{sanitize_response_headers, strip_hop_by_hop};
pub use limits::{in_flight_middleware, InFlightLimit};
