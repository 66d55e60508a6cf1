//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → pages.rs ("/" and "/healthz")
//!     → proxy.rs (everything under the proxy prefix)
//!     → Send to client
//! ```

pub mod pages;
pub mod proxy;
pub mod request;
pub mod server;

pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
