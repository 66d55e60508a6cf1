//! In-flight request limit.
//!
//! # Responsibilities
//! - Bound the number of requests handled concurrently
//!
//! # Design Decisions
//! - Shed load instead of queueing: no permit means 503 immediately
//! - The permit is held until the handler returns its response head

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::Semaphore;

/// Shared permit pool for in-flight requests.
pub struct InFlightLimit {
    permits: Arc<Semaphore>,
    max: usize,
}

impl InFlightLimit {
    pub fn new(max: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

/// Middleware function rejecting requests beyond the in-flight limit.
pub async fn in_flight_middleware(
    State(limit): State<Arc<InFlightLimit>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limit.permits.clone().try_acquire_owned() {
        Ok(_permit) => next.run(request).await,
        Err(_) => {
            tracing::warn!(max_in_flight = limit.max(), "In-flight limit reached");
            let mut response = Response::new(Body::from("Server busy"));
            *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
            response
        }
    }
}
