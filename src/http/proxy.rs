//! The proxy request pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request "/proxy/{encoded}"
//!     → routing (resolve TargetUrl, merge inbound query)
//!     → upstream::Forwarder (fetch, follow bounded redirects)
//!     → security::headers (hop-by-hop, framing restrictions)
//!     → HTML within bounds?  yes → buffer → rewrite::rewrite_html → client
//!                            no  → stream body untouched       → client
//! ```
//!
//! # Design Decisions
//! - Resolution faults log at debug, upstream faults at warn
//! - A rewriter failure sends the original bytes rather than an error
//! - Dropping the response body drops the upstream stream with it
//! - Buffering HTML is bounded by the same deadline as the response head

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    response::{IntoResponse, Response},
};

use super::request::request_id;
use super::server::AppState;
use crate::error::{ProxyError, UpstreamFailure};
use crate::observability::metrics::{self, Outcome};
use crate::rewrite::{rewrite_html, RewriteContext};
use crate::routing::resolve_target;
use crate::security::{sanitize_response_headers, strip_hop_by_hop};
use crate::upstream::{buffer_with_limit, Buffered, BodyStream, ProxyRequest, UpstreamResponse};

/// Handler for every method under the proxy prefix.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let (parts, body) = request.into_parts();

    let raw_target = state.prefix.strip(parts.uri.path()).unwrap_or_default();
    let target = match resolve_target(raw_target) {
        Ok(target) => target.with_inbound_query(parts.uri.query()),
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Target resolution failed");
            return fault(&method, e, Outcome::ResolutionFault, start);
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        target = %target,
        "Proxying request"
    );

    let proxy_request = ProxyRequest::new(method.clone(), parts.headers, Some(body));
    let upstream = match state.forwarder.forward(proxy_request, &target).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::warn!(request_id = %request_id, target = %target, error = %e, "Upstream request failed");
            if let Some(kind) = e.upstream_failure() {
                metrics::record_upstream_failure(kind);
            }
            return fault(&method, e, Outcome::UpstreamFault, start);
        }
    };

    let UpstreamResponse {
        status,
        mut headers,
        final_url,
        body,
    } = upstream;
    strip_hop_by_hop(&mut headers);
    sanitize_response_headers(&mut headers);

    if !should_rewrite(&method, status, &headers) {
        return relay(&method, status, headers, body, Outcome::Streamed, start);
    }

    let limit = state.rewrite.max_html_bytes;
    if declared_length(&headers).is_some_and(|len| len > limit) {
        tracing::debug!(request_id = %request_id, limit, "HTML exceeds rewrite buffer; streaming");
        return relay(&method, status, headers, body, Outcome::Oversized, start);
    }

    // Nothing reaches the client until buffering ends, so it shares the
    // response deadline.
    let deadline = state.forwarder.response_timeout();
    let bytes = match tokio::time::timeout(deadline, buffer_with_limit(body, limit)).await {
        Ok(Ok(Buffered::Complete(bytes))) => bytes,
        Ok(Ok(Buffered::Overflow(rest))) => {
            tracing::debug!(request_id = %request_id, limit, "HTML exceeds rewrite buffer; streaming");
            return relay(&method, status, headers, rest, Outcome::Oversized, start);
        }
        Ok(Err(e)) => {
            tracing::warn!(request_id = %request_id, target = %target, error = %e, "Upstream body failed");
            metrics::record_upstream_failure(UpstreamFailure::Body);
            return fault(&method, ProxyError::upstream(e), Outcome::UpstreamFault, start);
        }
        Err(_) => {
            tracing::warn!(request_id = %request_id, target = %target, "Upstream body stalled");
            metrics::record_upstream_failure(UpstreamFailure::Timeout);
            let e = ProxyError::UpstreamTimeout(deadline.as_secs());
            return fault(&method, e, Outcome::UpstreamFault, start);
        }
    };

    let base = if state.rewrite.base_from_final_url {
        &final_url
    } else {
        target.as_url()
    };
    let ctx = RewriteContext::new(base, &state.prefix);
    let document = String::from_utf8_lossy(&bytes);

    match rewrite_html(&document, &ctx, state.rewrite.rewrite_style_attributes) {
        Ok(outcome) => {
            metrics::record_rewritten("attribute", outcome.attributes);
            metrics::record_rewritten("css", outcome.css_urls);
            headers.remove(CONTENT_LENGTH);
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            metrics::record_request(method.as_str(), status.as_u16(), Outcome::Rewritten, start);
            build_response(status, headers, Body::from(outcome.html))
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, base = %base, error = %e, "HTML rewrite failed; sending original");
            metrics::record_request(method.as_str(), status.as_u16(), Outcome::Streamed, start);
            build_response(status, headers, Body::from(bytes))
        }
    }
}

/// Whether a response takes the buffered rewrite branch.
fn should_rewrite(method: &Method, status: StatusCode, headers: &HeaderMap) -> bool {
    *method != Method::HEAD
        && !is_bodiless(status)
        && is_html(headers)
        // Only reached if the client could not decode it.
        && !headers.contains_key(CONTENT_ENCODING)
}

fn is_bodiless(status: StatusCode) -> bool {
    status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}

/// True for `text/html` and `application/xhtml+xml`, ignoring parameters.
pub fn is_html(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("text/html") || essence.eq_ignore_ascii_case("application/xhtml+xml")
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn relay(
    method: &Method,
    status: StatusCode,
    headers: HeaderMap,
    body: BodyStream,
    outcome: Outcome,
    start: Instant,
) -> Response {
    metrics::record_request(method.as_str(), status.as_u16(), outcome, start);
    build_response(status, headers, Body::from_stream(body))
}

fn fault(method: &Method, error: ProxyError, outcome: Outcome, start: Instant) -> Response {
    metrics::record_request(method.as_str(), error.status().as_u16(), outcome, start);
    error.into_response()
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
