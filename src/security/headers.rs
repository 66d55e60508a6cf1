//! Header manipulation.
//!
//! # Responsibilities
//! - Relax upstream response headers that block framing
//! - Default `Accept-Ranges` so streamed media stays seekable
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - Pure functions over `HeaderMap`, no I/O
//! - CSP directives other than `frame-ancestors` are kept, so a policy
//!   can still restrict inline scripts
//! - `Access-Control-*` headers are never touched here; CORS is the
//!   router middleware's job

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_RANGES, CONNECTION, CONTENT_SECURITY_POLICY, TE,
    TRAILER, TRANSFER_ENCODING, UPGRADE, X_FRAME_OPTIONS,
};

const FRAME_ANCESTORS: &str = "frame-ancestors";

/// Headers meaningful only for a single transport hop.
const HOP_BY_HOP: &[&str] = &[
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
];

/// Sanitize an upstream response header set in place.
pub fn sanitize_response_headers(headers: &mut HeaderMap) {
    headers.remove(X_FRAME_OPTIONS);

    let policies: Vec<HeaderValue> = headers
        .get_all(CONTENT_SECURITY_POLICY)
        .iter()
        .cloned()
        .collect();
    if !policies.is_empty() {
        headers.remove(CONTENT_SECURITY_POLICY);
        for policy in policies {
            if let Some(filtered) = strip_frame_ancestors(&policy) {
                headers.append(CONTENT_SECURITY_POLICY, filtered);
            }
        }
    }

    if !headers.contains_key(ACCEPT_RANGES) {
        headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    }
}

/// Drop every `frame-ancestors` directive from one CSP value.
///
/// Works on raw bytes so values carrying obs-text are filtered too.
/// Returns `None` when no directive remains.
fn strip_frame_ancestors(policy: &HeaderValue) -> Option<HeaderValue> {
    let kept: Vec<&[u8]> = policy
        .as_bytes()
        .split(|byte| *byte == b';')
        .map(<[u8]>::trim_ascii)
        .filter(|directive| !directive.is_empty() && !is_frame_ancestors(directive))
        .collect();

    if kept.is_empty() {
        return None;
    }
    HeaderValue::from_bytes(&kept.join(&b"; "[..])).ok()
}

fn is_frame_ancestors(directive: &[u8]) -> bool {
    directive
        .get(..FRAME_ANCESTORS.len())
        .is_some_and(|name| name.eq_ignore_ascii_case(FRAME_ANCESTORS.as_bytes()))
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }

    for name in [CONNECTION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE] {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}
