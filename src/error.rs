//! Proxy error taxonomy and its mapping to client responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Why an upstream exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// Connection could not be established (refused, DNS, TLS).
    Connect,
    /// The upstream did not answer within the configured deadline.
    Timeout,
    /// More redirects than the configured bound.
    Redirect,
    /// The response body failed while it was being buffered.
    Body,
    Other,
}

impl UpstreamFailure {
    /// Metric/log label for this failure kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamFailure::Connect => "connect",
            UpstreamFailure::Timeout => "timeout",
            UpstreamFailure::Redirect => "redirect",
            UpstreamFailure::Body => "body",
            UpstreamFailure::Other => "other",
        }
    }

    /// Classify a client error.
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            UpstreamFailure::Timeout
        } else if error.is_redirect() {
            UpstreamFailure::Redirect
        } else if error.is_connect() {
            UpstreamFailure::Connect
        } else if error.is_body() || error.is_decode() {
            UpstreamFailure::Body
        } else {
            UpstreamFailure::Other
        }
    }
}

impl std::fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the proxy pipeline.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The path-embedded target could not be turned into an absolute URL.
    #[error("cannot resolve target `{0}`")]
    Resolution(String),

    /// The upstream fetch failed.
    #[error("upstream {kind} failure: {source}")]
    Upstream {
        kind: UpstreamFailure,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream did not produce a response head in time.
    #[error("upstream did not respond within {0} seconds")]
    UpstreamTimeout(u64),

    /// The inbound request body could not be read within the size limit.
    #[error("request body unreadable or larger than {0} bytes")]
    RequestBody(usize),

    /// The upstream client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ProxyError {
    /// Wrap a client error, classifying it.
    pub fn upstream(source: reqwest::Error) -> Self {
        ProxyError::Upstream {
            kind: UpstreamFailure::classify(&source),
            source,
        }
    }

    /// Status code sent to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Resolution(_) => StatusCode::BAD_REQUEST,
            ProxyError::RequestBody(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream { .. } | ProxyError::UpstreamTimeout(_) => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::ClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Upstream failure kind, if this is an upstream fault.
    pub fn upstream_failure(&self) -> Option<UpstreamFailure> {
        match self {
            ProxyError::Upstream { kind, .. } => Some(*kind),
            ProxyError::UpstreamTimeout(_) => Some(UpstreamFailure::Timeout),
            _ => None,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match self {
            ProxyError::Resolution(_) => "Invalid target URL",
            ProxyError::RequestBody(_) => "Request body too large",
            ProxyError::Upstream { .. } | ProxyError::UpstreamTimeout(_) => {
                "Upstream request failed"
            }
            ProxyError::ClientBuild(_) => "Proxy misconfigured",
        };
        (self.status(), body).into_response()
    }
}
