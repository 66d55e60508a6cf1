//! Target URL resolution.
//!
//! # Responsibilities
//! - Percent-decode the path-embedded target
//! - Parse it as an absolute URL, inferring `https://` when no scheme is given
//! - Merge a query string carried by the inbound proxy URL
//!
//! # Design Decisions
//! - No scheme allowlist: `ftp://host/x` resolves as-is
//! - A URL without a host is never a valid target
//! - Exactly one retry (with `https://` prepended), no partial results

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::ProxyError;

const INFERRED_SCHEME: &str = "https://";

/// An absolute URL that always carries a scheme and a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl(Url);

impl TargetUrl {
    /// Wrap an already-parsed URL, rejecting host-less ones.
    pub fn from_url(url: Url) -> Option<Self> {
        if url.host_str().map_or(true, str::is_empty) {
            return None;
        }
        Some(Self(url))
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_url(self) -> Url {
        self.0
    }

    /// Host with explicit port, suitable for a `Host` header.
    pub fn authority(&self) -> String {
        let host = self.0.host_str().unwrap_or_default();
        match self.0.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// Serialized origin (`scheme://host[:port]`), suitable for an `Origin` header.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.0.scheme(), self.authority())
    }

    /// Append a query string received on the inbound proxy URL.
    pub fn with_inbound_query(mut self, query: Option<&str>) -> Self {
        let Some(extra) = query.filter(|q| !q.is_empty()) else {
            return self;
        };
        let merged = match self.0.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{extra}"),
            _ => extra.to_string(),
        };
        self.0.set_query(Some(&merged));
        self
    }
}

impl std::fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Resolve a percent-encoded, path-embedded target into an absolute URL.
pub fn resolve_target(encoded: &str) -> Result<TargetUrl, ProxyError> {
    let decoded = percent_decode_str(encoded)
        .decode_utf8()
        .map_err(|_| ProxyError::Resolution(encoded.to_string()))?;

    parse_absolute(&decoded)
        .or_else(|| parse_absolute(&format!("{INFERRED_SCHEME}{decoded}")))
        .ok_or_else(|| ProxyError::Resolution(decoded.into_owned()))
}

fn parse_absolute(candidate: &str) -> Option<TargetUrl> {
    Url::parse(candidate).ok().and_then(TargetUrl::from_url)
}
