//! Routing subsystem: the mapping between proxy paths and target URLs.
//!
//! # Data Flow
//! ```text
//! Inbound path "/proxy/https%3A%2F%2Fexample.com%2F"
//!     → ProxyPrefix::strip (raw encoded target)
//!     → target.rs (decode, parse, infer scheme)
//!     → TargetUrl
//!
//! Rewritten reference "https://example.com/img.png"
//!     → ProxyPrefix::wrap
//!     → "/proxy/https%3A%2F%2Fexample.com%2Fimg.png"
//! ```

pub mod target;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

pub use target::{resolve_target, TargetUrl};

/// Characters escaped when embedding a URL in a path segment.
/// Matches the `encodeURIComponent` unreserved set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a string as a single path component.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// The fixed path prefix every proxied target lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPrefix(String);

impl ProxyPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Proxy-relative form of an absolute URL.
    pub fn wrap(&self, url: &Url) -> String {
        format!("{}{}", self.0, encode_component(url.as_str()))
    }

    /// Raw encoded target following the prefix, if the path carries one.
    /// The bare prefix without its trailing slash yields an empty target.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.0.as_str()).or_else(|| {
            let bare = self.0.strip_suffix('/')?;
            (path == bare).then_some("")
        })
    }

    /// Axum route pattern capturing everything after the prefix.
    pub fn route_pattern(&self) -> String {
        format!("{}{{*target}}", self.0)
    }
}

impl Default for ProxyPrefix {
    fn default() -> Self {
        Self::new("/proxy/")
    }
}
