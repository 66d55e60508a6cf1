//! Content rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Buffered HTML body
//!     → html.rs (lol_html pass over the document)
//!         → elements.rs (which attributes of which tags hold URLs)
//!         → css.rs (url() tokens in <style> blocks and style attributes)
//!         → RewriteContext::rewrite_reference (resolve + proxy-wrap)
//!     → injected <base> pointing back through the proxy
//!     → UTF-8 document
//! ```
//!
//! # Design Decisions
//! - Rewriting is best-effort: a reference that does not resolve is kept
//! - Only references that resolve to a URL with a host are wrapped
//! - Script contents are never touched

pub mod css;
pub mod elements;
pub mod html;

use url::Url;

use crate::routing::ProxyPrefix;

pub use html::{rewrite_html, RewriteOutcome};

/// Per-document state: the base all relative references resolve against.
#[derive(Debug, Clone)]
pub struct RewriteContext<'a> {
    base: &'a Url,
    prefix: &'a ProxyPrefix,
}

impl<'a> RewriteContext<'a> {
    pub fn new(base: &'a Url, prefix: &'a ProxyPrefix) -> Self {
        Self { base, prefix }
    }

    /// Resolve `reference` against the base and wrap it in the proxy prefix.
    ///
    /// Returns `None` for empty and fragment-only references and for anything
    /// that does not resolve to a URL with a host (`javascript:`, `data:`, ...).
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let trimmed = reference.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let resolved = self.base.join(trimmed).ok()?;
        if resolved.cannot_be_a_base() || resolved.host_str().map_or(true, str::is_empty) {
            return None;
        }
        Some(self.prefix.wrap(&resolved))
    }

    /// Rewritten value, or the original when it cannot be resolved.
    pub fn rewrite_reference(&self, reference: &str) -> Rewritten {
        match self.resolve(reference) {
            Some(value) => Rewritten::Changed(value),
            None => Rewritten::Unchanged(reference.to_string()),
        }
    }

    /// Proxy-wrapped form of the base itself, used for the injected `<base>`.
    pub fn wrapped_base(&self) -> String {
        self.prefix.wrap(self.base)
    }
}

/// Result of rewriting a single reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewritten {
    Changed(String),
    Unchanged(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::encode_component;

    fn wrapped(url: &str) -> String {
        format!("/proxy/{}", encode_component(url))
    }

    #[test]
    fn relative_reference_resolves_against_base() {
        let base = Url::parse("https://example.com/dir/").unwrap();
        let prefix = ProxyPrefix::default();
        let ctx = RewriteContext::new(&base, &prefix);

        assert_eq!(
            ctx.rewrite_reference("page.html"),
            Rewritten::Changed(wrapped("https://example.com/dir/page.html"))
        );
        assert_eq!(
            ctx.rewrite_reference("/root.css"),
            Rewritten::Changed(wrapped("https://example.com/root.css"))
        );
        assert_eq!(
            ctx.rewrite_reference("//cdn.example.net/lib.js"),
            Rewritten::Changed(wrapped("https://cdn.example.net/lib.js"))
        );
    }

    #[test]
    fn unresolvable_references_are_kept() {
        let base = Url::parse("https://example.com/").unwrap();
        let prefix = ProxyPrefix::default();
        let ctx = RewriteContext::new(&base, &prefix);

        for reference in [
            "javascript:void(0)",
            "data:image/png;base64,AAAA",
            "mailto:someone@example.com",
            "#section",
            "",
            "http://[broken",
        ] {
            assert_eq!(
                ctx.rewrite_reference(reference),
                Rewritten::Unchanged(reference.to_string()),
                "{reference:?} should be kept"
            );
        }
    }

    #[test]
    fn wrapped_base_uses_prefix() {
        let base = Url::parse("https://example.com/a/").unwrap();
        let prefix = ProxyPrefix::new("/p/");
        let ctx = RewriteContext::new(&base, &prefix);
        assert_eq!(ctx.wrapped_base(), "/p/https%3A%2F%2Fexample.com%2Fa%2F");
    }
}
