//! `url()` rewriting for inline CSS.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{RewriteContext, Rewritten};

/// `url(...)` with an optional single- or double-quoted argument.
static CSS_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^'")\s]*))\s*\)"#)
        .expect("valid css url regex")
});

/// Rewrite every resolvable `url()` token in `css`.
///
/// Returns the rewritten text and the number of tokens changed. Tokens that
/// do not resolve are copied verbatim.
pub fn rewrite_css_urls(css: &str, ctx: &RewriteContext<'_>) -> (String, usize) {
    let mut changed = 0;
    let output = CSS_URL_RE.replace_all(css, |caps: &Captures| {
        let (quote, reference) = if let Some(m) = caps.name("dq") {
            ("\"", m.as_str())
        } else if let Some(m) = caps.name("sq") {
            ("'", m.as_str())
        } else {
            ("", caps.name("bare").map_or("", |m| m.as_str()))
        };

        match ctx.rewrite_reference(reference) {
            Rewritten::Changed(value) => {
                changed += 1;
                format!("url({quote}{value}{quote})")
            }
            Rewritten::Unchanged(_) => caps[0].to_string(),
        }
    });
    (output.into_owned(), changed)
}
