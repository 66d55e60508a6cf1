//! HTML document rewriting.
//!
//! Runs a single lol_html pass over the buffered document:
//! - URL attributes from [`URL_ATTRIBUTES`] are resolved and proxy-wrapped
//! - `url()` tokens in `<style>` blocks (and optionally `style` attributes)
//!   are rewritten by [`rewrite_css_urls`]
//! - a `<base>` pointing back through the proxy opens `<head>`, so it
//!   precedes every URL-bearing child and survives an omitted `</head>`

use std::cell::{Cell, RefCell};

use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{element, end, rewrite_str, text, RewriteStrSettings};

use super::css::rewrite_css_urls;
use super::elements::URL_ATTRIBUTES;
use super::{RewriteContext, Rewritten};

/// A rewritten document and what changed in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub html: String,
    /// URL attributes replaced.
    pub attributes: usize,
    /// CSS `url()` tokens replaced.
    pub css_urls: usize,
}

/// Rewrite `html` so every resolvable reference routes through the proxy.
pub fn rewrite_html(
    html: &str,
    ctx: &RewriteContext<'_>,
    style_attributes: bool,
) -> Result<RewriteOutcome, RewritingError> {
    let base_tag = format!(r#"<base href="{}">"#, ctx.wrapped_base());
    let base_injected = Cell::new(false);
    let attributes = Cell::new(0usize);
    let css_urls = Cell::new(0usize);
    let style_buffer = RefCell::new(String::new());

    let base_tag = base_tag.as_str();
    let base_injected = &base_injected;
    let attributes = &attributes;
    let css_urls = &css_urls;
    let style_buffer = &style_buffer;

    let mut element_content_handlers = Vec::with_capacity(URL_ATTRIBUTES.len() + 4);

    for (tag, names) in URL_ATTRIBUTES {
        element_content_handlers.push(element!(*tag, move |el| {
            for name in names.iter() {
                let Some(value) = el.get_attribute(name) else {
                    continue;
                };
                if let Rewritten::Changed(rewritten) = ctx.rewrite_reference(&value) {
                    el.set_attribute(name, &rewritten)?;
                    attributes.set(attributes.get() + 1);
                }
            }
            Ok(())
        }));
    }

    if style_attributes {
        element_content_handlers.push(element!("[style]", move |el| {
            if let Some(style) = el.get_attribute("style") {
                let (rewritten, changed) = rewrite_css_urls(&style, ctx);
                if changed > 0 {
                    el.set_attribute("style", &rewritten)?;
                    css_urls.set(css_urls.get() + changed);
                }
            }
            Ok(())
        }));
    }

    // <style> text arrives in chunks; url() tokens may straddle them.
    element_content_handlers.push(text!("style", move |chunk| {
        style_buffer.borrow_mut().push_str(chunk.as_str());
        if chunk.last_in_text_node() {
            let css = std::mem::take(&mut *style_buffer.borrow_mut());
            let (rewritten, changed) = rewrite_css_urls(&css, ctx);
            css_urls.set(css_urls.get() + changed);
            chunk.replace(&rewritten, ContentType::Html);
        } else {
            chunk.remove();
        }
        Ok(())
    }));

    // Start tag only: `</head>` is optional in HTML.
    element_content_handlers.push(element!("head", move |el| {
        if !base_injected.get() {
            el.prepend(base_tag, ContentType::Html);
            base_injected.set(true);
        }
        Ok(())
    }));

    element_content_handlers.push(element!("body", move |el| {
        if !base_injected.get() {
            el.before(base_tag, ContentType::Html);
            base_injected.set(true);
        }
        Ok(())
    }));

    let document_content_handlers = vec![end!(move |end| {
        if !base_injected.get() {
            end.append(base_tag, ContentType::Html);
            base_injected.set(true);
        }
        Ok(())
    })];

    let html = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers,
            document_content_handlers,
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(RewriteOutcome {
        html,
        attributes: attributes.get(),
        css_urls: css_urls.get(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{encode_component, ProxyPrefix};
    use url::Url;

    fn wrapped(url: &str) -> String {
        format!("/proxy/{}", encode_component(url))
    }

    fn rewrite(html: &str, base: &str) -> RewriteOutcome {
        let base = Url::parse(base).unwrap();
        let prefix = ProxyPrefix::default();
        rewrite_html(html, &RewriteContext::new(&base, &prefix), true).unwrap()
    }

    #[test]
    fn anchor_href_resolves_against_base() {
        let out = rewrite(
            r#"<html><head></head><body><a href="page.html">next</a></body></html>"#,
            "https://example.com/dir/",
        );
        let expected = format!(
            r#"<a href="{}">next</a>"#,
            wrapped("https://example.com/dir/page.html")
        );
        assert!(out.html.contains(&expected), "{}", out.html);
        assert_eq!(out.attributes, 1);
    }

    #[test]
    fn media_and_script_sources_rewritten() {
        let out = rewrite(
            r#"<head><script src="/app.js"></script></head>
<body><img src="a.png"><video src="v.mp4" poster="p.jpg"></video></body>"#,
            "https://example.com/",
        );
        for url in [
            "https://example.com/app.js",
            "https://example.com/a.png",
            "https://example.com/v.mp4",
            "https://example.com/p.jpg",
        ] {
            assert!(out.html.contains(&wrapped(url)), "missing {url}");
        }
        assert_eq!(out.attributes, 4);
    }

    #[test]
    fn unresolvable_attributes_left_alone() {
        let input = r##"<a href="javascript:alert(1)">x</a><a href="#top">y</a><img src="data:image/gif;base64,R0lG">"##;
        let out = rewrite(input, "https://example.com/");
        assert!(out.html.contains(r#"href="javascript:alert(1)""#));
        assert!(out.html.contains(r##"href="#top""##));
        assert!(out.html.contains(r#"src="data:image/gif;base64,R0lG""#));
        assert_eq!(out.attributes, 0);
    }

    #[test]
    fn base_opens_head() {
        let out = rewrite(
            "<html><head><title>t</title></head><body></body></html>",
            "https://example.com/",
        );
        let base = format!(r#"<base href="{}">"#, wrapped("https://example.com/"));
        assert!(
            out.html.contains(&format!("<head>{base}<title>t</title></head>")),
            "{}",
            out.html
        );
        assert_eq!(out.html.matches("<base").count(), 1);
    }

    #[test]
    fn base_injected_when_head_end_tag_omitted() {
        let base = format!(r#"<base href="{}">"#, wrapped("https://example.com/"));

        let out = rewrite(
            "<!DOCTYPE html><html><head><meta charset=utf-8><body>x",
            "https://example.com/",
        );
        assert!(out.html.contains(&format!("<head>{base}<meta")), "{}", out.html);
        assert_eq!(out.html.matches("<base").count(), 1);

        let out = rewrite(
            "<html><head><title>t</title><body><p>x</p></body></html>",
            "https://example.com/",
        );
        assert!(out.html.contains(&format!("<head>{base}<title>")), "{}", out.html);
        assert_eq!(out.html.matches("<base").count(), 1);
    }

    #[test]
    fn base_injected_without_head() {
        let out = rewrite("<body><p>hi</p></body>", "https://example.com/");
        assert!(out.html.starts_with("<base href="), "{}", out.html);

        let out = rewrite("<p>fragment</p>", "https://example.com/");
        assert!(out.html.ends_with(r#"%2F">"#), "{}", out.html);
    }

    #[test]
    fn style_block_urls_rewritten() {
        let out = rewrite(
            "<head><style>body{background:url('/img.png')}</style></head>",
            "https://example.com/",
        );
        let expected = format!("url('{}')", wrapped("https://example.com/img.png"));
        assert!(out.html.contains(&expected), "{}", out.html);
        assert!(out.html.contains("<style>body{background:"));
        assert_eq!(out.css_urls, 1);
    }

    #[test]
    fn style_attribute_urls_rewritten() {
        let out = rewrite(
            r#"<div style="background:url('/img.png')"></div>"#,
            "https://example.com/",
        );
        let expected = format!("url('{}')", wrapped("https://example.com/img.png"));
        assert!(out.html.contains(&expected), "{}", out.html);
        assert_eq!(out.css_urls, 1);
    }

    #[test]
    fn style_attributes_can_be_skipped() {
        let base = Url::parse("https://example.com/").unwrap();
        let prefix = ProxyPrefix::default();
        let input = r#"<div style="background:url('/img.png')"></div>"#;
        let out = rewrite_html(input, &RewriteContext::new(&base, &prefix), false).unwrap();
        assert!(out.html.contains(input));
        assert_eq!(out.css_urls, 0);
    }

    #[test]
    fn script_contents_untouched() {
        let script = r#"<script>var u = "/api"; fetch(u);</script>"#;
        let out = rewrite(&format!("<head>{script}</head>"), "https://example.com/");
        assert!(out.html.contains(script));
    }
}
