//! `<base>` tag rewriting for HTML documents.
//!
//! Served pages live under `/{alias}/`, but site bundles are usually
//! authored for the domain root. Setting the document base scopes every
//! relative link to the alias prefix without touching the rest of the
//! markup.
//!
//! Two entry points share the same tag matching:
//!
//! - [`inject_placeholder`] runs at ingestion and only ever adds a
//!   root base (`/`) after `<head>`, leaving documents with an existing
//!   base, or without a head, untouched.
//! - [`rewrite_base`] runs at serving time and always produces a document
//!   whose base is the requested href.

use std::sync::LazyLock;

use regex::Regex;

/// Base href written into HTML entries at ingestion.
pub const PLACEHOLDER_BASE: &str = "/";

static BASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<base(?:\s[^>]*)?/?>").expect("base tag pattern"));

static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("head tag pattern"));

static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html(?:\s[^>]*)?>").expect("html tag pattern"));

/// Where a base tag ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BasePlacement {
    /// An existing `<base>` was replaced.
    Replaced,
    /// Inserted directly after the opening `<head>`.
    AfterHead,
    /// A `<head>` holding the base was synthesized after `<html>`.
    SynthesizedHead,
    /// The whole document was wrapped in a minimal html/head skeleton.
    Wrapped,
}

/// Result of [`rewrite_base`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseRewrite {
    pub html: String,
    pub placement: BasePlacement,
}

/// Render a base tag for `href`.
pub fn base_tag(href: &str) -> String {
    format!(r#"<base href="{href}">"#)
}

/// Whether the document already declares a base.
pub fn has_base_tag(html: &str) -> bool {
    BASE_TAG.is_match(html)
}

/// Add the ingestion-time placeholder base after `<head>`.
///
/// Returns `None` when nothing changes: the document already has a base,
/// or has no head element to anchor one.
pub fn inject_placeholder(html: &str) -> Option<String> {
    if has_base_tag(html) {
        return None;
    }
    let head = HEAD_OPEN.find(html)?;
    Some(splice(html, head.end(), head.end(), &format!("\n{}", base_tag(PLACEHOLDER_BASE))))
}

/// Make `href` the document base.
///
/// Precedence: replace the first existing base tag; else insert after the
/// opening head tag; else synthesize a head after the opening html tag;
/// else wrap the whole document.
pub fn rewrite_base(html: &str, href: &str) -> BaseRewrite {
    let tag = base_tag(href);

    if let Some(m) = BASE_TAG.find(html) {
        return BaseRewrite {
            html: splice(html, m.start(), m.end(), &tag),
            placement: BasePlacement::Replaced,
        };
    }
    if let Some(m) = HEAD_OPEN.find(html) {
        return BaseRewrite {
            html: splice(html, m.end(), m.end(), &format!("\n{tag}")),
            placement: BasePlacement::AfterHead,
        };
    }
    if let Some(m) = HTML_OPEN.find(html) {
        return BaseRewrite {
            html: splice(html, m.end(), m.end(), &format!("\n<head>{tag}</head>")),
            placement: BasePlacement::SynthesizedHead,
        };
    }
    BaseRewrite {
        html: format!("<!DOCTYPE html>\n<html>\n<head>{tag}</head>\n{html}"),
        placement: BasePlacement::Wrapped,
    }
}

fn splice(html: &str, start: usize, end: usize, insert: &str) -> String {
    let mut out = String::with_capacity(html.len() + insert.len());
    out.push_str(&html[..start]);
    out.push_str(insert);
    out.push_str(&html[end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_goes_after_head() {
        let out = inject_placeholder("<html><head><title>x</title></head></html>").unwrap();
        assert_eq!(
            out,
            "<html><head>\n<base href=\"/\"><title>x</title></head></html>"
        );
    }

    #[test]
    fn placeholder_respects_head_attributes() {
        let out = inject_placeholder(r#"<HEAD lang="en"><meta></HEAD>"#).unwrap();
        assert!(out.starts_with("<HEAD lang=\"en\">\n<base href=\"/\">"));
    }

    #[test]
    fn placeholder_skips_existing_base() {
        assert!(inject_placeholder(r#"<head><base href="/x/"></head>"#).is_none());
        assert!(inject_placeholder(r#"<head><BASE target="_blank"/></head>"#).is_none());
    }

    #[test]
    fn placeholder_needs_a_head() {
        assert!(inject_placeholder("<p>fragment</p>").is_none());
    }

    #[test]
    fn header_element_is_not_a_head() {
        assert!(inject_placeholder("<header>nav</header>").is_none());
        let out = rewrite_base("<html><header>nav</header></html>", "/a/");
        assert_eq!(out.placement, BasePlacement::SynthesizedHead);
    }

    #[test]
    fn basefont_is_not_a_base() {
        assert!(!has_base_tag("<basefont size=3>"));
    }

    #[test]
    fn rewrite_replaces_existing_base() {
        let out = rewrite_base(r#"<head><base href="/"></head>"#, "/demo/");
        assert_eq!(out.placement, BasePlacement::Replaced);
        assert_eq!(out.html, r#"<head><base href="/demo/"></head>"#);
    }

    #[test]
    fn rewrite_inserts_after_head() {
        let out = rewrite_base("<html><head></head><body></body></html>", "/demo/");
        assert_eq!(out.placement, BasePlacement::AfterHead);
        assert_eq!(
            out.html,
            "<html><head>\n<base href=\"/demo/\"></head><body></body></html>"
        );
    }

    #[test]
    fn rewrite_synthesizes_head_after_html() {
        let out = rewrite_base("<!DOCTYPE html><html lang=\"en\"><body>hi</body></html>", "/demo/");
        assert_eq!(out.placement, BasePlacement::SynthesizedHead);
        assert_eq!(
            out.html,
            "<!DOCTYPE html><html lang=\"en\">\n<head><base href=\"/demo/\"></head><body>hi</body></html>"
        );
    }

    #[test]
    fn rewrite_wraps_fragments() {
        let out = rewrite_base("<p>hi</p>", "/demo/");
        assert_eq!(out.placement, BasePlacement::Wrapped);
        assert_eq!(
            out.html,
            "<!DOCTYPE html>\n<html>\n<head><base href=\"/demo/\"></head>\n<p>hi</p>"
        );
    }

    #[test]
    fn rewrite_is_stable_over_the_placeholder() {
        let ingested = inject_placeholder("<head></head>").unwrap();
        let once = rewrite_base(&ingested, "/demo/").html;
        let twice = rewrite_base(&once, "/demo/").html;
        assert_eq!(once, twice);
        assert_eq!(once.matches("<base").count(), 1);
    }
}
