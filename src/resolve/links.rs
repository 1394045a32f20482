//! Link rewriting over finished HTML.

use crate::paths::{needs_html_extension, normalize_anchor_id, PathResolver};
use crate::render::unescape_html;
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

static HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="([^"]*)""#).unwrap());
static MD_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^#]*\.md(?:#.*)?$").unwrap());
static SCHEME_ABSOLUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").unwrap());

/// Rewrites `href` attributes from source links to public links.
///
/// Three passes, in order: `.md` targets through the path resolver, anchor
/// fragments through the anchor normalizer, and `.html` appended to bare
/// relative links. Each pass is idempotent.
#[derive(Debug, Clone, Copy)]
pub struct LinkRewriter<'a> {
    resolver: PathResolver<'a>,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(resolver: PathResolver<'a>) -> Self {
        Self { resolver }
    }

    pub fn rewrite(&self, html: &str) -> String {
        let html = self.rewrite_markdown_links(html);
        let html = normalize_fragments(&html);
        append_html_extensions(&html)
    }

    /// `chapter.md#Some Part` → `chapter.html#some-part`
    pub fn rewrite_markdown_links(&self, html: &str) -> String {
        map_hrefs(html, |href| {
            let href = decode_href(href);
            if href.starts_with("//") || href.contains(':') || !MD_TARGET.is_match(&href) {
                return None;
            }
            Some(self.resolver.md_to_html_link(&href))
        })
    }
}

/// `page.html#Some_Part` → `page.html#some-part`
pub fn normalize_fragments(html: &str) -> String {
    map_hrefs(html, |href| {
        if href.starts_with("//") || SCHEME_ABSOLUTE.is_match(href) {
            return None;
        }
        let (path, fragment) = href.split_once('#')?;
        Some(format!("{}#{}", path, normalize_anchor_id(&decode_href(fragment))))
    })
}

/// A link target as it was written in the source.
///
/// Undoes the `<...>` delimiters of a CommonMark destination, the entity
/// escaping of an HTML attribute and percent-encoding, in that order.
/// `Truth%20&amp;%20Proof.md` → `Truth & Proof.md`
pub fn decode_href(href: &str) -> String {
    let href = href
        .strip_prefix('<')
        .and_then(|inner| inner.strip_suffix('>'))
        .unwrap_or(href);
    let href = unescape_html(href);
    percent_decode_str(&href).decode_utf8_lossy().into_owned()
}

/// `../books/on-truth` → `../books/on-truth.html`
pub fn append_html_extensions(html: &str) -> String {
    map_hrefs(html, |href| {
        needs_html_extension(href).then(|| format!("{}.html", href))
    })
}

fn map_hrefs(html: &str, rewrite: impl Fn(&str) -> Option<String>) -> String {
    HREF.replace_all(html, |caps: &Captures| match rewrite(&caps[1]) {
        Some(href) => format!(r#"href="{}""#, href),
        None => caps[0].to_string(),
    })
    .into_owned()
}
