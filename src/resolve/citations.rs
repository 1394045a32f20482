//! Footnote-style bibliography citations.
//!
//! ```text
//! As argued before[^smith], truth is ...
//!
//! [^smith]: Smith, J. (2020). *On Truth*. Academic Press.
//! ```
//!
//! Definitions are lifted out of the body into a [`CitationTable`], in-body
//! markers become opaque reference tokens that survive the Markdown pass, and
//! after rendering the tokens are resolved to numbered links into a generated
//! bibliography.

use crate::ast::{BibEntry, Citation};
use crate::bibtex;
use crate::error::FormatError;
use crate::parser::lexer::{citation_definition, fence, heading, is_divider};
use crate::paths::normalize_anchor_id;
use crate::render::escape_html;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\^([A-Za-z0-9_-]+)\](:?)").unwrap());
static REFERENCE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CITATION-REF-([0-9a-f]+)-END").unwrap());
static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static EXISTING_BIBLIOGRAPHY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<h([23]) id="bibliography">Bibliography</h[23]>"#).unwrap());
static NEXT_SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<h[23][ >]").unwrap());

/// Citations of one document, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CitationTable {
    entries: Vec<Citation>,
    #[serde(skip)]
    by_id: HashMap<String, usize>,
}

impl CitationTable {
    /// Record a definition. Returns `false` if `id` was already defined.
    pub fn insert(&mut self, id: &str, raw_content: String) -> bool {
        if self.by_id.contains_key(id) {
            return false;
        }
        let index = self.entries.len();
        let anchor = self.unique_anchor(id);
        self.by_id.insert(id.to_string(), index);
        self.entries.push(Citation {
            id: id.to_string(),
            anchor,
            raw_content,
            index,
            formatted_html: None,
        });
        true
    }

    /// `a_b` and `A-B` both normalize to `a-b`; the later one becomes `a-b-2`.
    fn unique_anchor(&self, id: &str) -> String {
        let base = normalize_anchor_id(id);
        let mut anchor = base.clone();
        let mut n = 2;
        while self.entries.iter().any(|c| c.anchor == anchor) {
            anchor = format!("{}-{}", base, n);
            n += 1;
        }
        if anchor != base {
            tracing::warn!(id, anchor = %anchor, "citation anchor collides with an earlier id");
        }
        anchor
    }

    pub fn get(&self, id: &str) -> Option<&Citation> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Citation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Body with definitions removed and markers replaced by reference tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub markdown: String,
    pub citations: CitationTable,
}

/// Lift citation definitions out of `markdown`.
///
/// A definition starts at the beginning of a line and runs until a blank
/// line, the next definition, a `---` divider or a heading. Later
/// definitions of an already defined id are dropped with a warning.
pub fn extract(markdown: &str) -> Extracted {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut citations = CitationTable::default();
    let mut kept: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if fence(line.trim_start()).is_ok() {
            in_fence = !in_fence;
            kept.push(line.to_string());
            i += 1;
            continue;
        }
        if in_fence {
            kept.push(line.to_string());
            i += 1;
            continue;
        }

        let Ok((_, (id, first))) = citation_definition(line) else {
            kept.push(replace_references(line));
            i += 1;
            continue;
        };

        let mut content = vec![first.trim()];
        i += 1;
        while i < lines.len() && !ends_definition(lines[i]) {
            content.push(lines[i].trim());
            i += 1;
        }

        let raw = content.join("\n").trim().to_string();
        if !citations.insert(id, raw) {
            tracing::warn!(id, "duplicate citation definition ignored");
        }
    }

    let mut markdown = kept.join("\n");
    markdown.truncate(markdown.trim_end().len());
    if !markdown.is_empty() {
        markdown.push('\n');
    }

    tracing::debug!(count = citations.len(), "extracted citations");
    Extracted {
        markdown,
        citations,
    }
}

fn ends_definition(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || citation_definition(line).is_ok()
        || is_divider(trimmed)
        || heading(trimmed).is_ok()
}

fn replace_references(line: &str) -> String {
    REFERENCE
        .replace_all(line, |caps: &Captures| {
            if caps[2].is_empty() {
                reference_token(&caps[1])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// The token standing in for a `[^id]` marker.
pub fn reference_token(id: &str) -> String {
    format!("CITATION-REF-{}-END", hex::encode(id))
}

fn token_id(caps: &Captures) -> Option<String> {
    hex::decode(&caps[1]).ok().and_then(|bytes| String::from_utf8(bytes).ok())
}

/// Formats the raw text of one citation as HTML.
pub trait CitationFormatter {
    fn format(&self, raw: &str) -> Result<String, FormatError>;
}

/// Formats BibTeX entries in author-year style and everything else as
/// lightly marked-up text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BibtexFormatter;

impl CitationFormatter for BibtexFormatter {
    fn format(&self, raw: &str) -> Result<String, FormatError> {
        if bibtex::is_bibtex(raw) {
            let entry = bibtex::parse_entry(raw)
                .ok_or_else(|| FormatError(format!("unterminated BibTeX entry: {}", raw)))?;
            return Ok(format_entry(&entry));
        }
        Ok(format_plain(raw))
    }
}

fn format_entry(entry: &BibEntry) -> String {
    let mut parts = Vec::new();

    if !entry.authors.is_empty() {
        parts.push(escape_html(&entry.authors.join(", ")));
    }
    if let Some(year) = &entry.year {
        parts.push(format!("({})", escape_html(year)));
    }
    if let Some(title) = &entry.title {
        parts.push(format!("<em>{}</em>", escape_html(title)));
    }
    if let Some(journal) = &entry.journal {
        let mut venue = escape_html(journal);
        if let Some(volume) = &entry.volume {
            venue.push_str(&format!(", {}", escape_html(volume)));
            if let Some(number) = &entry.number {
                venue.push_str(&format!("({})", escape_html(number)));
            }
        }
        if let Some(pages) = &entry.pages {
            venue.push_str(&format!(", {}", escape_html(pages)));
        }
        parts.push(venue);
    } else if let Some(booktitle) = &entry.booktitle {
        parts.push(format!("In <em>{}</em>", escape_html(booktitle)));
    }
    if let Some(publisher) = &entry.publisher {
        parts.push(escape_html(publisher));
    }
    if let Some(doi) = &entry.doi {
        let doi = escape_html(doi);
        parts.push(format!(r#"<a href="https://doi.org/{doi}">{doi}</a>"#));
    } else if let Some(url) = &entry.url {
        let url = escape_html(url);
        parts.push(format!(r#"<a href="{url}">{url}</a>"#));
    }

    parts.join(". ") + "."
}

fn format_plain(raw: &str) -> String {
    let escaped = escape_html(raw.trim());
    let linked = MARKDOWN_LINK.replace_all(&escaped, r#"<a href="$2">$1</a>"#);
    EMPHASIS.replace_all(&linked, "<em>$1</em>").into_owned()
}

/// Run every citation through `formatter`, in index order.
///
/// A formatter failure is logged and the raw content is used instead.
pub fn format_citations(mut table: CitationTable, formatter: &dyn CitationFormatter) -> CitationTable {
    for citation in &mut table.entries {
        let html = match formatter.format(&citation.raw_content) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(id = %citation.id, error = %e, "citation formatting failed, using raw text");
                citation.raw_content.clone()
            }
        };
        citation.formatted_html = Some(html);
    }
    table
}

/// Replace reference tokens with numbered links into the bibliography.
///
/// The first reference to each citation carries the back-reference target.
/// Tokens for undefined ids are turned back into their `[^id]` marker.
pub fn resolve_references(html: &str, table: &CitationTable) -> String {
    let mut seen = HashSet::new();
    REFERENCE_TOKEN
        .replace_all(html, |caps: &Captures| {
            let Some(id) = token_id(caps) else {
                tracing::error!(token = &caps[0], "malformed citation token");
                return caps[0].to_string();
            };
            let Some(citation) = table.get(&id) else {
                tracing::warn!(id = %id, "reference to undefined citation");
                return format!("[^{}]", id);
            };
            let anchor = &citation.anchor;
            let back = if seen.insert(anchor.clone()) {
                format!(r#" id="citation-ref-{}""#, anchor)
            } else {
                String::new()
            };
            format!(
                r##"<sup><a href="#citation-{anchor}"{back} class="citation-ref">[{}]</a></sup>"##,
                citation.index + 1
            )
        })
        .into_owned()
}

/// Replace reference tokens with `\cite{id}`.
pub fn resolve_references_latex(text: &str) -> String {
    REFERENCE_TOKEN
        .replace_all(text, |caps: &Captures| match token_id(caps) {
            Some(id) => format!("\\cite{{{}}}", id),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// The bibliography block, or an empty string when there are no citations.
pub fn render_bibliography(table: &CitationTable) -> String {
    if table.is_empty() {
        return String::new();
    }

    let mut html = String::from(
        "<h2 id=\"bibliography\">Bibliography</h2>\n<div class=\"bibliography\">\n<ol>\n",
    );
    for citation in table.iter() {
        let anchor = &citation.anchor;
        let body = citation
            .formatted_html
            .clone()
            .unwrap_or_else(|| escape_html(&citation.raw_content));
        html.push_str(&format!(
            "<li id=\"citation-{anchor}\" class=\"citation-entry\">{body} <a href=\"#citation-ref-{anchor}\" class=\"citation-backref\" title=\"Back to reference\">↩</a></li>\n"
        ));
    }
    html.push_str("</ol>\n</div>\n");
    html
}

/// Append the bibliography, or replace an existing bibliography section
/// (from its heading up to the next `h2`/`h3`).
pub fn attach_bibliography(html: &str, bibliography: &str) -> String {
    if bibliography.is_empty() {
        return html.to_string();
    }

    match EXISTING_BIBLIOGRAPHY.find(html) {
        Some(heading) => {
            let end = NEXT_SECTION
                .find(&html[heading.end()..])
                .map(|m| heading.end() + m.start())
                .unwrap_or(html.len());
            format!("{}{}{}", &html[..heading.start()], bibliography, &html[end..])
        }
        None => {
            let mut out = html.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(bibliography);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FailingFormatter;

    impl CitationFormatter for FailingFormatter {
        fn format(&self, _raw: &str) -> Result<String, FormatError> {
            Err(FormatError("service unavailable".into()))
        }
    }

    #[test]
    fn test_extract_single_citation() {
        let extracted = extract("See [^a]. \n\n[^a]: Smith, 2020.");
        assert_eq!(extracted.citations.len(), 1);
        let citation = extracted.citations.get("a").unwrap();
        assert_eq!(citation.index, 0);
        assert_eq!(citation.raw_content, "Smith, 2020.");
        assert!(extracted.markdown.contains(&reference_token("a")));
        assert!(!extracted.markdown.contains("Smith"));
    }

    #[test]
    fn test_extract_first_seen_order_and_duplicates() {
        let extracted = extract("[^b]: Second.\n[^a]: First.\n[^b]: Ignored.");
        let ids: Vec<&str> = extracted.citations.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(extracted.citations.get("b").unwrap().raw_content, "Second.");
    }

    #[test]
    fn test_definition_continues_until_blank_line() {
        let extracted = extract("[^long]: Line one\ncontinues here.\n\nBody again.");
        assert_eq!(
            extracted.citations.get("long").unwrap().raw_content,
            "Line one\ncontinues here."
        );
        assert_eq!(extracted.markdown.trim(), "Body again.");
    }

    #[test]
    fn test_markers_in_code_fences_are_left_alone() {
        let extracted = extract("```\n[^x]: not a citation\n```");
        assert!(extracted.citations.is_empty());
        assert!(extracted.markdown.contains("[^x]: not a citation"));
    }

    #[test]
    fn test_resolve_references() {
        let extracted = extract("See [^a] and again [^a].\n\n[^a]: Smith, 2020.");
        let html = format!("<p>{}</p>", extracted.markdown.trim());
        let resolved = resolve_references(&html, &extracted.citations);

        assert!(resolved.contains(
            r##"<sup><a href="#citation-a" id="citation-ref-a" class="citation-ref">[1]</a></sup>"##
        ));
        assert_eq!(resolved.matches("citation-ref-a").count(), 1);
        assert_eq!(resolved.matches("[1]").count(), 2);
    }

    #[test]
    fn test_undefined_reference_stays_verbatim() {
        let extracted = extract("Dangling [^nope].");
        let resolved = resolve_references(&extracted.markdown, &extracted.citations);
        assert_eq!(resolved.trim(), "Dangling [^nope].");
        assert_eq!(resolve_references_latex(&extracted.markdown).trim(), "Dangling \\cite{nope}.");
    }

    #[test]
    fn test_format_fallback_is_raw_text() {
        let extracted = extract("[^a]: Smith <2020>.");
        let table = format_citations(extracted.citations, &FailingFormatter);
        assert_eq!(
            table.get("a").unwrap().formatted_html.as_deref(),
            Some("Smith <2020>.")
        );
    }

    #[test]
    fn test_bibtex_formatter() {
        let formatter = BibtexFormatter;
        let html = formatter
            .format("@book{k, author = {Ada Lovelace}, title = {Notes}, year = 1843, publisher = {Taylor}}")
            .unwrap();
        assert_eq!(html, "Ada Lovelace. (1843). <em>Notes</em>. Taylor.");

        let html = formatter.format("Smith, *On Truth*, [link](https://x.org)").unwrap();
        assert_eq!(
            html,
            r#"Smith, <em>On Truth</em>, <a href="https://x.org">link</a>"#
        );
        assert!(formatter.format("@book{k, title = {Unclosed}").is_err());
    }

    #[test]
    fn test_render_bibliography() {
        assert_eq!(render_bibliography(&CitationTable::default()), "");

        let table = format_citations(extract("[^Smith_2020]: Smith.").citations, &BibtexFormatter);
        let html = render_bibliography(&table);
        assert!(html.starts_with("<h2 id=\"bibliography\">Bibliography</h2>"));
        assert!(html.contains(r##"<li id="citation-smith-2020" class="citation-entry">Smith. <a href="#citation-ref-smith-2020""##));
    }

    #[test]
    fn test_colliding_ids_get_distinct_anchors() {
        let mut table = CitationTable::default();
        assert!(table.insert("a_b", "First.".into()));
        assert!(table.insert("A-B", "Second.".into()));
        assert!(table.insert("a-b-2", "Third.".into()));

        let anchors: Vec<&str> = table.iter().map(|c| c.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["a-b", "a-b-2", "a-b-2-2"]);

        let html = render_bibliography(&table);
        for anchor in &anchors {
            assert_eq!(html.matches(&format!(r#"id="citation-{}""#, anchor)).count(), 1);
        }

        let refs = resolve_references(&format!("{} {}", reference_token("a_b"), reference_token("A-B")), &table);
        assert!(refs.contains(r##"href="#citation-a-b" id="citation-ref-a-b""##));
        assert!(refs.contains(r##"href="#citation-a-b-2" id="citation-ref-a-b-2""##));
    }

    #[test]
    fn test_attach_bibliography_replaces_existing_section() {
        let html = "<p>x</p>\n<h2 id=\"bibliography\">Bibliography</h2>\n<p>old</p>\n<h2 id=\"after\">After</h2>";
        let out = attach_bibliography(html, "BIB\n");
        assert_eq!(out, "<p>x</p>\nBIB\n<h2 id=\"after\">After</h2>");

        assert_eq!(attach_bibliography("<p>x</p>", "BIB\n"), "<p>x</p>\nBIB\n");
        assert_eq!(attach_bibliography("<p>x</p>", ""), "<p>x</p>");
    }
}
