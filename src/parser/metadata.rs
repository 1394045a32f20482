//! Front and back matter.
//!
//! A document may open with a header block and close with a footer block:
//!
//! ```text
//! # Header
//! - title: [On Truth](on-truth.md)
//! - book: [Essays](../.books.md)
//! - previous: [Prologue](prologue.md)
//!
//! # On Truth
//! ...body...
//!
//! # Footer
//! - related:
//!   - [Meaning](../encyclopedia/meaning.md)
//! ### Thoughts
//!   - Is truth a property?
//! ```
//!
//! Both blocks are removed from the body. Malformed entries are logged and
//! skipped; parsing never fails.

use crate::ast::{MetaLink, Metadata};
use crate::parser::lexer::{
    find_link, heading, is_footer_marker, is_header_marker, link, meta_entry,
};
use serde::Serialize;

/// Metadata plus the body with header and footer removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDocument {
    pub metadata: Metadata,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Body,
    InHeader,
    InFooter,
    InFooterRelated,
    InFooterThoughts,
}

/// Split a document into metadata and body.
pub fn parse_metadata(markdown: &str) -> ParsedDocument {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut metadata = Metadata::default();
    let mut state = State::Body;

    let mut header_at: Option<usize> = None;
    let mut header_end: Option<usize> = None;
    let mut footer_at: Option<usize> = None;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();

        if is_footer_marker(line) {
            footer_at.get_or_insert(i);
            state = State::InFooter;
            continue;
        }

        if is_header_marker(line) && matches!(state, State::Body | State::InHeader) {
            header_at = Some(i);
            header_end = None;
            state = State::InHeader;
            continue;
        }

        match state {
            State::Body => {}
            State::InHeader => {
                if line.starts_with('#') {
                    header_end = Some(i);
                    state = State::Body;
                } else if let Some(entry) = line.strip_prefix("- ") {
                    header_entry(entry, i, &mut metadata);
                }
            }
            State::InFooter | State::InFooterRelated | State::InFooterThoughts => {
                if line == "- related:" {
                    state = State::InFooterRelated;
                } else if line == "### Thoughts" {
                    state = State::InFooterThoughts;
                } else if state == State::InFooterRelated {
                    related_entry(raw, i, &mut metadata);
                } else if state == State::InFooterThoughts {
                    thought_entry(raw, &mut metadata);
                }
            }
        }
    }

    let start = match (header_at, header_end) {
        (_, Some(end)) => end,
        (Some(at), None) => lines
            .iter()
            .enumerate()
            .skip(at + 1)
            .find(|(_, l)| {
                let l = l.trim();
                !l.is_empty() && !l.starts_with("- ")
            })
            .map(|(i, _)| i)
            .unwrap_or(lines.len()),
        (None, None) => 0,
    };
    let end = footer_at.unwrap_or(lines.len());

    let body = if start < end {
        lines[start..end].join("\n")
    } else {
        String::new()
    };

    if metadata.title.is_none() {
        metadata.title = title_from_body(&body);
    }

    tracing::debug!(
        title = metadata.title.is_some(),
        collection = metadata.collection.is_some(),
        related = metadata.related.len(),
        notes = metadata.notes.len(),
        "parsed metadata"
    );

    ParsedDocument { metadata, body }
}

fn header_entry(entry: &str, line_no: usize, metadata: &mut Metadata) {
    let Ok((_, (key, value))) = meta_entry(entry.trim()) else {
        tracing::warn!(line = line_no + 1, entry, "skipping malformed header line");
        return;
    };

    let slot = match key {
        "title" => &mut metadata.title,
        "collection" | "book" => &mut metadata.collection,
        "subject" => &mut metadata.subject,
        "previous" => &mut metadata.previous,
        "next" => &mut metadata.next,
        _ => {
            tracing::debug!(line = line_no + 1, key, "ignoring unknown header key");
            return;
        }
    };

    let Some((text, link)) = value else {
        tracing::warn!(line = line_no + 1, key, "header value is not a [text](link) pair");
        return;
    };
    *slot = Some(MetaLink::new(text, link));

    // A book that is the dictionary doubles as the subject.
    if key == "book" && (link.contains(".dictionary") || link.contains("dictionary.md")) {
        metadata.subject = Some(MetaLink::new(text, link));
    }
}

fn related_entry(raw: &str, line_no: usize, metadata: &mut Metadata) {
    let indent = raw.len() - raw.trim_start_matches(' ').len();
    let item = &raw[indent..];
    if indent > 2 || !item.starts_with("- ") {
        return;
    }
    match find_link(item) {
        Some((text, link)) => metadata.related.push(MetaLink::new(text, link)),
        None => tracing::warn!(line = line_no + 1, "related entry has no link"),
    }
}

/// Thoughts are list items indented by one or two spaces.
fn thought_entry(raw: &str, metadata: &mut Metadata) {
    let thought = raw
        .strip_prefix("  - ")
        .or_else(|| raw.strip_prefix(" - "));
    if let Some(thought) = thought {
        metadata.notes.push(thought.trim().to_string());
    }
}

/// The first top-level heading, as `# Title` or `# [Title](link)`.
fn title_from_body(body: &str) -> Option<MetaLink> {
    body.lines().find_map(|line| match heading(line.trim()) {
        Ok((_, (1, text))) => Some(match link(text) {
            Ok(("", (text, target))) => MetaLink::new(text, target),
            _ => MetaLink::new(text, ""),
        }),
        _ => None,
    })
}
