//! Section tree for the LaTeX path.
//!
//! The body is cut on `---` dividers. The first chunk holds the title, every
//! later chunk becomes one [`Section`] chosen by its first heading.

use crate::ast::{
    Annotations, DocumentNode, Heading, KeywordsSection, Metadata, Paragraph, ParagraphKind,
    Section, SectionLevel, TitleSection,
};
use crate::parser::lexer::{fence, heading, is_comment, is_divider, link, list_marker};
use crate::parser::paragraphs::split_paragraphs;
use crate::resolve::CitationTable;

/// Build the document tree from a metadata-stripped body.
///
/// `citations` supplies the bibliography entries; a bibliography section is
/// appended when the body has none and the table is not empty.
pub fn build_document(metadata: Metadata, body: &str, citations: &CitationTable) -> DocumentNode {
    let mut chunks = split_chunks(body).into_iter();
    let mut sections = Vec::new();

    if let Some(first) = chunks.next() {
        sections.push(Section::Title(title_section(&first, &metadata)));
    }

    let mut has_bibliography = false;
    for chunk in chunks {
        match classify_chunk(&chunk, citations) {
            Section::Keywords(keywords) => attach_keywords(&mut sections, keywords),
            section => {
                has_bibliography |= matches!(section, Section::Bibliography { .. });
                sections.push(section);
            }
        }
    }

    if !has_bibliography && !citations.is_empty() {
        sections.push(Section::Bibliography {
            paragraphs: citation_paragraphs(citations),
        });
    }

    tracing::debug!(sections = sections.len(), "built document tree");
    DocumentNode { metadata, sections }
}

/// Split on divider lines outside fenced code.
fn split_chunks(body: &str) -> Vec<Vec<&str>> {
    let mut chunks = vec![Vec::new()];
    let mut in_fence = false;

    for line in body.lines() {
        if fence(line.trim_start()).is_ok() {
            in_fence = !in_fence;
        } else if !in_fence && is_divider(line) {
            chunks.push(Vec::new());
            continue;
        }
        if let Some(chunk) = chunks.last_mut() {
            chunk.push(line);
        }
    }
    chunks
}

/// Index and parse of the first heading line in a chunk.
fn first_heading<'a>(chunk: &[&'a str]) -> Option<(usize, usize, &'a str)> {
    chunk.iter().enumerate().find_map(|(i, line)| {
        heading(line.trim())
            .ok()
            .map(|(_, (depth, text))| (i, depth, text))
    })
}

fn without_line(chunk: &[&str], skip: usize) -> String {
    chunk
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != skip)
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn title_section(chunk: &[&str], metadata: &Metadata) -> TitleSection {
    match first_heading(chunk) {
        Some((i, _, text)) => {
            let (text, target) = match link(text) {
                Ok(("", (text, target))) => (text, Some(target.to_string())),
                _ => (text, None),
            };
            TitleSection {
                text: text.to_string(),
                link: target,
                paragraphs: split_paragraphs(&without_line(chunk, i)),
            }
        }
        None => {
            let (text, target) = metadata
                .title
                .as_ref()
                .map(|t| (t.text.clone(), Some(t.link.clone()).filter(|l| !l.is_empty())))
                .unwrap_or_default();
            TitleSection {
                text,
                link: target,
                paragraphs: split_paragraphs(&chunk.join("\n")),
            }
        }
    }
}

fn classify_chunk(chunk: &[&str], citations: &CitationTable) -> Section {
    let Some((i, depth, text)) = first_heading(chunk) else {
        return Section::Content {
            heading: None,
            paragraphs: split_paragraphs(&chunk.join("\n")),
        };
    };

    let rest = without_line(chunk, i);
    let lower = text.to_lowercase();

    if lower.starts_with("abstract") {
        Section::Abstract {
            paragraphs: split_paragraphs(&rest),
            keywords: Vec::new(),
        }
    } else if lower.starts_with("keywords") {
        Section::Keywords(keywords_section(&rest))
    } else if depth == 2 && text == "Bibliography" {
        let mut paragraphs: Vec<Paragraph> = split_paragraphs(&rest)
            .into_iter()
            .filter(|p| p.kind != ParagraphKind::Comment)
            .collect();
        paragraphs.extend(citation_paragraphs(citations));
        Section::Bibliography { paragraphs }
    } else {
        Section::Content {
            heading: Some(Heading {
                level: SectionLevel::from_depth(depth),
                text: text.to_string(),
            }),
            paragraphs: split_paragraphs(&rest),
        }
    }
}

fn keywords_section(text: &str) -> KeywordsSection {
    let mut section = KeywordsSection::default();
    for line in text.lines() {
        let trimmed = line.trim();
        if is_comment(trimmed) {
            section.annotations.push(trimmed.to_string());
        } else if let Ok((item, false)) = list_marker(trimmed) {
            section.keywords.push(item.trim().to_string());
        }
    }
    section
}

/// Keywords belong to the closest abstract before them. Without one they
/// stay in place as a standalone section.
fn attach_keywords(sections: &mut Vec<Section>, keywords: KeywordsSection) {
    let abstract_keywords = sections.iter_mut().rev().find_map(|section| match section {
        Section::Abstract { keywords: list, .. } => Some(list),
        _ => None,
    });
    match abstract_keywords {
        Some(list) => list.push(keywords),
        None => {
            tracing::warn!(
                count = keywords.keywords.len(),
                "keywords section without an abstract kept standalone"
            );
            sections.push(Section::Keywords(keywords));
        }
    }
}

fn citation_paragraphs(citations: &CitationTable) -> Vec<Paragraph> {
    citations
        .iter()
        .map(|citation| Paragraph {
            kind: ParagraphKind::Citation {
                id: citation.id.clone(),
            },
            content: citation.raw_content.clone(),
            annotations: Annotations::default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MetaLink;
    use crate::resolve::citations::extract;
    use pretty_assertions::assert_eq;

    fn build(body: &str) -> DocumentNode {
        build_document(Metadata::default(), body, &CitationTable::default())
    }

    #[test]
    fn test_title_from_heading_link() {
        let doc = build("# [On Truth](on-truth.md)\n*A. Author*\n---\n## Intro\nText.");
        let title = doc.title_section().unwrap();
        assert_eq!(title.text, "On Truth");
        assert_eq!(title.link.as_deref(), Some("on-truth.md"));
        assert_eq!(title.paragraphs[0].content, "*A. Author*");
    }

    #[test]
    fn test_title_falls_back_to_metadata() {
        let metadata = Metadata {
            title: Some(MetaLink::new("From Header", "")),
            ..Metadata::default()
        };
        let doc = build_document(metadata, "Intro text.", &CitationTable::default());
        let title = doc.title_section().unwrap();
        assert_eq!(title.text, "From Header");
        assert_eq!(title.link, None);
    }

    #[test]
    fn test_keywords_attach_to_abstract() {
        let doc = build(
            "# T\n---\n## Abstract\nWe study truth.\n---\n### Keywords\n- truth\n- logic\n---\n## Body\nText.",
        );
        assert_eq!(doc.sections.len(), 3);
        match &doc.sections[1] {
            Section::Abstract { paragraphs, keywords } => {
                assert_eq!(paragraphs[0].content, "We study truth.");
                assert_eq!(keywords.len(), 1);
                assert_eq!(keywords[0].keywords, vec!["truth", "logic"]);
            }
            other => panic!("expected abstract, got {:?}", other),
        }
    }

    #[test]
    fn test_orphan_keywords_stay_standalone() {
        let doc = build("# T\n---\n## Keywords\n% tags\n- alone");
        assert_eq!(
            doc.sections[1],
            Section::Keywords(KeywordsSection {
                keywords: vec!["alone".into()],
                annotations: vec!["% tags".into()],
            })
        );
    }

    #[test]
    fn test_content_levels() {
        let doc = build("# T\n---\n# Chapter\na\n---\n### Sub\nb\n---\nno heading");
        let levels: Vec<Option<SectionLevel>> = doc
            .sections
            .iter()
            .filter_map(|s| match s {
                Section::Content { heading, .. } => Some(heading.as_ref().map(|h| h.level)),
                _ => None,
            })
            .collect();
        assert_eq!(
            levels,
            vec![Some(SectionLevel::Chapter), Some(SectionLevel::Subsection), None]
        );
    }

    #[test]
    fn test_bibliography_only_at_depth_two() {
        let doc = build("# T\n---\n### Bibliography\ntext");
        assert!(matches!(doc.sections[1], Section::Content { .. }));
    }

    #[test]
    fn test_bibliography_collects_citations() {
        let extracted = extract("# T\n---\n## Body\nSee [^a].\n\n[^a]: Smith, 2020.");
        let doc = build_document(Metadata::default(), &extracted.markdown, &extracted.citations);
        match doc.sections.last().unwrap() {
            Section::Bibliography { paragraphs } => {
                assert_eq!(paragraphs.len(), 1);
                assert_eq!(paragraphs[0].kind, ParagraphKind::Citation { id: "a".into() });
                assert_eq!(paragraphs[0].content, "Smith, 2020.");
            }
            other => panic!("expected bibliography, got {:?}", other),
        }
    }

    #[test]
    fn test_divider_inside_fence_does_not_split() {
        let doc = build("# T\n---\n## Code\n```\n---\n```");
        assert_eq!(doc.sections.len(), 2);
    }
}
