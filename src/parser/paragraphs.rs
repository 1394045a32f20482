//! Paragraph splitting and classification.

use crate::ast::{Annotations, Paragraph, ParagraphKind};
use crate::parser::lexer::{fence, is_comment, list_marker};

/// Split section content into paragraphs on blank-line runs.
///
/// Fenced code blocks are kept whole even when they contain blank lines.
pub fn split_paragraphs(text: &str) -> Vec<Paragraph> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        if fence(line.trim_start()).is_ok() {
            in_fence = !in_fence;
            current.push(line);
            continue;
        }
        if !in_fence && line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks.into_iter().map(|lines| classify(&lines)).collect()
}

/// Classify one block, peeling comment lines off both ends.
pub fn classify(lines: &[&str]) -> Paragraph {
    let lead = lines.iter().take_while(|l| is_comment(l)).count();
    if lead == lines.len() {
        return Paragraph {
            kind: ParagraphKind::Comment,
            content: lines.join("\n"),
            annotations: Annotations::default(),
        };
    }
    let trail = lines[lead..].iter().rev().take_while(|l| is_comment(l)).count();
    let body = &lines[lead..lines.len() - trail];

    let annotations = Annotations {
        pre: lines[..lead].iter().map(|l| l.trim().to_string()).collect(),
        post: lines[lines.len() - trail..].iter().map(|l| l.trim().to_string()).collect(),
    };

    let first = body[0].trim_start();
    let (kind, content) = if let Ok((_, info)) = fence(first) {
        let language = info.split_whitespace().next().map(str::to_string);
        let mut inner = &body[1..];
        if let Some((last, rest)) = inner.split_last() {
            if fence(last.trim_start()).is_ok() {
                inner = rest;
            }
        }
        (ParagraphKind::Code { language }, inner.join("\n"))
    } else if first.starts_with('>') {
        (ParagraphKind::Blockquote, body.join("\n"))
    } else if let Ok((_, ordered)) = list_marker(first) {
        (ParagraphKind::List { ordered }, body.join("\n"))
    } else {
        (ParagraphKind::Text, body.join("\n"))
    };

    Paragraph {
        kind,
        content,
        annotations,
    }
}
