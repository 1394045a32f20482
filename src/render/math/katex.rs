//! KaTeX passthrough target.

use super::{environment_parts, LatexTarget, TokenKind};
use crate::render::escape_html;

/// Environments rendered as titled blocks.
const KNOWN_ENVIRONMENTS: &[&str] = &[
    "theorem",
    "lemma",
    "proof",
    "definition",
    "example",
    "remark",
    "note",
    "corollary",
];

/// Leaves math as escaped LaTeX inside containers for KaTeX auto-render.
#[derive(Debug, Clone, Default)]
pub struct HtmlTarget;

impl HtmlTarget {
    pub fn new() -> Self {
        Self
    }
}

impl LatexTarget for HtmlTarget {
    fn display(&self, raw: &str) -> String {
        format!(r#"<div class="math math-display">{}</div>"#, escape_html(raw))
    }

    fn inline(&self, raw: &str) -> String {
        format!(r#"<span class="math math-inline">{}</span>"#, escape_html(raw))
    }

    fn environment(&self, raw: &str) -> String {
        match environment_parts(raw) {
            Some((name, body)) if KNOWN_ENVIRONMENTS.contains(&name) => format!(
                r#"<div class="latex-env {name}"><div class="env-title">{}</div><div class="env-content">{}</div></div>"#,
                title_case(name),
                escape_html(body.trim())
            ),
            _ => escape_html(raw),
        }
    }

    fn malformed(&self, kind: TokenKind) -> String {
        match kind {
            TokenKind::Inline => r#"<span class="math-error">Error</span>"#.to_string(),
            TokenKind::Display => {
                r#"<div class="math-error">Error decoding math expression</div>"#.to_string()
            }
            TokenKind::Environment => {
                r#"<div class="env-error">Error decoding environment</div>"#.to_string()
            }
        }
    }

    fn head_content(&self) -> Option<String> {
        Some(KATEX_HEAD.to_string())
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const KATEX_HEAD: &str = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css" crossorigin="anonymous">
<script defer src="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.js" crossorigin="anonymous"></script>
<script defer src="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/contrib/auto-render.min.js" crossorigin="anonymous"
    onload="renderMathInElement(document.body, {
        delimiters: [
            {left: '$$', right: '$$', display: true},
            {left: '$', right: '$', display: false}
        ]
    });"></script>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_math_containers_escape_html() {
        let target = HtmlTarget::new();
        assert_eq!(
            target.inline("$a < b$"),
            r#"<span class="math math-inline">$a &lt; b$</span>"#
        );
        assert_eq!(
            target.display("$$x^2$$"),
            r#"<div class="math math-display">$$x^2$$</div>"#
        );
    }

    #[test]
    fn test_known_environment_is_titled() {
        let html = HtmlTarget::new().environment("\\begin{lemma}\nA & B.\n\\end{lemma}");
        assert_eq!(
            html,
            r#"<div class="latex-env lemma"><div class="env-title">Lemma</div><div class="env-content">A &amp; B.</div></div>"#
        );
    }

    #[test]
    fn test_unknown_environment_passes_through() {
        let raw = "\\begin{tikzpicture}<x>\\end{tikzpicture}";
        assert_eq!(
            HtmlTarget::new().environment(raw),
            "\\begin{tikzpicture}&lt;x&gt;\\end{tikzpicture}"
        );
    }
}
