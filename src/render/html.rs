//! HTML fragment rendering.
//!
//! The HTML path never walks the document tree. It runs the Markdown pass
//! over token-protected text, decodes the tokens and applies a few fixed
//! post-fixes to the resulting string.

use crate::config::{HtmlConfig, LiteralRewrite};
use crate::render::highlight::SyntaxHighlighter;
use crate::render::markdown::MarkdownRenderer;
use crate::render::math::{decode, LatexTarget};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static BLOCK_TOKEN_PARAGRAPH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<p>\s*(LATEX-(?:DISPLAY|ENV)-\d+-[0-9A-Za-z]*-END)\s*</p>").unwrap()
});
static DEFINITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<p>([^<:]+)<br\s*/?>\n?:\s*([^<]+)</p>").unwrap());
static FENCED_IN_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(<li[^>]*>)([^`]*?)```(\w*)(?:<br />)?\n(.*?)```(.*?</li>)").unwrap()
});

/// Renders token-protected Markdown into the final fragment markup.
pub struct HtmlRenderer<'a> {
    config: &'a HtmlConfig,
    markdown: &'a dyn MarkdownRenderer,
    highlighter: &'a dyn SyntaxHighlighter,
    target: &'a dyn LatexTarget,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(
        config: &'a HtmlConfig,
        markdown: &'a dyn MarkdownRenderer,
        highlighter: &'a dyn SyntaxHighlighter,
        target: &'a dyn LatexTarget,
    ) -> Self {
        Self {
            config,
            markdown,
            highlighter,
            target,
        }
    }

    /// Run the Markdown pass.
    pub fn render_markdown(&self, protected: &str) -> String {
        self.markdown.render(protected)
    }

    /// Turn protection tokens into math markup.
    pub fn decode_latex(&self, html: &str) -> String {
        decode(&unwrap_block_tokens(html), self.target)
    }

    /// Definition lists, code fences left inside list items, and the
    /// configured literal rewrites.
    pub fn post_process(&self, html: &str) -> String {
        let html = fix_definition_lists(html);
        let html = recover_fenced_code(&html, self.highlighter);
        apply_literal_rewrites(&html, &self.config.literal_rewrites)
    }
}

/// `<p>TOKEN</p>` → `TOKEN` for block-level tokens.
pub fn unwrap_block_tokens(html: &str) -> String {
    BLOCK_TOKEN_PARAGRAPH.replace_all(html, "$1").into_owned()
}

/// `<p>Term<br />\n: Definition</p>` → `<dl><dt>Term</dt><dd>Definition</dd></dl>`
pub fn fix_definition_lists(html: &str) -> String {
    DEFINITION
        .replace_all(html, |caps: &Captures| {
            let term = caps[1].trim();
            tracing::trace!(term, "definition list");
            format!("<dl><dt>{}</dt><dd>{}</dd></dl>", term, &caps[2])
        })
        .into_owned()
}

/// Replace a code fence that survived as text inside a list item with a
/// code block.
pub fn recover_fenced_code(html: &str, highlighter: &dyn SyntaxHighlighter) -> String {
    FENCED_IN_ITEM
        .replace_all(html, |caps: &Captures| {
            let language = if caps[3].is_empty() { "plaintext" } else { &caps[3] };
            let code = unescape_html(caps[4].replace("<br />", "").trim());
            let body = highlighter
                .highlight(&code, language)
                .unwrap_or_else(|| escape_html(&code));
            format!(
                "{}{}<pre><code class=\"language-{}\">{}</code></pre>{}",
                &caps[1], &caps[2], language, body, &caps[5]
            )
        })
        .into_owned()
}

pub fn apply_literal_rewrites(html: &str, rewrites: &[LiteralRewrite]) -> String {
    rewrites
        .iter()
        .fold(html.to_string(), |html, rewrite| html.replace(&rewrite.from, &rewrite.to))
}

/// Escape `&`, `<`, `>` and `"`.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Inverse of [`escape_html`].
pub fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::highlight::PlainHighlighter;
    use crate::render::markdown::PulldownRenderer;
    use crate::render::math::{encode, HtmlTarget};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_definition_lists() {
        assert_eq!(
            fix_definition_lists("<p>Truth<br />\n: What is the case.</p>"),
            "<dl><dt>Truth</dt><dd>What is the case.</dd></dl>"
        );
        assert_eq!(fix_definition_lists("<p>No definition</p>"), "<p>No definition</p>");
    }

    #[test]
    fn test_recover_fenced_code_in_list_item() {
        let html = "<li>Example:<br />\n```js<br />\nlet a = 1 &lt; 2;<br />\n```</li>";
        assert_eq!(
            recover_fenced_code(html, &PlainHighlighter),
            "<li>Example:<br />\n<pre><code class=\"language-js\">let a = 1 &lt; 2;</code></pre></li>"
        );
    }

    #[test]
    fn test_literal_rewrites() {
        let config = HtmlConfig::default();
        let html = r#"<a href="/encyclopedia/semantic-reference-theory.html" class="book-link">Meaning</a>"#;
        assert_eq!(
            apply_literal_rewrites(html, &config.literal_rewrites),
            r#"<a href="../encyclopedia/semantic-reference-theory.html" class="book-link">Meaning</a>"#
        );
    }

    #[test]
    fn test_display_math_is_not_wrapped_in_paragraph() {
        let config = HtmlConfig::default();
        let target = HtmlTarget::new();
        let markdown = PulldownRenderer::new(&PlainHighlighter);
        let renderer = HtmlRenderer::new(&config, &markdown, &PlainHighlighter, &target);

        let html = renderer.render_markdown(&encode("Before.\n\n$$x^2$$\n\nAfter $y$."));
        let html = renderer.decode_latex(&html);
        assert!(html.contains("<p>Before.</p>\n<div class=\"math math-display\">$$x^2$$</div>"));
        assert!(html.contains("<p>After <span class=\"math math-inline\">$y$</span>.</p>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
