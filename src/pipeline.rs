//! The two compilation pipelines as explicit, ordered stages.
//!
//! HTML:
//!
//! ```text
//! parse-metadata → extract-citations → format-citations → encode-latex
//!   → render-markdown → decode-latex → resolve-references
//!   → attach-bibliography → html-fixes → rewrite-links
//! ```
//!
//! LaTeX:
//!
//! ```text
//! parse-metadata → convert-comments → extract-citations → encode-latex
//!   → build-document → render-latex → assemble-template → post-fix
//!   → cite-references → decode-latex
//! ```
//!
//! Every stage consumes the previous stage's output type. Citations are
//! pulled out before math is protected so a `$` inside a citation is never
//! tokenized, and math is protected before any Markdown or LaTeX escaping
//! touches it.

use crate::ast::{DocumentNode, Metadata};
use crate::config::LibraryConfig;
use crate::error::Result;
use crate::parser::{build_document, parse_metadata, ParsedDocument};
use crate::paths::PathResolver;
use crate::render::html::HtmlRenderer;
use crate::render::latex::{assemble, convert_comments, load_template, post_fix, LatexRenderer};
use crate::render::math::{self, create_target, LatexTarget, MathTarget, RawTarget};
use crate::render::page::render_page;
use crate::render::{MarkdownRenderer, PlainHighlighter, PulldownRenderer, SyntaxHighlighter};
use crate::resolve::{
    attach_bibliography, extract, format_citations, render_bibliography, resolve_references,
    resolve_references_latex, BibtexFormatter, CitationFormatter, CitationTable, Extracted,
    LinkRewriter,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Markdown with math and environments replaced by protection tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Protected(pub String);

/// HTML straight out of the Markdown pass, tokens still in place.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedHtml(pub String);

/// A LaTeX document before tokens are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledLatex(pub String);

/// Result of the HTML pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlOutput {
    /// Body content, without page chrome.
    pub fragment: String,
    pub metadata: Metadata,
    pub citations: CitationTable,
    /// Source path, used for the GitHub link on the full page.
    pub source_path: Option<PathBuf>,
}

impl HtmlOutput {
    /// Wrap the fragment in a full page.
    pub fn to_page(&self, config: &LibraryConfig) -> String {
        render_page(
            &self.fragment,
            &self.metadata,
            self.source_path.as_deref(),
            config,
        )
    }
}

fn stage(name: &'static str) {
    tracing::debug!(stage = name, "running stage");
}

/// Markdown → HTML fragment.
pub struct HtmlPipeline<'a> {
    config: &'a LibraryConfig,
    /// `None` runs [`PulldownRenderer`] with the pipeline's highlighter.
    markdown: Option<Box<dyn MarkdownRenderer + 'a>>,
    formatter: Box<dyn CitationFormatter>,
    highlighter: Box<dyn SyntaxHighlighter>,
    target: Box<dyn LatexTarget>,
}

impl<'a> HtmlPipeline<'a> {
    pub fn new(config: &'a LibraryConfig) -> Self {
        Self {
            config,
            markdown: None,
            formatter: Box::new(BibtexFormatter),
            highlighter: Box::new(PlainHighlighter),
            target: create_target(MathTarget::Html),
        }
    }

    /// Replace the Markdown pass. The renderer must leave protection
    /// tokens intact.
    pub fn with_markdown_renderer(mut self, markdown: Box<dyn MarkdownRenderer + 'a>) -> Self {
        self.markdown = Some(markdown);
        self
    }

    pub fn with_formatter(mut self, formatter: Box<dyn CitationFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_highlighter(mut self, highlighter: Box<dyn SyntaxHighlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    pub fn run(&self, markdown: &str, source_path: Option<&Path>) -> HtmlOutput {
        let pulldown;
        let markdown_renderer: &dyn MarkdownRenderer = match &self.markdown {
            Some(markdown) => markdown.as_ref(),
            None => {
                pulldown = PulldownRenderer::new(self.highlighter.as_ref());
                &pulldown
            }
        };
        let renderer = HtmlRenderer::new(
            &self.config.html,
            markdown_renderer,
            self.highlighter.as_ref(),
            self.target.as_ref(),
        );

        stage("parse-metadata");
        let ParsedDocument { metadata, body } = parse_metadata(markdown);

        stage("extract-citations");
        let Extracted {
            markdown: body,
            citations,
        } = extract(&body);

        stage("format-citations");
        let citations = format_citations(citations, self.formatter.as_ref());

        stage("encode-latex");
        let protected = Protected(math::encode(&body));

        stage("render-markdown");
        let rendered = RenderedHtml(renderer.render_markdown(&protected.0));

        stage("decode-latex");
        let html = renderer.decode_latex(&rendered.0);

        stage("resolve-references");
        let html = resolve_references(&html, &citations);

        stage("attach-bibliography");
        let html = attach_bibliography(&html, &render_bibliography(&citations));

        stage("html-fixes");
        let html = renderer.post_process(&html);

        stage("rewrite-links");
        let fragment = LinkRewriter::new(PathResolver::new(self.config)).rewrite(&html);

        HtmlOutput {
            fragment,
            metadata,
            citations,
            source_path: source_path.map(Path::to_path_buf),
        }
    }
}

/// Markdown → LaTeX document.
pub struct LatexPipeline<'a> {
    config: &'a LibraryConfig,
}

impl<'a> LatexPipeline<'a> {
    pub fn new(config: &'a LibraryConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, markdown: &str) -> Result<String> {
        stage("parse-metadata");
        let ParsedDocument { metadata, body } = parse_metadata(markdown);

        stage("convert-comments");
        let body = convert_comments(&body);

        stage("extract-citations");
        let Extracted {
            markdown: body,
            citations,
        } = extract(&body);

        stage("encode-latex");
        let protected = Protected(math::encode(&body));

        stage("build-document");
        let document: DocumentNode = build_document(metadata, &protected.0, &citations);

        stage("render-latex");
        let rendered = LatexRenderer::new(self.config).render(&document);

        stage("assemble-template");
        let template = load_template(self.config)?;
        let assembled = AssembledLatex(assemble(&template, &rendered));

        stage("post-fix");
        let fixed = post_fix(&assembled.0);

        stage("cite-references");
        let cited = resolve_references_latex(&fixed);

        stage("decode-latex");
        Ok(math::decode(&cited, &RawTarget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_html_pipeline_math_and_citations() {
        let config = LibraryConfig::default();
        let output = HtmlPipeline::new(&config).run(
            "Mass $E = mc^2$ as shown[^einstein].\n\n[^einstein]: Einstein, A. (1905). *Annalen der Physik*.",
            None,
        );

        assert!(output
            .fragment
            .contains(r#"<span class="math math-inline">$E = mc^2$</span>"#));
        assert!(output.fragment.contains(
            r##"<sup><a href="#citation-einstein" id="citation-ref-einstein" class="citation-ref">[1]</a></sup>"##
        ));
        assert!(output
            .fragment
            .contains("Einstein, A. (1905). <em>Annalen der Physik</em>."));
        assert_eq!(output.citations.len(), 1);
    }

    /// Wraps every line in `<p>` and nothing else.
    struct LineRenderer;

    impl MarkdownRenderer for LineRenderer {
        fn render(&self, markdown: &str) -> String {
            markdown
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| format!("<p>{}</p>\n", line))
                .collect()
        }
    }

    #[test]
    fn test_html_pipeline_with_custom_markdown_renderer() {
        let config = LibraryConfig::default();
        let output = HtmlPipeline::new(&config)
            .with_markdown_renderer(Box::new(LineRenderer))
            .run("Mass $E = mc^2$ holds.\n\n$$x^2$$\n\nAs shown[^k].\n\n[^k]: Knuth.", None);

        assert!(output
            .fragment
            .contains(r#"<p>Mass <span class="math math-inline">$E = mc^2$</span> holds.</p>"#));
        assert!(output
            .fragment
            .contains(r#"<div class="math math-display">$$x^2$$</div>"#));
        assert!(output.fragment.contains(r##"href="#citation-k""##));
        assert!(!output.fragment.contains("LATEX-"));
        assert!(!output.fragment.contains("CITATION-REF"));
    }

    #[test]
    fn test_latex_pipeline_keeps_math_and_cites() {
        let config = LibraryConfig::default();
        let latex = LatexPipeline::new(&config)
            .run("# Title\n---\n## Results\nWe have $a_1 + b$ and\n\n$$x^2$$\n\nSee [^k].\n\n[^k]: Knuth.")
            .unwrap();

        assert!(latex.contains("\\section{Results}"));
        assert!(latex.contains("We have $a_1 + b$ and"));
        assert!(latex.contains("$$x^2$$"));
        assert!(latex.contains("See \\cite{k}."));
        assert!(latex.contains("\\bibitem{k} Knuth."));
        assert!(!latex.contains("LATEX-"));
        assert!(!latex.contains("CITATION-REF"));
    }

    #[test]
    fn test_latex_pipeline_comments() {
        let config = LibraryConfig::default();
        let latex = LatexPipeline::new(&config)
            .run("# T\n---\n## S\n<!-- reviewer note -->\nBody.")
            .unwrap();
        assert!(latex.contains("\\section{S}\n% reviewer note\nBody."));
    }
}
