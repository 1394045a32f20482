//! # markdown-duality
//!
//! Compile one library of Markdown documents to two targets, an HTML site
//! and camera-ready LaTeX, while keeping every cross-reference consistent
//! between the source tree, the public tree and the GitHub repository.
//!
//! ## Features
//!
//! - **Path namespaces**: `Books/01 - On Truth.md` publishes as
//!   `books/on-truth.html`, with links, anchors and GitHub source links
//!   rewritten to match
//! - **Metadata**: `# Header` / `# Footer` blocks of `- key: value` entries
//!   drive navigation, related links and notes
//! - **Math protection**: `$...$`, `$$...$$` and `\begin{env}...\end{env}`
//!   survive the Markdown pass untouched
//! - **Citations**: `[^id]` references with `[^id]: ...` definitions
//!   (plain text or BibTeX), numbered in order of definition
//! - **LaTeX**: an `llncs` paper with title, abstract, keywords, sections
//!   and a bibliography
//!
//! ## Quick Start
//!
//! ```rust
//! use markdown_duality::{compile_html, compile_latex, LibraryConfig};
//!
//! let input = "# Title\n---\n## Results\nWe find $E = mc^2$[^einstein].\n\n[^einstein]: Einstein, A. (1905).\n";
//! let config = LibraryConfig::default();
//!
//! let html = compile_html(input, None, &config);
//! assert!(html.fragment.contains("math-inline"));
//!
//! let latex = compile_latex(input, &config).unwrap();
//! assert!(latex.contains("\\cite{einstein}"));
//! ```
//!
//! ## Document Layout
//!
//! ```text
//! # Header
//! - book: [Essays](../.books.md)
//! - next: [Chapter Two](02 - Chapter Two.md)
//! # [On Truth](01 - On Truth.md)
//! ---
//! ## Abstract
//! One paragraph summary.
//! ---
//! ### Keywords
//! - truth
//! - reference
//! ---
//! ## The Claim
//! Body text with a citation[^frege].
//!
//! [^frege]: Frege, G. (1892). *Über Sinn und Bedeutung*.
//! # Footer
//! - related:
//!   - [Meaning](../Encyclopedia/Meaning.md)
//! ### Thoughts
//!   - Is truth a property?
//! ```
//!
//! `---` lines split the body into sections for the LaTeX renderer; the
//! HTML renderer treats them as ordinary thematic breaks.
//!
//! ## Command Line
//!
//! With the default `cli` feature the `duality` binary compiles single
//! files (`duality html`, `duality tex`), whole libraries (`duality build`)
//! and checks the public tree against the sources (`duality verify`).

pub mod ast;
pub mod bibtex;
pub mod config;
pub mod error;
pub mod library;
pub mod parser;
pub mod paths;
pub mod pipeline;
pub mod render;
pub mod resolve;

pub use ast::{DocumentNode, Metadata};
pub use config::LibraryConfig;
pub use error::{ConfigError, Error, FormatError, PathError, Result};
pub use paths::{normalize_anchor_id, normalize_name, Manifest, PathResolver};
pub use pipeline::{HtmlOutput, HtmlPipeline, LatexPipeline};
pub use resolve::{CitationFormatter, CitationTable, LinkRewriter};

use std::path::Path;

/// Compile one Markdown document to an HTML fragment.
///
/// `source_path` is only used for the GitHub link when the output is later
/// wrapped with [`HtmlOutput::to_page`].
///
/// # Example
///
/// ```rust
/// use markdown_duality::{compile_html, LibraryConfig};
///
/// let output = compile_html("See [the claim](<On Truth.md#The Claim>).", None, &LibraryConfig::default());
/// assert!(output.fragment.contains(r#"href="on-truth.html#the-claim""#));
/// ```
pub fn compile_html(markdown: &str, source_path: Option<&Path>, config: &LibraryConfig) -> HtmlOutput {
    HtmlPipeline::new(config).run(markdown, source_path)
}

/// Compile one Markdown document to a complete LaTeX file.
///
/// Fails only when a configured template cannot be used.
pub fn compile_latex(markdown: &str, config: &LibraryConfig) -> Result<String> {
    LatexPipeline::new(config).run(markdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    const DOCUMENT: &str = "# Header\n- title: [T](t.md)\n# [T](t.md)\n---\n## Section\nHello *world*.\n";

    #[test]
    fn test_full_pipeline_latex() {
        let latex = compile_latex(DOCUMENT, &LibraryConfig::default()).unwrap();

        assert!(latex.contains("\\documentclass"));
        assert!(latex.contains("\\section{Section}"));
        assert!(latex.contains("\\emph{world}"));
        assert!(!latex.contains("%%CONTENT%%"));
    }

    #[test]
    fn test_full_pipeline_html() {
        let output = compile_html(DOCUMENT, None, &LibraryConfig::default());

        assert!(output.fragment.contains("<em>world</em>"));
        assert_eq!(output.metadata.title.as_ref().map(|t| t.text.as_str()), Some("T"));

        let href = Regex::new(r#"href="([^"]*)""#).unwrap();
        for caps in href.captures_iter(&output.fragment) {
            assert!(!caps[1].ends_with(".md"), "unrewritten link {}", &caps[1]);
        }
    }

    #[test]
    fn test_document_layout_footer() {
        let input = "# Essay\nText.\n# Footer\n- related:\n  - [Meaning](../Encyclopedia/Meaning.md)\n### Thoughts\n  - Is truth a property?\n";
        let output = compile_html(input, None, &LibraryConfig::default());

        assert_eq!(output.metadata.related.len(), 1);
        assert_eq!(output.metadata.related[0].text, "Meaning");
        assert_eq!(output.metadata.notes, vec!["Is truth a property?"]);
    }

    #[test]
    fn test_escaped_links_agree_with_published_names() {
        let config = LibraryConfig::default();
        let resolver = PathResolver::new(&config);

        let output = compile_html("See [x](<Truth & Proof.md>) and [y](<Gödel.md>).", None, &config);
        for source in ["library/Truth & Proof.md", "library/Gödel.md"] {
            let public = resolver.source_to_public(Path::new(source));
            let name = public.file_name().unwrap().to_string_lossy();
            assert!(output.fragment.contains(&format!(r#"href="{}""#, name)), "{}", output.fragment);
        }

        let output = compile_html("## The Claim\n\nSee [x](<#The Claim>).", None, &config);
        assert!(output.fragment.contains(r#"<h2 id="the-claim">"#));
        assert!(output.fragment.contains(r##"href="#the-claim""##));
    }

    #[test]
    fn test_same_link_in_html_and_latex() {
        let config = LibraryConfig::default();
        let input = "# T\n---\n## S\nSee [the claim](<./On Truth.md#The Claim>).";

        let html = compile_html(input, None, &config);
        assert!(html.fragment.contains(r#"href="./on-truth.html#the-claim""#));

        let latex = compile_latex(input, &config).unwrap();
        assert!(latex.contains("\\lib{/on-truth.html\\#the-claim}{the claim}"));
    }

    #[test]
    fn test_code_is_not_protected() {
        let input = "Inline `$x$` code.\n\n```\n$$y$$\n```\n";
        let output = compile_html(input, None, &LibraryConfig::default());

        assert!(output.fragment.contains("<code>$x$</code>"));
        assert!(output.fragment.contains("$$y$$"));
        assert!(!output.fragment.contains("math-inline"));
        assert!(!output.fragment.contains("LATEX-"));
    }

    #[test]
    fn test_environment_round_trip() {
        let input = "\\begin{theorem}\nEvery $n$ is interesting.\n\\end{theorem}\n";
        let config = LibraryConfig::default();

        let html = compile_html(input, None, &config);
        assert!(html.fragment.contains(r#"<div class="latex-env theorem">"#));

        let latex = compile_latex(&format!("# T\n---\n## S\n{}", input), &config).unwrap();
        assert!(latex.contains("\\begin{theorem}\nEvery $n$ is interesting.\n\\end{theorem}"));
    }
}
