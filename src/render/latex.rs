//! LaTeX code generation from the document tree.

use crate::ast::{
    DocumentNode, KeywordsSection, Paragraph, ParagraphKind, Section, TitleSection,
};
use crate::config::LibraryConfig;
use crate::error::{ConfigError, Result};
use crate::parser::lexer::{is_comment, list_marker};
use crate::paths::PathResolver;
use crate::resolve::links::decode_href;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fs;

/// Placeholder replaced by the rendered body.
pub const CONTENT_PLACEHOLDER: &str = "%%CONTENT%%";

/// Substrings that mark text as already converted.
const LATEX_COMMANDS: &[&str] = &[
    "\\emph{",
    "\\textbf{",
    "\\texttt{",
    "\\lib{",
    "\\href{",
    "\\cite{",
];

static INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"`([^`]+)`|\*\*(.+?)\*\*|\*([^*]+?)\*|\[([^\]]+)\]\(([^)]+)\)").unwrap()
});
static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--(.*?)-->").unwrap());
static QUOTE_OPEN_TWICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\begin\{quote\}\s*\\begin\{quote\}").unwrap());
static QUOTE_CLOSE_TWICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\end\{quote\}\s*\\end\{quote\}").unwrap());
static BARE_AMPERSAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^\\])&").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static SECTION_THEN_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\\(?:chapter|section|subsection|subsubsection)\{[^}\n]*\})\n\n%").unwrap()
});

/// Walks a [`DocumentNode`] and emits the LaTeX body.
#[derive(Debug, Clone, Copy)]
pub struct LatexRenderer<'a> {
    resolver: PathResolver<'a>,
    config: &'a LibraryConfig,
}

impl<'a> LatexRenderer<'a> {
    pub fn new(config: &'a LibraryConfig) -> Self {
        Self {
            resolver: PathResolver::new(config),
            config,
        }
    }

    /// Render every section, in order.
    pub fn render(&self, document: &DocumentNode) -> String {
        document
            .sections
            .iter()
            .map(|section| self.section(section))
            .collect()
    }

    fn section(&self, section: &Section) -> String {
        match section {
            Section::Title(title) => self.title(title),
            Section::Abstract {
                paragraphs,
                keywords,
            } => {
                let body = self.paragraphs(paragraphs);
                let keywords = if keywords.is_empty() {
                    String::new()
                } else {
                    let lines: Vec<String> = keywords.iter().map(keywords_line).collect();
                    format!("\n\n{}", lines.join("\n"))
                };
                format!("\\begin{{abstract}}\n{}{}\n\\end{{abstract}}\n\n", body, keywords)
            }
            Section::Keywords(keywords) => format!("{}\n\n", keywords_line(keywords)),
            Section::Bibliography { paragraphs } => self.bibliography(paragraphs),
            Section::Content {
                heading,
                paragraphs,
            } => {
                let mut out = String::new();
                if let Some(heading) = heading {
                    out.push_str(&format!(
                        "\\{}{{{}}}\n\n",
                        heading.level.command_name(),
                        self.inline(&heading.text)
                    ));
                }
                out.push_str(&self.paragraphs(paragraphs));
                out.push_str("\n\n");
                out
            }
        }
    }

    fn title(&self, title: &TitleSection) -> String {
        let mut out = String::new();
        if !title.text.is_empty() {
            let text = escape_latex(&title.text);
            let line = match &title.link {
                Some(link) => format!("\\href{{{}}}{{{}}}", escape_url(&self.absolute_url(link)), text),
                None => text,
            };
            out.push_str(&format!(
                "\\begin{{center}}\n    {{\\Large\\bfseries\\boldmath\n        {}\n        \\par}}\n    \\vskip 0.8cm\n\\end{{center}}\n\n",
                line
            ));
        }
        if !title.paragraphs.is_empty() {
            out.push_str(&self.paragraphs(&title.paragraphs));
            out.push_str("\n\n");
        }
        out
    }

    fn bibliography(&self, paragraphs: &[Paragraph]) -> String {
        let (entries, other): (Vec<&Paragraph>, Vec<&Paragraph>) = paragraphs
            .iter()
            .partition(|p| matches!(p.kind, ParagraphKind::Citation { .. }));

        let mut out = String::new();
        for paragraph in other {
            out.push_str(&self.paragraph(paragraph));
            out.push_str("\n\n");
        }
        if entries.is_empty() {
            return out;
        }

        out.push_str("\\begin{thebibliography}{99}\n\n");
        for entry in entries {
            out.push_str(&self.paragraph(entry));
            out.push_str("\n\n");
        }
        out.push_str("\\end{thebibliography}\n\n");
        out
    }

    fn paragraphs(&self, paragraphs: &[Paragraph]) -> String {
        paragraphs
            .iter()
            .map(|p| self.paragraph(p))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn paragraph(&self, paragraph: &Paragraph) -> String {
        let body = match &paragraph.kind {
            ParagraphKind::Text => self.inline(&paragraph.content),
            ParagraphKind::Blockquote => {
                let lines: Vec<&str> = paragraph
                    .content
                    .lines()
                    .map(|line| line.trim_start().trim_start_matches('>').trim())
                    .filter(|line| !line.is_empty())
                    .collect();
                format!("\\begin{{quote}}\n{}\n\\end{{quote}}", self.inline(&lines.join("\n")))
            }
            ParagraphKind::List { ordered } => self.list(&paragraph.content, *ordered),
            ParagraphKind::Citation { id } => {
                format!("\\bibitem{{{}}} {}", id, self.inline(&paragraph.content))
            }
            ParagraphKind::Code { .. } => {
                format!("\\begin{{verbatim}}\n{}\n\\end{{verbatim}}", paragraph.content)
            }
            ParagraphKind::Comment => paragraph.content.clone(),
        };

        let annotations = &paragraph.annotations;
        let mut parts: Vec<&str> = annotations.pre.iter().map(String::as_str).collect();
        parts.push(&body);
        parts.extend(annotations.post.iter().map(String::as_str));
        parts.join("\n")
    }

    fn list(&self, content: &str, ordered: bool) -> String {
        let mut items: Vec<String> = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match list_marker(line) {
                Ok((item, _)) => items.push(item.trim().to_string()),
                Err(_) => match items.last_mut() {
                    Some(last) => {
                        last.push(' ');
                        last.push_str(line);
                    }
                    None => items.push(line.to_string()),
                },
            }
        }

        let environment = if ordered { "enumerate" } else { "itemize" };
        let items: Vec<String> = items
            .iter()
            .map(|item| format!("\\item {}", self.inline(item)))
            .collect();
        format!(
            "\\begin{{{env}}}\n{}\n\\end{{{env}}}",
            items.join("\n"),
            env = environment
        )
    }

    /// Inline code, bold, italic and links; plain runs are escaped.
    /// Bold, italic and link text are formatted recursively.
    pub fn inline(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;

        for caps in INLINE.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&escape_latex(&text[pos..whole.start()]));
            out.push_str(&self.inline_span(&caps));
            pos = whole.end();
        }
        out.push_str(&escape_latex(&text[pos..]));
        out
    }

    fn inline_span(&self, caps: &Captures) -> String {
        if let Some(code) = caps.get(1) {
            format!("\\texttt{{{}}}", escape_latex(code.as_str()))
        } else if let Some(bold) = caps.get(2) {
            format!("\\textbf{{{}}}", self.inline(bold.as_str()))
        } else if let Some(italic) = caps.get(3) {
            format!("\\emph{{{}}}", self.inline(italic.as_str()))
        } else if let (Some(text), Some(href)) = (caps.get(4), caps.get(5)) {
            self.link(&self.inline(text.as_str()), href.as_str())
        } else {
            caps[0].to_string()
        }
    }

    /// The three internal link shapes map to `\lib` or `\href`; anything
    /// that is not a Markdown file becomes a plain `\href`.
    fn link(&self, text: &str, href: &str) -> String {
        let href = href
            .strip_prefix('<')
            .and_then(|inner| inner.strip_suffix('>'))
            .unwrap_or(href);
        let target = decode_href(href);
        let path = target.split('#').next().unwrap_or(&target);
        if !path.ends_with(".md") || target.contains("://") {
            return format!("\\href{{{}}}{{{}}}\\xspace", escape_url(href), text);
        }

        let public = self.resolver.md_to_html_link(&target);
        if public.starts_with("../../") {
            let segments: Vec<&str> = public.split('/').collect();
            let tail = segments[segments.len().saturating_sub(2)..].join("/");
            format!("\\lib{{/{}}}{{{}}}", escape_url(&tail), text)
        } else if let Some(local) = public.strip_prefix("./") {
            format!("\\lib{{/{}}}{{{}}}", escape_url(local), text)
        } else {
            format!(
                "\\href{{{}}}{{{}}}\\xspace",
                escape_url(&self.absolute_url(&target)),
                text
            )
        }
    }

    /// A site URL for a Markdown link, or the link itself otherwise.
    fn absolute_url(&self, href: &str) -> String {
        let path = href.split('#').next().unwrap_or(href);
        if !path.ends_with(".md") || href.contains("://") {
            return href.to_string();
        }
        let public = self.resolver.md_to_html_link(href);
        let relative = public
            .trim_start_matches('/')
            .split('/')
            .skip_while(|segment| *segment == "." || *segment == "..")
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.config.site_base_url.trim_end_matches('/'), relative)
    }
}

fn keywords_line(keywords: &KeywordsSection) -> String {
    let mut lines = keywords.annotations.clone();
    lines.push(format!(
        "\\keywords{{{}.}}",
        keywords
            .keywords
            .iter()
            .map(|k| escape_latex(k))
            .collect::<Vec<_>>()
            .join(" \\and ")
    ));
    lines.join("\n")
}

/// Escape the ten reserved LaTeX characters.
///
/// Text that already contains one of the converted-span commands (`\emph{`,
/// `\textbf{`, `\texttt{`, `\lib{`, `\href{`, `\cite{`) is returned as-is.
/// Comment lines are left alone.
pub fn escape_latex(text: &str) -> String {
    if LATEX_COMMANDS.iter().any(|command| text.contains(command)) {
        return text.to_string();
    }

    text.split('\n')
        .map(|line| {
            if is_comment(line) {
                line.to_string()
            } else {
                escape_line(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '$' => out.push_str("\\$"),
            '&' => out.push_str("\\&"),
            '#' => out.push_str("\\#"),
            '_' => out.push_str("\\_"),
            '%' => out.push_str("\\%"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            c => out.push(c),
        }
    }
    out
}

fn escape_url(url: &str) -> String {
    url.replace('%', "\\%").replace('#', "\\#")
}

/// `<!-- note -->` → `% note`, one `%` per line.
pub fn convert_comments(markdown: &str) -> String {
    HTML_COMMENT
        .replace_all(markdown, |caps: &Captures| {
            caps[1]
                .trim()
                .lines()
                .map(|line| format!("% {}", line.trim()))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .into_owned()
}

/// The built-in llncs template.
pub fn default_template(site_base_url: &str) -> String {
    format!(
        r"\documentclass[runningheads]{{llncs}}
\usepackage[T1]{{fontenc}}
\usepackage{{graphicx}}
\usepackage{{xcolor}}
\usepackage{{soul}}
\usepackage{{etoolbox}}
\usepackage{{xspace}}
\usepackage[hyphens]{{url}}
\usepackage[hidelinks]{{hyperref}}
\usepackage{{amsmath}}
\usepackage{{amssymb}}
\hbadness=10000

% Custom commands for library links
\newcommand{{\lib}}[2]{{\href{{{}#1}}{{#2}}\xspace}}

\begin{{document}}

{}

\end{{document}}
",
        site_base_url.trim_end_matches('/'),
        CONTENT_PLACEHOLDER
    )
}

/// The configured template, or the built-in one.
pub fn load_template(config: &LibraryConfig) -> Result<String> {
    let Some(path) = &config.latex.template else {
        return Ok(default_template(&config.site_base_url));
    };

    let template = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.clone(),
        source,
    })?;
    if !template.contains(CONTENT_PLACEHOLDER) {
        return Err(ConfigError::MissingTemplatePlaceholder(path.display().to_string()).into());
    }
    Ok(template)
}

/// Substitute the body into the template.
pub fn assemble(template: &str, body: &str) -> String {
    template.replacen(CONTENT_PLACEHOLDER, body.trim_end(), 1)
}

/// Whole-document repairs: merged nested quotes, bare ampersands outside
/// verbatim blocks and comments, at most one blank line in a row, and no
/// blank line between a sectioning command and a comment.
pub fn post_fix(latex: &str) -> String {
    let latex = QUOTE_OPEN_TWICE.replace_all(latex, "\\begin{quote}");
    let latex = QUOTE_CLOSE_TWICE.replace_all(&latex, "\\end{quote}");
    let latex = escape_bare_ampersands(&latex);
    let latex = BLANK_RUN.replace_all(&latex, "\n\n");
    SECTION_THEN_COMMENT.replace_all(&latex, "$1\n%").into_owned()
}

fn escape_bare_ampersands(latex: &str) -> String {
    let mut in_verbatim = false;
    latex
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed == "\\begin{verbatim}" {
                in_verbatim = true;
            } else if trimmed == "\\end{verbatim}" {
                in_verbatim = false;
            }
            if in_verbatim || is_comment(line) {
                line.to_string()
            } else {
                BARE_AMPERSAND.replace_all(line, "$1\\&").into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
