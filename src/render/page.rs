//! Full page assembly around a rendered fragment.

use crate::ast::{MetaLink, Metadata};
use crate::config::LibraryConfig;
use crate::paths::PathResolver;
use crate::render::escape_html;
use crate::render::math::{HtmlTarget, LatexTarget};
use std::fmt::Write;
use std::path::Path;

/// Wrap `fragment` in a complete HTML document with the navigation header,
/// the thoughts modal and the related-links footer.
pub fn render_page(
    fragment: &str,
    metadata: &Metadata,
    source_path: Option<&Path>,
    config: &LibraryConfig,
) -> String {
    let resolver = PathResolver::new(config);
    let title = metadata
        .title
        .as_ref()
        .map(|t| t.text.as_str())
        .unwrap_or("Untitled");

    let mut body = header(metadata, &resolver);
    if let Some(title) = &metadata.title {
        let href = source_path
            .map(|path| resolver.source_reference_url(path))
            .unwrap_or_else(|| config.repository.url.clone());
        let _ = write!(
            body,
            "\n<h1 class=\"entry-title\"><a href=\"{}\" class=\"github-source-link\">{}</a></h1>",
            escape_html(&href),
            escape_html(&title.text)
        );
    }
    body.push_str(&thoughts_modal(&metadata.notes));

    let head = HtmlTarget::new().head_content().unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} | {site}</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/github-markdown-css@5.1.0/github-markdown.min.css">
    {head}
  </head>
  <body>
    <div class="container">
      {body}

      <div class="article-container">
        <article class="markdown-body">
          {fragment}
        </article>
      </div>

      {footer}
    </div>
  </body>
</html>
"#,
        title = escape_html(title),
        site = escape_html(&config.html.site_title),
        head = head,
        body = body,
        fragment = fragment,
        footer = footer(metadata, &resolver, &config.repository.url),
    )
}

fn page_link(resolver: &PathResolver<'_>, link: &MetaLink) -> String {
    escape_html(&resolver.md_to_html_link(&link.link))
}

fn header(metadata: &Metadata, resolver: &PathResolver<'_>) -> String {
    let source = metadata
        .collection
        .as_ref()
        .map(|c| ("From", c))
        .or_else(|| metadata.subject.as_ref().map(|s| ("Subject", s)));

    if source.is_none()
        && metadata.previous.is_none()
        && metadata.next.is_none()
        && metadata.notes.is_empty()
    {
        return String::new();
    }

    let mut html = String::from(
        "<header class=\"academic-header\">\n  <div class=\"header-left\">\n    <a href=\"index.html\" class=\"index-link\" title=\"Return to Library Index\">Index</a>",
    );
    if let Some((label, link)) = source {
        let _ = write!(
            html,
            "\n    <div class=\"book-info\">\n      <span class=\"book-label\">{}</span>\n      <a href=\"{}\" class=\"book-link\">{}</a>\n    </div>",
            label,
            page_link(resolver, link),
            escape_html(&link.text)
        );
    }
    html.push_str("\n  </div>\n  <div class=\"navigation-controls\">");

    if let Some(previous) = &metadata.previous {
        let _ = write!(
            html,
            "\n    <a href=\"{}\" class=\"nav-link prev-link\" title=\"{}\"><span class=\"nav-arrow\"></span><span class=\"nav-text\">Previous</span></a>",
            page_link(resolver, previous),
            escape_html(&previous.text)
        );
    }
    if let Some(next) = &metadata.next {
        let _ = write!(
            html,
            "\n    <a href=\"{}\" class=\"nav-link next-link\" title=\"{}\"><span class=\"nav-text\">Next</span><span class=\"nav-arrow\"></span></a>",
            page_link(resolver, next),
            escape_html(&next.text)
        );
    }
    if !metadata.notes.is_empty() {
        html.push_str("\n    <button type=\"button\" class=\"thoughts-button\" title=\"Show questions and thoughts\" aria-label=\"Show thoughts\">?</button>");
    }
    html.push_str("\n  </div>\n</header>");
    html
}

fn thoughts_modal(notes: &[String]) -> String {
    if notes.is_empty() {
        return String::new();
    }
    let mut html = String::from(
        "\n<div class=\"thoughts-modal\" id=\"thoughtsModal\">\n  <div class=\"thoughts-modal-content\">\n    <div class=\"thoughts-modal-header\">\n      <h3>Thoughts &amp; Questions</h3>\n      <button type=\"button\" class=\"close-thoughts\">&times;</button>\n    </div>\n    <div class=\"thoughts-modal-body\">\n      <ul>",
    );
    for note in notes {
        let _ = write!(html, "\n        <li>{}</li>", escape_html(note));
    }
    html.push_str("\n      </ul>\n    </div>\n  </div>\n</div>");
    html
}

fn footer(metadata: &Metadata, resolver: &PathResolver<'_>, repository: &str) -> String {
    if metadata.related.is_empty() && metadata.notes.is_empty() {
        return String::new();
    }

    let mut html = String::from("<footer class=\"academic-footer\">");
    if !metadata.related.is_empty() {
        html.push_str("\n  <div class=\"footer-section\">\n    <h3 class=\"footer-heading\">Related Concepts</h3>\n    <div class=\"related-links\">");
        for related in &metadata.related {
            let _ = write!(
                html,
                "\n      <a href=\"{}\" class=\"related-link\">{}</a>",
                page_link(resolver, related),
                escape_html(&related.text)
            );
        }
        html.push_str("\n    </div>\n  </div>");
    }
    let _ = write!(
        html,
        "\n  <div class=\"footer-section\">\n    <a href=\"{}\" class=\"github-repo-link\" target=\"_blank\"><span>View on GitHub</span></a>\n  </div>\n</footer>",
        escape_html(repository)
    );
    html
}
