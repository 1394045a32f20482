//! The generic Markdown pass.

use crate::paths::normalize_anchor_id;
use crate::render::escape_html;
use crate::render::highlight::SyntaxHighlighter;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Converts Markdown to an HTML fragment.
///
/// Implementations must pass protection tokens (runs of letters, digits and
/// hyphens) through verbatim.
pub trait MarkdownRenderer {
    fn render(&self, markdown: &str) -> String;
}

/// `pulldown-cmark` with line breaks kept and heading anchors added.
pub struct PulldownRenderer<'a> {
    highlighter: &'a dyn SyntaxHighlighter,
}

impl<'a> PulldownRenderer<'a> {
    pub fn new(highlighter: &'a dyn SyntaxHighlighter) -> Self {
        Self { highlighter }
    }

    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options
    }
}

impl MarkdownRenderer for PulldownRenderer<'_> {
    fn render(&self, markdown: &str) -> String {
        let mut events: Vec<Event> = Vec::new();
        let mut parser = Parser::new_ext(markdown, Self::options());

        while let Some(event) = parser.next() {
            match event {
                Event::SoftBreak => events.push(Event::HardBreak),
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let inner = collect_until(&mut parser, |e| matches!(e, Event::End(TagEnd::Heading(_))));
                    let id = id.or_else(|| Some(CowStr::from(normalize_anchor_id(&plain_text(&inner)))));
                    events.push(Event::Start(Tag::Heading {
                        level,
                        id,
                        classes,
                        attrs,
                    }));
                    events.extend(inner.into_iter().map(soften));
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(language))) => {
                    let inner = collect_until(&mut parser, |e| matches!(e, Event::End(TagEnd::CodeBlock)));
                    let code = plain_text(&inner);
                    match self.highlighter.highlight(&code, &language) {
                        Some(highlighted) => events.push(Event::Html(CowStr::from(format!(
                            "<pre><code class=\"language-{}\">{}</code></pre>\n",
                            escape_html(&language),
                            highlighted
                        )))),
                        None => {
                            events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(language))));
                            events.extend(inner);
                            events.push(Event::End(TagEnd::CodeBlock));
                        }
                    }
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

/// Drain events up to (and consuming) the first one matching `end`.
fn collect_until<'e>(
    parser: &mut Parser<'e>,
    end: impl Fn(&Event<'e>) -> bool,
) -> Vec<Event<'e>> {
    let mut inner = Vec::new();
    for event in parser.by_ref() {
        if end(&event) {
            break;
        }
        inner.push(event);
    }
    inner
}

fn soften(event: Event<'_>) -> Event<'_> {
    match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    }
}

fn plain_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}
