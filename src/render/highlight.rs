//! Syntax highlighting hook for fenced code.

/// Highlights a code block.
///
/// Returning `None` leaves the block to the default escaped rendering.
pub trait SyntaxHighlighter {
    fn highlight(&self, code: &str, language: &str) -> Option<String>;
}

/// Highlighter that never highlights.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl SyntaxHighlighter for PlainHighlighter {
    fn highlight(&self, _code: &str, _language: &str) -> Option<String> {
        None
    }
}
