//! LaTeX protection through the Markdown pass.
//!
//! [`encode`] swaps display math, inline math and `\begin{..}..\end{..}`
//! environments for opaque tokens made of letters, digits and hyphens, which
//! a Markdown renderer passes through untouched. [`decode`] turns the tokens
//! back into markup for a [`LatexTarget`].

mod katex;
mod protect;
mod raw;

pub use self::katex::HtmlTarget;
pub use self::protect::{decode, encode};
pub use self::raw::RawTarget;

use once_cell::sync::Lazy;
use regex::Regex;

static ENVIRONMENT_PARTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\\begin\{([A-Za-z]+\*?)\}(.*)\\end\{[A-Za-z]+\*?\}$").unwrap()
});

/// Token kinds, in encode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Display,
    Inline,
    Environment,
}

impl TokenKind {
    /// The tag used inside tokens.
    pub fn tag(self) -> &'static str {
        match self {
            TokenKind::Display => "DISPLAY",
            TokenKind::Inline => "INLINE",
            TokenKind::Environment => "ENV",
        }
    }
}

/// Markup produced when decoding protection tokens.
///
/// Every method receives the raw matched source, delimiters included.
pub trait LatexTarget {
    /// `$$...$$`
    fn display(&self, raw: &str) -> String;

    /// `$...$`
    fn inline(&self, raw: &str) -> String;

    /// `\begin{name}...\end{name}`
    fn environment(&self, raw: &str) -> String;

    /// Visible marker for a token whose payload does not decode.
    fn malformed(&self, kind: TokenKind) -> String;

    /// Scripts and styles a page needs to display this target's output.
    fn head_content(&self) -> Option<String> {
        None
    }
}

/// Decode target selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MathTarget {
    /// Client-renderable HTML containers.
    #[default]
    Html,
    /// The original LaTeX source.
    Raw,
}

/// Create a decode target.
pub fn create_target(target: MathTarget) -> Box<dyn LatexTarget> {
    match target {
        MathTarget::Html => Box::new(HtmlTarget::new()),
        MathTarget::Raw => Box::new(RawTarget),
    }
}

/// Split an environment into its name and inner body.
pub(crate) fn environment_parts(raw: &str) -> Option<(&str, &str)> {
    let caps = ENVIRONMENT_PARTS.captures(raw)?;
    let name = caps.get(1)?.as_str();
    let body = caps.get(2)?.as_str();
    Some((name, body))
}
