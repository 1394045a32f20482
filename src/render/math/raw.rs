//! Passthrough target for LaTeX output.

use super::{LatexTarget, TokenKind};

/// Restores the exact source text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTarget;

impl LatexTarget for RawTarget {
    fn display(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn inline(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn environment(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn malformed(&self, kind: TokenKind) -> String {
        format!("% malformed math token ({})", kind.tag().to_lowercase())
    }
}
