//! Name and anchor normalization.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());
static ORDINAL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+-+").unwrap());
static SPACE_OR_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_]+").unwrap());
static NOT_ANCHOR_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9-]").unwrap());

/// Turn one file or folder name into a web-safe token.
///
/// Dots are removed (so `.dictionary` becomes `dictionary`), whitespace
/// becomes hyphens, ordinal prefixes such as `01 - ` or `2.1 - ` are
/// stripped, `&` is spelled out, and the result is lowercased.
///
/// Apply this to a single path segment; see [`normalize_path`] for paths.
///
/// ```rust
/// use markdown_duality::paths::normalize_name;
///
/// assert_eq!(normalize_name("01 - The Rose & The Thorn"), "the-rose-and-the-thorn");
/// assert_eq!(normalize_name(".dictionary"), "dictionary");
/// ```
pub fn normalize_name(name: &str) -> String {
    let without_dots = name.trim().replace('.', "");
    let hyphenated = WHITESPACE.replace_all(&without_dots, "-");
    let mut name = HYPHEN_RUN
        .replace_all(&hyphenated, "-")
        .trim_matches('-')
        .to_string();

    while let Some(prefix) = ORDINAL_PREFIX.find(&name) {
        name = name[prefix.end()..].to_string();
    }

    let name = name.replace('&', "and");
    HYPHEN_RUN
        .replace_all(&name, "-")
        .trim_matches('-')
        .to_lowercase()
}

/// Normalize every `/`-separated segment of a relative path.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(normalize_name)
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert heading or citation text into an anchor id.
///
/// Lowercase, turn whitespace and underscore runs into hyphens, drop
/// everything outside `[a-z0-9-]`, then collapse hyphen runs. Collapsing
/// last makes the function idempotent.
pub fn normalize_anchor_id(text: &str) -> String {
    let lower = text.to_lowercase();
    let hyphenated = SPACE_OR_UNDERSCORE.replace_all(&lower, "-");
    let stripped = NOT_ANCHOR_CHAR.replace_all(&hyphenated, "");
    HYPHEN_RUN.replace_all(&stripped, "-").into_owned()
}
