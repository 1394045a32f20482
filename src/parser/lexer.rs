//! Line recognizers shared by the metadata, citation and section parsers.
//!
//! All recognizers take a single line. Callers decide whether to trim it.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while1, take_while_m_n},
    character::complete::{char, digit1, space0, space1},
    combinator::{eof, opt, rest, value},
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};

/// An ATX heading: `## Text`. Returns the depth and the trimmed text.
pub fn heading(input: &str) -> IResult<&str, (usize, &str)> {
    let (input, hashes) = take_while1(|c: char| c == '#')(input)?;
    let (input, _) = space1(input)?;
    let (input, text) = rest(input)?;
    Ok((input, (hashes.len(), text.trim())))
}

/// `# Header`, case-insensitive, any spacing.
pub fn is_header_marker(line: &str) -> bool {
    tuple::<_, _, nom::error::Error<&str>, _>((char('#'), space0, tag_no_case("header"), space0, eof))(line)
        .is_ok()
}

/// `# Footer` or `## Footer`, case-insensitive, any spacing.
pub fn is_footer_marker(line: &str) -> bool {
    tuple::<_, _, nom::error::Error<&str>, _>((
        take_while_m_n(1, 2, |c: char| c == '#'),
        space0,
        tag_no_case("footer"),
        space0,
        eof,
    ))(line)
    .is_ok()
}

/// `[text](link)` at the start of the input.
pub fn link(input: &str) -> IResult<&str, (&str, &str)> {
    pair(
        delimited(char('['), take_until("]("), tag("](")),
        terminated(take_until(")"), char(')')),
    )(input)
}

/// The first `[text](link)` anywhere in the input.
pub fn find_link(input: &str) -> Option<(&str, &str)> {
    input
        .match_indices('[')
        .find_map(|(i, _)| link(&input[i..]).ok().map(|(_, found)| found))
}

/// A header entry body (after `- `): `key: [text](link)`.
///
/// Returns the key, and the link when the value is well formed.
pub fn meta_entry(input: &str) -> IResult<&str, (&str, Option<(&str, &str)>)> {
    let (input, key) = take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-')(input)?;
    let (input, _) = pair(char(':'), space0)(input)?;
    let (input, value) = opt(link)(input)?;
    Ok((input, (key, value)))
}

/// A citation definition: `[^id]: content`.
pub fn citation_definition(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, id) = delimited(tag("[^"), citation_id, tag("]:"))(input)?;
    let (input, _) = space0(input)?;
    let (input, content) = rest(input)?;
    Ok((input, (id, content)))
}

pub fn citation_id(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')(input)
}

/// A list item marker: `- ` or `12. `. Returns whether the list is ordered.
pub fn list_marker(input: &str) -> IResult<&str, bool> {
    alt((
        value(false, pair(char('-'), space1)),
        value(true, tuple((digit1, char('.'), space1))),
    ))(input)
}

/// A code fence line. Returns the info string (possibly empty).
pub fn fence(input: &str) -> IResult<&str, &str> {
    let (input, _) = alt((tag("```"), tag("~~~")))(input)?;
    let (input, info) = rest(input)?;
    Ok((input, info.trim()))
}

/// A section divider: a line that is exactly `---`.
pub fn is_divider(line: &str) -> bool {
    line.trim_end() == "---"
}

/// A LaTeX comment line.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading() {
        assert_eq!(heading("## Abstract ").unwrap().1, (2, "Abstract"));
        assert!(heading("#NoSpace").is_err());
        assert!(heading("plain").is_err());
    }

    #[test]
    fn test_markers() {
        assert!(is_header_marker("# Header"));
        assert!(is_header_marker("#header"));
        assert!(is_header_marker("# HEADER"));
        assert!(!is_header_marker("## Header"));
        assert!(is_footer_marker("## Footer"));
        assert!(is_footer_marker("# footer"));
        assert!(!is_footer_marker("### Footer"));
        assert!(!is_footer_marker("# Footnotes"));
    }

    #[test]
    fn test_meta_entry() {
        let (_, (key, value)) = meta_entry("title: [Foo](foo.md)").unwrap();
        assert_eq!(key, "title");
        assert_eq!(value, Some(("Foo", "foo.md")));

        let (_, (key, value)) = meta_entry("next: nothing here").unwrap();
        assert_eq!(key, "next");
        assert_eq!(value, None);
    }

    #[test]
    fn test_find_link() {
        assert_eq!(find_link("  - [On Truth](../on-truth.md)"), Some(("On Truth", "../on-truth.md")));
        assert_eq!(find_link("no link [here]"), None);
    }

    #[test]
    fn test_citation_definition() {
        let (_, (id, content)) = citation_definition("[^smith-2020]: Smith, J. (2020).").unwrap();
        assert_eq!(id, "smith-2020");
        assert_eq!(content, "Smith, J. (2020).");
        assert!(citation_definition("[^a] not a definition").is_err());
    }

    #[test]
    fn test_list_marker() {
        assert_eq!(list_marker("- item").unwrap().1, false);
        assert_eq!(list_marker("12. item").unwrap().1, true);
        assert!(list_marker("-item").is_err());
        assert!(list_marker("1.5 apples").is_err());
    }

    #[test]
    fn test_fence() {
        assert_eq!(fence("```rust").unwrap().1, "rust");
        assert_eq!(fence("```").unwrap().1, "");
        assert!(fence("``inline``").is_err());
    }
}
