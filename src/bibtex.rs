//! Minimal BibTeX reader for citations written as BibTeX entries.
//!
//! A citation definition may hold a full entry:
//!
//! ```text
//! [^knuth]: @article{knuth1984, author = {Donald E. Knuth}, title = {Literate Programming}, year = 1984}
//! ```
//!
//! Only the fields the bibliography formatter prints are kept.

use crate::ast::BibEntry;
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};
use std::collections::HashMap;

/// Whether `text` looks like a BibTeX entry.
pub fn is_bibtex(text: &str) -> bool {
    entry_header(text.trim_start()).is_ok()
}

/// Parse a single BibTeX entry. Returns `None` if `text` is not one.
pub fn parse_entry(text: &str) -> Option<BibEntry> {
    let (rest, (entry_type, key)) = entry_header(text.trim_start()).ok()?;
    let (rest, fields) = fields(rest);
    closing_brace(rest).ok()?;
    Some(build_entry(key, entry_type, fields))
}

/// `@type{key,`
fn entry_header(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, entry_type) = preceded(char('@'), take_while1(|c: char| c.is_alphanumeric()))(input)?;
    let (input, _) = tuple((multispace0, char('{'), multispace0))(input)?;
    let (input, key) = take_while1(|c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
    })(input)?;
    let (input, _) = tuple((multispace0, char(',')))(input)?;
    Ok((input, (entry_type, key)))
}

fn closing_brace(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char('}'))(input)
}

fn fields(mut input: &str) -> (&str, HashMap<String, String>) {
    let mut fields = HashMap::new();
    while let Ok((rest, (name, value))) = field(input) {
        fields.insert(name.to_lowercase(), value);
        input = rest;
        match preceded(multispace0, char::<_, nom::error::Error<&str>>(','))(input) {
            Ok((rest, _)) => input = rest,
            Err(_) => break,
        }
    }
    (input, fields)
}

/// `name = {value}` / `name = "value"` / `name = 1984`
fn field(input: &str) -> IResult<&str, (&str, String)> {
    let (input, name) = delimited(
        multispace0,
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
        tuple((multispace0, char('='), multispace0)),
    )(input)?;

    if let Some(body) = input.strip_prefix('{') {
        let end = matching_brace(body).ok_or_else(|| fail(input))?;
        return Ok((&body[end + 1..], (name, clean_value(&body[..end]))));
    }
    if let Some(body) = input.strip_prefix('"') {
        let end = body.find('"').ok_or_else(|| fail(input))?;
        return Ok((&body[end + 1..], (name, clean_value(&body[..end]))));
    }
    let (input, number) = terminated(take_while1(|c: char| c.is_ascii_digit()), multispace0)(input)?;
    Ok((input, (name, number.to_string())))
}

fn matching_brace(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn fail(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))
}

/// Drop case-protection braces and normalize whitespace.
fn clean_value(value: &str) -> String {
    let unbraced: String = value.chars().filter(|&c| c != '{' && c != '}').collect();
    unbraced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn build_entry(key: &str, entry_type: &str, mut fields: HashMap<String, String>) -> BibEntry {
    BibEntry {
        key: key.to_string(),
        entry_type: entry_type.to_lowercase(),
        title: fields.remove("title"),
        authors: fields
            .remove("author")
            .map(|authors| {
                authors
                    .split(" and ")
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        year: fields.remove("year"),
        journal: fields.remove("journal"),
        booktitle: fields.remove("booktitle"),
        publisher: fields.remove("publisher"),
        volume: fields.remove("volume"),
        number: fields.remove("number"),
        pages: fields.remove("pages"),
        doi: fields.remove("doi"),
        url: fields.remove("url"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_single_entry() {
        let entry = parse_entry(
            "@article{knuth1984, author = {Donald E. Knuth}, title = {Literate {P}rogramming}, year = 1984, pages = \"97--111\"}",
        )
        .unwrap();

        assert_eq!(entry.key, "knuth1984");
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.title.as_deref(), Some("Literate Programming"));
        assert_eq!(entry.authors, vec!["Donald E. Knuth"]);
        assert_eq!(entry.year.as_deref(), Some("1984"));
        assert_eq!(entry.pages.as_deref(), Some("97--111"));
    }

    #[test]
    fn test_multiple_authors() {
        let entry = parse_entry(
            "@book{dragon, author = {Alfred V. Aho and Monica S. Lam and Ravi Sethi}, title = {Compilers}}",
        )
        .unwrap();
        assert_eq!(entry.authors.len(), 3);
    }

    #[test]
    fn test_plain_text_is_not_bibtex() {
        assert!(!is_bibtex("Smith, J. (2020). A Book."));
        assert!(parse_entry("Smith, J. (2020). A Book.").is_none());
        assert!(is_bibtex("  @misc{x, title = {X}}"));
    }
}
