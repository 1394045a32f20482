//! Token encoding and decoding.

use super::{LatexTarget, TokenKind};
use crate::parser::lexer::fence;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static DISPLAY_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\$.+?\$\$").unwrap());
static INLINE_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[^$\n]+?\$").unwrap());
static BEGIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\begin\{([A-Za-z]+\*?)\}").unwrap());
static CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"``[^\n]*?``|`[^`\n]*`").unwrap());
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"LATEX-(DISPLAY|INLINE|ENV)-(\d+)-([0-9A-Za-z]*)-END").unwrap());

/// Per-kind token counters for one document.
#[derive(Debug, Default)]
struct Encoder {
    display: usize,
    inline: usize,
    environment: usize,
}

impl Encoder {
    fn token(&mut self, kind: TokenKind, raw: &str) -> String {
        let counter = match kind {
            TokenKind::Display => &mut self.display,
            TokenKind::Inline => &mut self.inline,
            TokenKind::Environment => &mut self.environment,
        };
        let n = *counter;
        *counter += 1;
        format!("LATEX-{}-{}-{}-END", kind.tag(), n, hex::encode(raw))
    }

    fn encode_text(&mut self, text: &str) -> String {
        let text = DISPLAY_MATH.replace_all(text, |caps: &Captures| {
            self.token(TokenKind::Display, &caps[0])
        });
        let text = INLINE_MATH.replace_all(&text, |caps: &Captures| {
            self.token(TokenKind::Inline, &caps[0])
        });
        self.encode_environments(&text)
    }

    /// Replace outermost environments, matching nested ones of the same name.
    fn encode_environments(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;

        while let Some(caps) = BEGIN.captures_at(text, pos) {
            let (Some(begin), Some(name)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            match environment_end(text, begin.end(), name.as_str()) {
                Some(end) => {
                    out.push_str(&text[pos..begin.start()]);
                    out.push_str(&self.token(TokenKind::Environment, &text[begin.start()..end]));
                    pos = end;
                }
                None => {
                    out.push_str(&text[pos..begin.end()]);
                    pos = begin.end();
                }
            }
        }
        out.push_str(&text[pos..]);
        out
    }
}

/// Byte offset just past the `\end{name}` closing the environment that
/// opens before `from`.
fn environment_end(text: &str, from: usize, name: &str) -> Option<usize> {
    let open = format!("\\begin{{{}}}", name);
    let close = format!("\\end{{{}}}", name);
    let mut depth = 1usize;
    let mut pos = from;

    loop {
        let next_close = text[pos..].find(&close)? + pos;
        match text[pos..].find(&open).map(|i| i + pos) {
            Some(next_open) if next_open < next_close => {
                depth += 1;
                pos = next_open + open.len();
            }
            _ => {
                depth -= 1;
                pos = next_close + close.len();
                if depth == 0 {
                    return Some(pos);
                }
            }
        }
    }
}

/// Replace math and environments with protection tokens.
///
/// Fenced code blocks and inline code spans are left as they are.
pub fn encode(text: &str) -> String {
    let mut encoder = Encoder::default();
    let mut out = String::with_capacity(text.len());
    let mut prose = String::new();
    let mut in_fence = false;

    for line in text.split_inclusive('\n') {
        let is_fence = fence(line.trim()).is_ok();
        if in_fence || is_fence {
            if !prose.is_empty() {
                out.push_str(&encode_prose(&mut encoder, &prose));
                prose.clear();
            }
            out.push_str(line);
            if is_fence {
                in_fence = !in_fence;
            }
        } else {
            prose.push_str(line);
        }
    }
    out.push_str(&encode_prose(&mut encoder, &prose));

    tracing::trace!(
        display = encoder.display,
        inline = encoder.inline,
        environments = encoder.environment,
        "protected latex"
    );
    out
}

fn encode_prose(encoder: &mut Encoder, prose: &str) -> String {
    let mut out = String::with_capacity(prose.len());
    let mut pos = 0;
    for span in CODE_SPAN.find_iter(prose) {
        out.push_str(&encoder.encode_text(&prose[pos..span.start()]));
        out.push_str(span.as_str());
        pos = span.end();
    }
    out.push_str(&encoder.encode_text(&prose[pos..]));
    out
}

/// Turn protection tokens back into markup for `target`.
///
/// Environments are decoded first, then inline and display math, so tokens
/// nested inside an environment resolve too. Undecodable payloads become
/// the target's error marker.
pub fn decode(text: &str, target: &dyn LatexTarget) -> String {
    let text = decode_kind(text, TokenKind::Environment, target);
    let text = decode_kind(&text, TokenKind::Inline, target);
    decode_kind(&text, TokenKind::Display, target)
}

fn decode_kind(text: &str, kind: TokenKind, target: &dyn LatexTarget) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures| {
            if &caps[1] != kind.tag() {
                return caps[0].to_string();
            }
            let raw = hex::decode(&caps[3])
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok());
            match raw {
                Some(raw) => match kind {
                    TokenKind::Display => target.display(&raw),
                    TokenKind::Inline => target.inline(&raw),
                    TokenKind::Environment => target.environment(&raw),
                },
                None => {
                    tracing::error!(token = &caps[0], "malformed latex token");
                    target.malformed(kind)
                }
            }
        })
        .into_owned()
}
