//! Mapping document identities between the source tree, the public tree,
//! and the repository on GitHub.
//!
//! A document is identified by its source path (`library/Books/01 - On
//! Truth.md`). Everything else is derived from it:
//!
//! - public path: `library/.public/books/on-truth.html`
//! - source URL: `https://github.com/<repo>/blob/<branch>/library/Books/01%20-%20On%20Truth.md`
//!
//! The public → source direction cannot be exact in general, because several
//! source names normalize to the same public name. [`Manifest`] records the
//! forward mapping at build time and is the exact inverse;
//! [`PathResolver::public_to_source`] is the fallback heuristic.

mod manifest;
mod normalize;

pub use manifest::{Manifest, ManifestEntry};
pub use normalize::{normalize_anchor_id, normalize_name, normalize_path};

use crate::config::LibraryConfig;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Component, Path, PathBuf};

/// Characters escaped in one segment of a repository URL path.
const URL_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Converts paths between the three namespaces of a library.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    config: &'a LibraryConfig,
}

impl<'a> PathResolver<'a> {
    pub fn new(config: &'a LibraryConfig) -> Self {
        Self { config }
    }

    /// Map a source document to its page in the public tree.
    pub fn source_to_public(&self, source: &Path) -> PathBuf {
        let relative = source.strip_prefix(&self.config.source_dir).unwrap_or(source);
        let segments = normal_segments(relative);

        let mut public = self.config.public_dir.clone();
        if let Some((file, dirs)) = segments.split_last() {
            for dir in dirs {
                public.push(normalize_name(dir));
            }
            public.push(format!("{}.html", normalize_name(markdown_stem(file))));
        }
        public
    }

    /// Best-effort inverse of [`source_to_public`](Self::source_to_public).
    ///
    /// Directory names are kept as published. The file name gets a leading
    /// dot back only when its stem is a configured collection index.
    pub fn public_to_source(&self, public: &Path) -> PathBuf {
        let relative = public.strip_prefix(&self.config.public_dir).unwrap_or(public);
        let segments = normal_segments(relative);

        let mut source = self.config.source_dir.clone();
        if let Some((file, dirs)) = segments.split_last() {
            for dir in dirs {
                source.push(dir);
            }
            let stem = file.strip_suffix(".html").unwrap_or(file);
            if self.config.is_collection_index(stem) {
                source.push(format!(".{}.md", stem));
            } else {
                source.push(format!("{}.md", stem));
            }
        }
        source
    }

    /// Link to a source document on GitHub.
    ///
    /// The part of the path starting at the source root is appended to the
    /// repository base. A path without the source root is taken to be
    /// relative to the repository already. Each path segment is
    /// percent-encoded.
    pub fn source_reference_url(&self, source: &Path) -> String {
        let path = source.to_string_lossy().replace('\\', "/");
        let root = self.config.source_dir.to_string_lossy().replace('\\', "/");
        let root = root.trim_end_matches('/');

        let marker = format!("{}/", root);
        let relative = if path.starts_with(&marker) {
            path.as_str()
        } else if let Some(pos) = path.find(&format!("/{}", marker)) {
            &path[pos + 1..]
        } else {
            path.trim_start_matches("./").trim_start_matches('/')
        };

        let encoded = relative
            .split('/')
            .map(|segment| utf8_percent_encode(segment, URL_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}{}", self.config.source_base_url(), encoded)
    }

    /// Rewrite a Markdown link target (`../Books/On Truth.md#The Claim`) to
    /// the matching public link (`../books/on-truth.html#the-claim`).
    ///
    /// Links that do not point at a `.md` file come back unchanged.
    pub fn md_to_html_link(&self, link: &str) -> String {
        let (path, anchor) = match link.split_once('#') {
            Some((path, anchor)) => (path, Some(anchor)),
            None => (link, None),
        };

        let Some(without_ext) = path.strip_suffix(".md") else {
            return link.to_string();
        };

        let segments: Vec<&str> = without_ext.split('/').collect();
        let last = segments.len() - 1;
        let mut out = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| match *segment {
                "" | "." | ".." => segment.to_string(),
                _ if i == last => format!("{}.html", normalize_name(segment)),
                _ => normalize_name(segment),
            })
            .collect::<Vec<_>>()
            .join("/");

        if let Some(anchor) = anchor {
            out.push('#');
            out.push_str(&normalize_anchor_id(anchor));
        }
        out
    }
}

/// Append `.html` to an extension-less relative link.
///
/// Protocol-absolute (`https://`), protocol-relative (`//`), scheme links
/// (`mailto:`), anchors, directories and links that already carry an
/// extension are returned as-is.
pub fn resolve_bare_link(path: &str) -> String {
    if needs_html_extension(path) {
        format!("{}.html", path)
    } else {
        path.to_string()
    }
}

pub(crate) fn needs_html_extension(path: &str) -> bool {
    if path.is_empty()
        || path.starts_with("//")
        || path.contains(':')
        || path.contains('#')
        || path.ends_with('/')
    {
        return false;
    }

    let last = path.rsplit('/').next().unwrap_or(path);
    if last == "." || last == ".." {
        return false;
    }
    !matches!(last.rfind('.'), Some(pos) if pos > 0)
}

fn normal_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

fn markdown_stem(file: &str) -> &str {
    file.strip_suffix(".md").unwrap_or(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver_with<R>(f: impl FnOnce(PathResolver) -> R) -> R {
        let config = LibraryConfig::default();
        f(PathResolver::new(&config))
    }

    #[test]
    fn test_source_to_public() {
        resolver_with(|r| {
            assert_eq!(
                r.source_to_public(Path::new("library/Books/01 - On Truth.md")),
                PathBuf::from("library/.public/books/on-truth.html")
            );
            assert_eq!(
                r.source_to_public(Path::new("library/.dictionary.md")),
                PathBuf::from("library/.public/dictionary.html")
            );
        });
    }

    #[test]
    fn test_public_to_source_collection_index() {
        resolver_with(|r| {
            assert_eq!(
                r.public_to_source(Path::new("library/.public/encyclopedia.html")),
                PathBuf::from("library/.encyclopedia.md")
            );
            assert_eq!(
                r.public_to_source(Path::new("library/.public/books/on-truth.html")),
                PathBuf::from("library/books/on-truth.md")
            );
        });
    }

    #[test]
    fn test_public_round_trip_is_stable() {
        resolver_with(|r| {
            for public in [
                "library/.public/dictionary.html",
                "library/.public/books/on-truth.html",
                "library/.public/a/b/c.html",
            ] {
                let public = PathBuf::from(public);
                let again = r.source_to_public(&r.public_to_source(&public));
                assert_eq!(again, public);
            }
        });
    }

    #[test]
    fn test_source_reference_url() {
        resolver_with(|r| {
            assert_eq!(
                r.source_reference_url(Path::new("/home/me/repo/library/Books/x.md")),
                "https://github.com/DNA-Platform/inexplicable-phenomena/blob/main/library/Books/x.md"
            );
            assert_eq!(
                r.source_reference_url(Path::new("library/x.md")),
                "https://github.com/DNA-Platform/inexplicable-phenomena/blob/main/library/x.md"
            );
            assert_eq!(
                r.source_reference_url(Path::new("docs/x.md")),
                "https://github.com/DNA-Platform/inexplicable-phenomena/blob/main/docs/x.md"
            );
            assert_eq!(
                r.source_reference_url(Path::new("library/Books/01 - On Truth.md")),
                "https://github.com/DNA-Platform/inexplicable-phenomena/blob/main/library/Books/01%20-%20On%20Truth.md"
            );
            assert_eq!(
                r.source_reference_url(Path::new("library/Truth & Proof #1.md")),
                "https://github.com/DNA-Platform/inexplicable-phenomena/blob/main/library/Truth%20%26%20Proof%20%231.md"
            );
        });
    }

    #[test]
    fn test_md_to_html_link() {
        resolver_with(|r| {
            assert_eq!(
                r.md_to_html_link("../Books/01 - On Truth.md#The Claim"),
                "../books/on-truth.html#the-claim"
            );
            assert_eq!(r.md_to_html_link("./.dictionary.md"), "./dictionary.html");
            assert_eq!(r.md_to_html_link("notes.txt"), "notes.txt");
        });
    }

    #[test]
    fn test_resolve_bare_link() {
        assert_eq!(resolve_bare_link("../books/on-truth"), "../books/on-truth.html");
        assert_eq!(resolve_bare_link("page.html"), "page.html");
        assert_eq!(resolve_bare_link("https://example.com/x"), "https://example.com/x");
        assert_eq!(resolve_bare_link("//cdn.example.com/x"), "//cdn.example.com/x");
        assert_eq!(resolve_bare_link("mailto:a@b.c"), "mailto:a@b.c");
        assert_eq!(resolve_bare_link("#section"), "#section");
        assert_eq!(resolve_bare_link("books/"), "books/");
        assert_eq!(resolve_bare_link(".."), "..");
    }
}
