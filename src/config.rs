//! Library configuration, loaded from an optional `duality.toml`.
//!
//! Every field has a default matching the published library, so an empty
//! file (or no file at all) is a valid configuration.
//!
//! ```text
//! source_dir = "library"
//! public_dir = "library/.public"
//! collection_indices = ["dictionary", "encyclopedia", "articles"]
//!
//! [repository]
//! url = "https://github.com/DNA-Platform/inexplicable-phenomena"
//! branch = "main"
//!
//! [latex]
//! template = "templates/paper.tex"
//! ```

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for compiling a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Root of the Markdown source tree.
    pub source_dir: PathBuf,
    /// Root of the generated HTML tree.
    pub public_dir: PathBuf,
    /// Repository holding the source tree.
    pub repository: RepositoryConfig,
    /// Base URL of the published site, without a trailing slash.
    pub site_base_url: String,
    /// File stems published from a dot-prefixed source file (`.dictionary.md`).
    pub collection_indices: Vec<String>,
    pub html: HtmlConfig,
    pub latex: LatexConfig,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("library"),
            public_dir: PathBuf::from("library/.public"),
            repository: RepositoryConfig::default(),
            site_base_url: "https://dna-platform.github.io/inexplicable-phenomena".to_string(),
            collection_indices: [
                "dictionary",
                "encyclopedia",
                "godel-and-the-human-brain",
                "articles",
                "books",
                "index",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            html: HtmlConfig::default(),
            latex: LatexConfig::default(),
        }
    }
}

impl LibraryConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Invalid(e.to_string()).into())
    }

    /// `https://github.com/{owner}/{repo}/blob/{branch}/`
    pub fn source_base_url(&self) -> String {
        format!(
            "{}/blob/{}/",
            self.repository.url.trim_end_matches('/'),
            self.repository.branch
        )
    }

    /// Whether `stem` names a collection index published from a dot file.
    pub fn is_collection_index(&self, stem: &str) -> bool {
        self.collection_indices.iter().any(|name| name == stem)
    }
}

/// Where the source tree lives on GitHub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub url: String,
    pub branch: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: "https://github.com/DNA-Platform/inexplicable-phenomena".to_string(),
            branch: "main".to_string(),
        }
    }
}

/// HTML output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// Suffix of every page `<title>`.
    pub site_title: String,
    /// Exact substring replacements applied to finished fragments.
    pub literal_rewrites: Vec<LiteralRewrite>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            site_title: "Inexplicable Phenomena".to_string(),
            literal_rewrites: vec![LiteralRewrite {
                from: r#"<a href="/encyclopedia/semantic-reference-theory.html" class="book-link">"#
                    .to_string(),
                to: r#"<a href="../encyclopedia/semantic-reference-theory.html" class="book-link">"#
                    .to_string(),
            }],
        }
    }
}

/// A literal `from` → `to` replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralRewrite {
    pub from: String,
    pub to: String,
}

/// LaTeX output settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatexConfig {
    /// Template file containing a `%%CONTENT%%` placeholder. The built-in
    /// llncs template is used when unset.
    pub template: Option<PathBuf>,
}
