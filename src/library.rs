//! Building a whole library: scanning the source tree, writing the public
//! tree and checking that the two match.

use crate::config::LibraryConfig;
use crate::error::{ConfigError, Result};
use crate::paths::{Manifest, PathResolver};
use crate::pipeline::{HtmlPipeline, LatexPipeline};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// File name of the manifest written into the public directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// First line that keeps a document out of the build.
const DRAFT_MARKER: &str = "[draft]";

/// Outcome of a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub written: Vec<PathBuf>,
    /// Sources that could not be read, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Outcome of [`verify`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Sources whose page does not exist.
    pub missing_html: Vec<PathBuf>,
    /// Pages with no source.
    pub orphan_html: Vec<PathBuf>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.missing_html.is_empty() && self.orphan_html.is_empty()
    }
}

/// Every publishable Markdown file under the source directory, sorted.
///
/// The public directory and hidden directories are skipped; hidden files
/// such as `.dictionary.md` are kept. Drafts are left out.
pub fn scan(config: &LibraryConfig) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    let walker = WalkDir::new(&config.source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !skip_dir(entry, config));

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "md") {
            continue;
        }
        if is_draft(path)? {
            tracing::debug!(path = %path.display(), "skipping draft");
            continue;
        }
        sources.push(path.to_path_buf());
    }

    tracing::info!(count = sources.len(), "scanned source tree");
    Ok(sources)
}

fn skip_dir(entry: &DirEntry, config: &LibraryConfig) -> bool {
    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return false;
    }
    entry.path() == config.public_dir
        || entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with('.'))
}

fn is_draft(path: &Path) -> Result<bool> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().next().map_or(false, |line| line.trim() == DRAFT_MARKER))
}

/// Map sources to public paths, failing on public name collisions.
pub fn build_manifest(config: &LibraryConfig, sources: Vec<PathBuf>) -> Result<Manifest> {
    Manifest::build(&PathResolver::new(config), sources)
}

/// Write `contents` to `path` through a temporary file in the same
/// directory, so an existing file is replaced whole or not at all.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let unwritable = |source| ConfigError::Unwritable {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(unwritable)?;
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(unwritable)?;
    file.write_all(contents.as_bytes()).map_err(unwritable)?;
    file.persist(path).map_err(|e| unwritable(e.error))?;
    Ok(())
}

/// Compile every source to a full HTML page and write the manifest.
///
/// Name collisions are reported before anything is written.
pub fn build_html(config: &LibraryConfig) -> Result<BuildReport> {
    let manifest = build_manifest(config, scan(config)?)?;
    let pipeline = HtmlPipeline::new(config);
    let mut report = BuildReport::default();

    for entry in manifest.entries() {
        let markdown = match fs::read_to_string(&entry.source) {
            Ok(markdown) => markdown,
            Err(e) => {
                tracing::warn!(source = %entry.source.display(), error = %e, "cannot read source");
                report.failed.push((entry.source.clone(), e.to_string()));
                continue;
            }
        };

        let page = pipeline
            .run(&markdown, Some(&entry.source))
            .to_page(config);
        write_atomic(&entry.public, &page)?;
        tracing::debug!(public = %entry.public.display(), "wrote page");
        report.written.push(entry.public.clone());
    }

    write_atomic(&config.public_dir.join(MANIFEST_FILE), &manifest.to_json()?)?;
    tracing::info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "html build finished"
    );
    Ok(report)
}

/// Compile every source to LaTeX, next to its page.
pub fn build_latex(config: &LibraryConfig) -> Result<BuildReport> {
    let manifest = build_manifest(config, scan(config)?)?;
    let pipeline = LatexPipeline::new(config);
    let mut report = BuildReport::default();

    for entry in manifest.entries() {
        let markdown = match fs::read_to_string(&entry.source) {
            Ok(markdown) => markdown,
            Err(e) => {
                tracing::warn!(source = %entry.source.display(), error = %e, "cannot read source");
                report.failed.push((entry.source.clone(), e.to_string()));
                continue;
            }
        };

        let latex = pipeline.run(&markdown)?;
        let target = entry.public.with_extension("tex");
        write_atomic(&target, &latex)?;
        report.written.push(target);
    }

    tracing::info!(written = report.written.len(), "latex build finished");
    Ok(report)
}

/// Compare the source tree with the public tree.
pub fn verify(config: &LibraryConfig) -> Result<VerifyReport> {
    let manifest = build_manifest(config, scan(config)?)?;
    let mut report = VerifyReport::default();

    for entry in manifest.entries() {
        if !entry.public.is_file() {
            report.missing_html.push(entry.source.clone());
        }
    }

    if config.public_dir.is_dir() {
        for entry in WalkDir::new(&config.public_dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            let is_html = path.extension().map_or(false, |ext| ext == "html");
            if entry.file_type().is_file() && is_html && manifest.source_for(path).is_none() {
                report.orphan_html.push(path.to_path_buf());
            }
        }
    }

    tracing::info!(
        missing = report.missing_html.len(),
        orphans = report.orphan_html.len(),
        "verified public tree"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn library(files: &[(&str, &str)]) -> (TempDir, LibraryConfig) {
        let dir = TempDir::new().unwrap();
        let source_dir = dir.path().join("library");
        for (name, contents) in files {
            let path = source_dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        let config = LibraryConfig {
            public_dir: source_dir.join(".public"),
            source_dir,
            ..LibraryConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_scan_skips_drafts_hidden_dirs_and_public() {
        let (_dir, config) = library(&[
            ("Books/01 - On Truth.md", "# On Truth"),
            (".dictionary.md", "# Dictionary"),
            ("Drafts.md", "[draft]\n# Not yet"),
            (".git/notes.md", "# hidden"),
            (".public/old.md", "# published"),
            ("image.png", "png"),
        ]);

        let names: Vec<String> = scan(&config)
            .unwrap()
            .iter()
            .map(|p| p.strip_prefix(&config.source_dir).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec![".dictionary.md", "Books/01 - On Truth.md"]);
    }

    #[test]
    fn test_build_and_verify() {
        let (_dir, config) = library(&[
            ("Books/01 - On Truth.md", "# On Truth\n\nSee [next](<02 - Next.md>)."),
            ("Books/02 - Next.md", "# Next\n\n$x$"),
        ]);

        let report = build_html(&config).unwrap();
        assert_eq!(report.written.len(), 2);
        assert!(report.failed.is_empty());

        let page = fs::read_to_string(config.public_dir.join("books/on-truth.html")).unwrap();
        assert!(page.contains(r#"<a href="next.html">next</a>"#));
        assert!(config.public_dir.join(MANIFEST_FILE).is_file());

        assert!(verify(&config).unwrap().is_clean());

        fs::write(config.public_dir.join("stale.html"), "old").unwrap();
        fs::remove_file(config.public_dir.join("books/next.html")).unwrap();
        let report = verify(&config).unwrap();
        assert_eq!(report.orphan_html, vec![config.public_dir.join("stale.html")]);
        assert_eq!(report.missing_html, vec![config.source_dir.join("Books/02 - Next.md")]);
    }

    #[test]
    fn test_collision_writes_nothing() {
        let (_dir, config) = library(&[("A B.md", "# one"), ("a-b.md", "# two")]);
        let err = build_html(&config).unwrap_err();
        assert!(matches!(err, Error::Path(_)));
        assert!(!config.public_dir.exists());
    }

    #[test]
    fn test_build_latex_writes_tex_next_to_html() {
        let (_dir, config) = library(&[("Essay.md", "# Essay\n---\n## Part\nText.")]);
        let report = build_latex(&config).unwrap();
        assert_eq!(report.written, vec![config.public_dir.join("essay.tex")]);
        let tex = fs::read_to_string(&report.written[0]).unwrap();
        assert!(tex.contains("\\section{Part}"));
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.html");
        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
