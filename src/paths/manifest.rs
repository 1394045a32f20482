//! Forward source → public mapping recorded at build time.

use super::PathResolver;
use crate::error::{PathError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One published document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source: PathBuf,
    pub public: PathBuf,
}

/// The set of documents in a build, keyed both ways.
///
/// Building a manifest fails if two sources publish to the same public path,
/// which makes [`Manifest::source_for`] an exact inverse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    #[serde(skip)]
    by_public: HashMap<PathBuf, usize>,
}

impl Manifest {
    /// Map every source through `resolver`, rejecting public name collisions.
    pub fn build<I>(resolver: &PathResolver<'_>, sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut manifest = Manifest::default();
        for source in sources {
            let public = resolver.source_to_public(&source);
            manifest.insert(source, public)?;
        }
        Ok(manifest)
    }

    fn insert(&mut self, source: PathBuf, public: PathBuf) -> Result<()> {
        if let Some(&existing) = self.by_public.get(&public) {
            return Err(PathError::DuplicatePublicName {
                public,
                first: self.entries[existing].source.clone(),
                second: source,
            }
            .into());
        }
        self.by_public.insert(public.clone(), self.entries.len());
        self.entries.push(ManifestEntry { source, public });
        Ok(())
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact inverse lookup.
    pub fn source_for(&self, public: &Path) -> Option<&Path> {
        self.by_public
            .get(public)
            .map(|&i| self.entries[i].source.as_path())
    }

    /// Exact inverse when the page is known, heuristic otherwise.
    pub fn resolve_source(&self, resolver: &PathResolver<'_>, public: &Path) -> PathBuf {
        match self.source_for(public) {
            Some(source) => source.to_path_buf(),
            None => resolver.public_to_source(public),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut manifest: Manifest = serde_json::from_str(text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        manifest.by_public = manifest
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.public.clone(), i))
            .collect();
        Ok(manifest)
    }
}
