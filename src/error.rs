//! Error types for the markdown-duality library.
//!
//! Content problems inside a single document (a citation that fails to
//! format, a math token that fails to decode, a malformed metadata line) are
//! never errors: they are logged and replaced by a visible fallback. The
//! types here cover the failures that stop a document or a build.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Citation format error: {0}")]
    Format(#[from] FormatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Configuration problems exit with `2` so callers can tell them apart
    /// from content and I/O failures, which exit with `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            Error::Path(_) | Error::Format(_) | Error::Io(_) => 1,
        }
    }
}

/// Errors caused by the environment the compiler runs in.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template {0} has no %%CONTENT%% placeholder")]
    MissingTemplatePlaceholder(String),
}

/// Errors found while validating the source tree.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("{first} and {second} both publish to {public}")]
    DuplicatePublicName {
        public: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
}

/// A citation formatter could not format an entry.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FormatError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let config: Error = ConfigError::MissingTemplatePlaceholder("t.tex".into()).into();
        let path: Error = PathError::DuplicatePublicName {
            public: "a.html".into(),
            first: "A.md".into(),
            second: "a.md".into(),
        }
        .into();
        let io: Error = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();

        assert_eq!(config.exit_code(), 2);
        assert_eq!(path.exit_code(), 1);
        assert_eq!(io.exit_code(), 1);
    }

    #[test]
    fn test_duplicate_message_names_both_sources() {
        let err = PathError::DuplicatePublicName {
            public: "x/a.html".into(),
            first: "x/A.md".into(),
            second: "x/.a.md".into(),
        };
        let message = err.to_string();
        assert!(message.contains("x/A.md"));
        assert!(message.contains("x/.a.md"));
    }
}
