//! Parsers for library documents.
//!
//! [`parse_metadata`] splits a document into header/footer metadata and
//! body. The LaTeX path then builds a section tree from the body with
//! [`build_document`].

pub mod lexer;
mod metadata;
mod paragraphs;
mod sections;

pub use metadata::{parse_metadata, ParsedDocument};
pub use paragraphs::{classify, split_paragraphs};
pub use sections::build_document;
