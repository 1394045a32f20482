//! Reference resolution: citations and links.

pub mod citations;
pub mod links;

pub use citations::{
    attach_bibliography, extract, format_citations, render_bibliography, resolve_references,
    resolve_references_latex, BibtexFormatter, CitationFormatter, CitationTable, Extracted,
};
pub use links::LinkRewriter;
