//! Document model shared by the parser and the renderers.

use serde::Serialize;

/// A `[text](link)` pair from the front or back matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaLink {
    pub text: String,
    pub link: String,
}

impl MetaLink {
    pub fn new(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: link.into(),
        }
    }
}

/// Document metadata from the `# Header` and `# Footer` blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<MetaLink>,
    /// Parent collection (`collection:` or `book:`)
    pub collection: Option<MetaLink>,
    /// Subject the document belongs to
    pub subject: Option<MetaLink>,
    pub previous: Option<MetaLink>,
    pub next: Option<MetaLink>,
    /// Related documents from the footer, in order
    pub related: Vec<MetaLink>,
    /// Free-form thoughts from the footer, in order
    pub notes: Vec<String>,
}

/// Root of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNode {
    pub metadata: Metadata,
    /// All sections in document order, starting with the title section.
    pub sections: Vec<Section>,
}

impl DocumentNode {
    /// The leading title section, if the document has one.
    pub fn title_section(&self) -> Option<&TitleSection> {
        self.sections.iter().find_map(|section| match section {
            Section::Title(title) => Some(title),
            _ => None,
        })
    }
}

/// A `---`-delimited chunk of the document body.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Title(TitleSection),
    Abstract {
        paragraphs: Vec<Paragraph>,
        /// Keywords chunks that followed this abstract, in document order.
        keywords: Vec<KeywordsSection>,
    },
    /// A keywords chunk with no abstract before it.
    Keywords(KeywordsSection),
    Bibliography {
        paragraphs: Vec<Paragraph>,
    },
    Content {
        heading: Option<Heading>,
        paragraphs: Vec<Paragraph>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleSection {
    pub text: String,
    pub link: Option<String>,
    /// Anything under the title heading, such as an author line.
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordsSection {
    pub keywords: Vec<String>,
    /// Comment lines found in the chunk.
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: SectionLevel,
    pub text: String,
}

/// LaTeX sectioning depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLevel {
    Chapter,
    Section,
    Subsection,
    Subsubsection,
}

impl SectionLevel {
    /// Map a Markdown heading depth (number of `#`) to a sectioning level.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 | 1 => SectionLevel::Chapter,
            2 => SectionLevel::Section,
            3 => SectionLevel::Subsection,
            _ => SectionLevel::Subsubsection,
        }
    }

    /// The LaTeX command name, without the backslash.
    pub fn command_name(self) -> &'static str {
        match self {
            SectionLevel::Chapter => "chapter",
            SectionLevel::Section => "section",
            SectionLevel::Subsection => "subsection",
            SectionLevel::Subsubsection => "subsubsection",
        }
    }
}

/// A blank-line-delimited block inside a section.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub kind: ParagraphKind,
    /// Source text with annotations removed.
    pub content: String,
    pub annotations: Annotations,
}

/// Comment lines directly before and after a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub pre: Vec<String>,
    pub post: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphKind {
    Text,
    Blockquote,
    List { ordered: bool },
    /// A bibliography entry.
    Citation { id: String },
    /// A fenced code block.
    Code { language: Option<String> },
    /// A paragraph made only of comment lines.
    Comment,
}

/// A footnote-style bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub id: String,
    /// Element id suffix, unique within the table.
    pub anchor: String,
    pub raw_content: String,
    /// 0-based, in first-seen order.
    pub index: usize,
    /// Set by the citation formatter.
    pub formatted_html: Option<String>,
}

/// A BibTeX entry, used when a citation is written as BibTeX.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BibEntry {
    pub key: String,
    pub entry_type: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub journal: Option<String>,
    pub booktitle: Option<String>,
    pub publisher: Option<String>,
    pub volume: Option<String>,
    pub number: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
}
