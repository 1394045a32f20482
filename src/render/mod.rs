//! Output generation: the HTML fragment path, the LaTeX tree walker and
//! page assembly.

pub mod highlight;
pub mod html;
pub mod latex;
pub mod markdown;
pub mod math;
pub mod page;

pub use highlight::{PlainHighlighter, SyntaxHighlighter};
pub use html::{escape_html, unescape_html, HtmlRenderer};
pub use latex::{escape_latex, LatexRenderer};
pub use markdown::{MarkdownRenderer, PulldownRenderer};
pub use math::{create_target, LatexTarget, MathTarget};
pub use page::render_page;
