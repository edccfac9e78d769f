//! Content module - front-matter documents and the store that holds them

mod document;
mod frontmatter;
pub mod lint;
pub mod markdown;
mod store;

pub use document::{is_markdown_file, make_slug, Document, DocumentError, DocumentKind};
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use store::{ContentStore, StoreError};
