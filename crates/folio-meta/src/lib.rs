//! Document splitting and front-matter metadata for Folio.
//!
//! A Folio document is a plain-text file made of two parts: a YAML metadata
//! block and a markdown body, separated by a line of three or more `=`
//! characters surrounded by whitespace:
//!
//! ```text
//! title: Hello
//! url: hello
//! author: Jane
//!
//! ===
//!
//! # Hi
//! ```
//!
//! This crate provides:
//! - [`split`], [`meta`], [`body`]: the content splitter
//! - [`parse_front_matter`]: YAML block to a flat [`FrontMatter`] map
//! - [`PageMeta`]: typed page metadata with a generic [`PageMeta::get`] accessor
//!
//! # Example
//!
//! ```
//! use folio_meta::{PageMeta, parse_front_matter, split};
//!
//! let (block, body) = split("title: Hello\nurl: hello\n===\n# Hi").unwrap();
//! let meta = PageMeta::from_front_matter(parse_front_matter(block).unwrap()).unwrap();
//! assert_eq!(meta.url, "hello");
//! assert_eq!(body, "# Hi");
//! ```

mod case;
mod front_matter;
mod page_meta;
mod split;

pub use case::to_snake_case;
pub use front_matter::{FrontMatter, parse_front_matter};
pub use page_meta::PageMeta;
pub use split::{body, meta, split};

/// Error type for document metadata operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    /// The `===` separator between metadata and body is missing.
    #[error("document has no metadata separator")]
    MissingSeparator,
    /// The metadata block is not valid YAML or not a mapping.
    #[error("{0}")]
    Parse(String),
    /// A metadata value is a sequence or mapping instead of a scalar.
    #[error("metadata field {field} is not a scalar value")]
    NonScalar {
        /// Offending field name.
        field: String,
    },
    /// A required field is absent.
    #[error("{field} is missing")]
    Incomplete {
        /// Name of the missing field.
        field: String,
    },
}
