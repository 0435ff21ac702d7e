//! Metadata/body splitting.

use std::sync::LazyLock;

use regex::Regex;

use crate::MetadataError;

/// Separator between the metadata block and the body.
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+={3,}\s+").unwrap());

/// Split a raw document into its metadata block and body.
///
/// Only the first separator splits the document; any later `===` runs are
/// part of the body.
///
/// # Errors
///
/// Returns [`MetadataError::MissingSeparator`] if the document has no separator.
pub fn split(content: &str) -> Result<(&str, &str), MetadataError> {
    let found = SEPARATOR_RE
        .find(content)
        .ok_or(MetadataError::MissingSeparator)?;
    Ok((&content[..found.start()], &content[found.end()..]))
}

/// Return the metadata block of a raw document.
///
/// # Errors
///
/// Returns [`MetadataError::MissingSeparator`] if the document has no separator.
pub fn meta(content: &str) -> Result<&str, MetadataError> {
    split(content).map(|(meta, _)| meta)
}

/// Return the body of a raw document.
///
/// # Errors
///
/// Returns [`MetadataError::MissingSeparator`] if the document has no separator.
pub fn body(content: &str) -> Result<&str, MetadataError> {
    split(content).map(|(_, body)| body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_document() {
        let (meta, body) = split("title: Hello\nurl: hello\n===\n# Hi").unwrap();
        assert_eq!(meta, "title: Hello\nurl: hello");
        assert_eq!(body, "# Hi");
    }

    #[test]
    fn test_split_blank_lines_around_separator() {
        let (meta, body) = split("title: Hello\n\n=====\n\nBody text\n").unwrap();
        assert_eq!(meta, "title: Hello");
        assert_eq!(body, "Body text\n");
    }

    #[test]
    fn test_split_keeps_later_separators_in_body() {
        let (_, body) = split("title: A\n===\nfirst\n===\nsecond").unwrap();
        assert_eq!(body, "first\n===\nsecond");
    }

    #[test]
    fn test_split_two_equals_is_not_a_separator() {
        assert_eq!(
            split("title: A\n==\nbody"),
            Err(MetadataError::MissingSeparator)
        );
    }

    #[test]
    fn test_split_requires_surrounding_whitespace() {
        assert_eq!(split("title: A===body"), Err(MetadataError::MissingSeparator));
    }

    #[test]
    fn test_split_missing_separator() {
        assert_eq!(
            split("# Just markdown\n\nNo metadata"),
            Err(MetadataError::MissingSeparator)
        );
    }

    #[test]
    fn test_meta_and_body_helpers() {
        let doc = "url: x\n===\ncontent";
        assert_eq!(meta(doc).unwrap(), "url: x");
        assert_eq!(body(doc).unwrap(), "content");
        assert!(body("no separator").is_err());
    }
}
