//! Typed page metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{FrontMatter, MetadataError, to_snake_case};

/// Metadata of a single page.
///
/// `title` and `url` are required, `author` is optional, and every other
/// front-matter field ends up in `extra`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Page title.
    pub title: String,
    /// Page URL, unique across the archive.
    pub url: String,
    /// Page author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Additional front-matter fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl PageMeta {
    /// Build page metadata from parsed front matter.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Incomplete`] if `title` or `url` is missing.
    pub fn from_front_matter(mut fields: FrontMatter) -> Result<Self, MetadataError> {
        let title = take_required(&mut fields, "title")?;
        let url = take_required(&mut fields, "url")?;
        let author = fields.remove("author");

        Ok(Self {
            title,
            url,
            author,
            extra: fields,
        })
    }

    /// Look up a field by name.
    ///
    /// Covers `title`, `url`, `author` and all extra fields. Names are accepted
    /// in snake_case or camelCase (`publishDate` finds `publish_date`).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.lookup(name).or_else(|| {
            let snake = to_snake_case(name);
            if snake == name {
                None
            } else {
                self.lookup(&snake)
            }
        })
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "url" => Some(&self.url),
            "author" => self.author.as_deref(),
            _ => self.extra.get(name).map(String::as_str),
        }
    }
}

fn take_required(fields: &mut FrontMatter, field: &str) -> Result<String, MetadataError> {
    fields.remove(field).ok_or_else(|| MetadataError::Incomplete {
        field: field.to_owned(),
    })
}
