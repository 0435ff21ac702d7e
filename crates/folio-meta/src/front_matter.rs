//! YAML front-matter parsing.
//!
//! Front matter is flat: every value is a scalar. Strings are kept as-is,
//! numbers and booleans are stringified, and `null` values are dropped, so the
//! result is always a `String -> String` map.

use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::MetadataError;

/// Flat key/value metadata parsed from a document's front matter.
pub type FrontMatter = BTreeMap<String, String>;

/// Parse a YAML metadata block into a flat [`FrontMatter`] map.
///
/// Empty (or whitespace-only) input yields an empty map.
///
/// # Errors
///
/// Returns [`MetadataError::Parse`] if the block is not valid YAML or not a
/// mapping, and [`MetadataError::NonScalar`] if a value is a sequence or mapping.
pub fn parse_front_matter(block: &str) -> Result<FrontMatter, MetadataError> {
    let trimmed = block.trim();
    if trimmed.is_empty() {
        return Ok(FrontMatter::new());
    }

    let value: Value = serde_yaml::from_str(trimmed)
        .map_err(|e| MetadataError::Parse(format!("Invalid YAML: {e}")))?;

    let Value::Mapping(mapping) = value else {
        return Err(MetadataError::Parse(
            "front matter must be a mapping of fields".to_owned(),
        ));
    };

    let mut fields = FrontMatter::new();
    for (key, value) in mapping {
        let key = scalar_to_string(&key)
            .ok_or_else(|| MetadataError::Parse("front matter keys must be scalars".to_owned()))?;
        match value {
            Value::Null => {}
            Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
                return Err(MetadataError::NonScalar { field: key });
            }
            scalar => {
                if let Some(text) = scalar_to_string(&scalar) {
                    fields.insert(key, text);
                }
            }
        }
    }

    Ok(fields)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
