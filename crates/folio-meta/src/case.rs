/// Convert a camelCase or PascalCase name to snake_case.
///
/// Already snake_case names are returned unchanged:
/// - `publishDate` -> `publish_date`
/// - `LastUpdate` -> `last_update`
/// - `author` -> `author`
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("publishDate"), "publish_date");
        assert_eq!(to_snake_case("LastUpdate"), "last_update");
        assert_eq!(to_snake_case("author"), "author");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case(""), "");
    }
}
