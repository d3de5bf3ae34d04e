//! Utility functions for the content indexer repository.

use crate::errors::SearchIndexError;

/// Maximum length of an index name in bytes.
pub const MAX_INDEX_NAME_BYTES: usize = 255;

const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Validate item and site identifiers.
///
/// Identifiers handed over by the CMS are positive integers; zero means the
/// caller never resolved the item.
///
/// # Example
///
/// ```
/// use content_indexer_repository::validate_item_and_site_ids;
///
/// assert!(validate_item_and_site_ids(12, 1).is_ok());
/// assert!(validate_item_and_site_ids(0, 1).is_err());
/// ```
pub fn validate_item_and_site_ids(item_id: u64, site_id: u64) -> Result<(), SearchIndexError> {
    if item_id == 0 {
        return Err(SearchIndexError::validation("item_id is required"));
    }
    if site_id == 0 {
        return Err(SearchIndexError::validation("site_id is required"));
    }
    Ok(())
}

/// Validate an index name against the search engine's naming rules.
///
/// Names must be lowercase, must not contain `\ / * ? " < > | , # :` or
/// spaces, must not start with `-`, `_` or `+`, must not be `.` or `..`, and
/// must not exceed 255 bytes.
pub fn validate_index_name(name: &str) -> Result<(), SearchIndexError> {
    if name.is_empty() {
        return Err(SearchIndexError::validation("Index name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' is reserved",
            name
        )));
    }
    if name.len() > MAX_INDEX_NAME_BYTES {
        return Err(SearchIndexError::validation(format!(
            "Index name exceeds {} bytes",
            MAX_INDEX_NAME_BYTES
        )));
    }
    if name.starts_with(['-', '_', '+']) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' cannot start with '-', '_' or '+'",
            name
        )));
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' must be lowercase",
            name
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' contains invalid character '{}'",
            name, c
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_and_site_ids() {
        assert!(validate_item_and_site_ids(1, 1).is_ok());
        assert!(matches!(
            validate_item_and_site_ids(0, 1).unwrap_err(),
            SearchIndexError::ValidationError(_)
        ));
        assert!(matches!(
            validate_item_and_site_ids(1, 0).unwrap_err(),
            SearchIndexError::ValidationError(_)
        ));
    }

    #[test]
    fn test_validate_index_name_valid() {
        for name in ["craft_content_1", "site-search_2", "a", "content.v2_1"] {
            assert!(validate_index_name(name).is_ok(), "expected '{}' to be valid", name);
        }
    }

    #[test]
    fn test_validate_index_name_invalid() {
        let long = "a".repeat(256);
        let test_cases = vec![
            ("", "empty"),
            (".", "dot"),
            ("..", "double dot"),
            ("_content", "leading underscore"),
            ("-content", "leading dash"),
            ("+content", "leading plus"),
            ("Content_1", "uppercase"),
            ("content 1", "space"),
            ("content,1", "comma"),
            ("content#1", "hash"),
            ("content*", "star"),
            ("con/tent", "slash"),
            (long.as_str(), "too long"),
        ];

        for (name, description) in test_cases {
            let result = validate_index_name(name);
            assert!(
                matches!(result, Err(SearchIndexError::ValidationError(_))),
                "Expected ValidationError for '{}' ({})",
                name,
                description
            );
        }
    }
}
