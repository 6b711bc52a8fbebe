use unicode_normalization::UnicodeNormalization;

use crate::error::{StoreError, StoreResult};

/// Separator between path segments and the marker appended to child-reference names.
pub const SEP: char = '/';

/// Normalize a UTF-8 string to NFC.
pub fn normalize_nfc(input: &str) -> String {
    input.nfc().collect::<String>()
}

/// Validate a single entry name:
/// - not empty, not "." or ".."
/// - no '/' (names are single segments) and no NUL
pub fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::InvalidPath("name cannot be empty".into()));
    }
    if name == "." || name == ".." {
        return Err(StoreError::InvalidPath(format!("'{}' is not allowed as a name", name)));
    }
    if name.contains(SEP) {
        return Err(StoreError::InvalidPath(format!("name '{}' contains '/'", name)));
    }
    if name.chars().any(|c| c == '\u{0000}') {
        return Err(StoreError::InvalidPath("name cannot contain NUL characters".into()));
    }
    Ok(())
}

/// Validate an absolute container path: starts with '/', no empty segments,
/// no trailing '/' except for the root itself.
pub fn validate_path(path: &str) -> StoreResult<()> {
    if !path.starts_with(SEP) {
        return Err(StoreError::InvalidPath(format!("path '{}' must be absolute", path)));
    }
    if path == "/" {
        return Ok(());
    }
    if path.ends_with(SEP) {
        return Err(StoreError::InvalidPath(format!("path '{}' has a trailing '/'", path)));
    }
    for seg in path[1..].split(SEP) {
        validate_name(seg)?;
    }
    Ok(())
}

/// Join a container path and a name.
pub fn merge(container: &str, name: &str) -> String {
    if container.ends_with(SEP) {
        format!("{}{}", container, name)
    } else {
        format!("{}{}{}", container, SEP, name)
    }
}

/// Split a path into (container, name). The root splits into ("/", "").
pub fn split(path: &str) -> (String, String) {
    let trimmed = path.trim_end_matches(SEP);
    match trimmed.rfind(SEP) {
        Some(0) => ("/".to_string(), trimmed[1..].to_string()),
        Some(i) => (trimmed[..i].to_string(), trimmed[i + 1..].to_string()),
        None if trimmed.is_empty() => ("/".to_string(), String::new()),
        None => ("/".to_string(), trimmed.to_string()),
    }
}

/// Name of the child-reference row a collection leaves in its parent.
pub fn child_ref_name(name: &str) -> String {
    format!("{}{}", name, SEP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_nfc_basic() {
        // 'e' + combining acute should normalize to the precomposed form
        let s = "Cafe\u{0301}";
        assert_eq!(normalize_nfc(s), "Caf\u{e9}");
    }

    #[test]
    fn test_split_and_merge() {
        assert_eq!(split("/"), ("/".to_string(), String::new()));
        assert_eq!(split("/a"), ("/".to_string(), "a".to_string()));
        assert_eq!(split("/a/b/c.txt"), ("/a/b".to_string(), "c.txt".to_string()));
        assert_eq!(merge("/", "a"), "/a");
        assert_eq!(merge("/a/b", "c.txt"), "/a/b/c.txt");
        let (c, n) = split(&merge("/x/y", "z"));
        assert_eq!((c.as_str(), n.as_str()), ("/x/y", "z"));
    }

    #[test]
    fn test_invalid_paths() {
        assert!(validate_path("").is_err());
        assert!(validate_path("relative/path").is_err());
        assert!(validate_path("/trailing/").is_err());
        assert!(validate_path("/double//slash").is_err());
        assert!(validate_path("/a/../b").is_err());
        assert!(validate_path("/").is_ok());
        assert!(validate_path("/docs/2024").is_ok());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name(&format!("a\u{0000}b")).is_err());
    }
}
