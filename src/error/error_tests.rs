use super::*;

#[test]
fn code_mapping() {
    assert_eq!(StoreError::NoSuchParent("/a".into()).code_str(), "no_such_parent");
    assert_eq!(StoreError::conflict(EntryKind::Resource, "/a/b").code_str(), "name_conflict");
    assert_eq!(StoreError::transient("timeout").code_str(), "transient_store_error");
    assert_eq!(StoreError::FilterNotFound("x".into()).code_str(), "filter_not_found");
    assert_eq!(StoreError::InvalidJob("empty name".into()).code_str(), "invalid_job");
}

#[test]
fn only_store_class_is_retryable() {
    assert!(StoreError::transient("x").is_retryable());
    assert!(StoreError::Graph("x".into()).is_retryable());
    let io = std::io::Error::new(std::io::ErrorKind::Interrupted, "eintr");
    assert!(StoreError::from(io).is_retryable());

    assert!(!StoreError::InvalidJob("x".into()).is_retryable());
    assert!(!StoreError::NoSuchParent("/x".into()).is_retryable());
    assert!(!StoreError::conflict(EntryKind::Collection, "/x").is_retryable());
    assert!(!StoreError::InvalidPath("x".into()).is_retryable());
}

#[test]
fn conflict_display_names_kind_and_path() {
    let e = StoreError::conflict(EntryKind::Collection, "/docs");
    assert_eq!(e.to_string(), "collection already exists at /docs");
    assert!(e.is_conflict());
}
