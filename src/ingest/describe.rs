//! What can be learned about a local file without reading it.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use super::names::decode_os;

static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("txt", "text/plain"),
        ("text", "text/plain"),
        ("log", "text/plain"),
        ("md", "text/markdown"),
        ("csv", "text/csv"),
        ("tsv", "text/tab-separated-values"),
        ("html", "text/html"),
        ("htm", "text/html"),
        ("css", "text/css"),
        ("xml", "application/xml"),
        ("js", "application/javascript"),
        ("json", "application/json"),
        ("pdf", "application/pdf"),
        ("zip", "application/zip"),
        ("gz", "application/gzip"),
        ("tar", "application/x-tar"),
        ("doc", "application/msword"),
        ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        ("xls", "application/vnd.ms-excel"),
        ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        ("ppt", "application/vnd.ms-powerpoint"),
        ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
        ("py", "text/x-python"),
        ("sh", "application/x-sh"),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("svg", "image/svg+xml"),
        ("tif", "image/tiff"),
        ("tiff", "image/tiff"),
        ("mp3", "audio/mpeg"),
        ("wav", "audio/x-wav"),
        ("mp4", "video/mp4"),
        ("mov", "video/quicktime"),
    ])
});

/// Mimetype guessed from the extension, case-insensitively.
pub fn guess_mimetype(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    MIME_TYPES.get(ext.to_ascii_lowercase().as_str()).copied()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub size: u64,
    pub mimetype: Option<String>,
    /// Upper-cased extension, empty when there is none.
    pub ext_type: String,
}

pub fn describe(path: &Path) -> StoreResult<LocalFile> {
    let size = std::fs::metadata(path)?.len();
    let name = path.file_name().map(decode_os).unwrap_or_default();
    let ext_type = path.extension().map(|e| decode_os(e).to_uppercase()).unwrap_or_default();
    Ok(LocalFile { mimetype: guess_mimetype(&name).map(str::to_string), name, size, ext_type })
}
