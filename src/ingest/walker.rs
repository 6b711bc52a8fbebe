//! Source tree traversal: depth-first, top-down, following symlinks, with
//! every dot-prefixed component pruned.

use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{StoreError, StoreResult};
use super::names::decode_os;

pub fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Directory to start walking from. With a pattern, the first immediate
/// subdirectory of `root` (by name) whose name contains it, ignoring case.
pub fn resolve_start(root: &Path, pattern: Option<&str>) -> StoreResult<PathBuf> {
    let Some(pattern) = pattern else { return Ok(root.to_path_buf()) };
    let needle = pattern.to_lowercase();
    let mut names: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        // metadata() follows symlinks, so linked directories count.
        if !std::fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = decode_os(&entry.file_name());
        if name.starts_with('.') {
            continue;
        }
        names.push((name, path));
    }
    names.sort();
    names
        .into_iter()
        .find(|(name, _)| name.to_lowercase().contains(&needle))
        .map(|(_, path)| path)
        .ok_or_else(|| StoreError::FilterNotFound(pattern.to_string()))
}

/// Entries under `start` in walk order, hidden components pruned.
pub fn walk(start: &Path) -> walkdir::FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool> {
    fn visible(e: &DirEntry) -> bool { !is_hidden(e) }
    WalkDir::new(start)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(visible as fn(&DirEntry) -> bool)
}

/// Collection path mirroring `dir` relative to the ingest `root`, in its on-disk
/// spelling (not NFC-normalized); "/" for the root itself.
pub fn collection_path(root: &Path, dir: &Path) -> StoreResult<String> {
    let rel = dir
        .strip_prefix(root)
        .map_err(|_| StoreError::InvalidPath(format!("{} is outside {}", dir.display(), root.display())))?;
    let segments: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(decode_os(s)),
            _ => None,
        })
        .collect();
    Ok(format!("/{}", segments.join("/")))
}
