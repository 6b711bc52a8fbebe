//! Core tree data contracts (rows persisted in the KV backend) and the
//! collection/resource views built over them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EntryKind;
use super::paths::{merge, split};

/// Name of a collection's self-row.
pub const SELF_NAME: &str = ".";
pub const ROOT_PATH: &str = "/";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccessMask {
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "write")]
    Write,
    #[serde(rename = "read/write")]
    ReadWrite,
}

impl AccessMask {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMask::Read => "read",
            AccessMask::Write => "write",
            AccessMask::ReadWrite => "read/write",
        }
    }

    pub fn can_read(&self) -> bool { matches!(self, AccessMask::Read | AccessMask::ReadWrite) }

    pub fn can_write(&self) -> bool { matches!(self, AccessMask::Write | AccessMask::ReadWrite) }
}

/// Group id -> mask. An empty map means "no local rule, inherit from the parent".
pub type Acl = BTreeMap<String, AccessMask>;

pub type Metadata = BTreeMap<String, String>;

/// Content pointer carried by resource rows only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    pub url: String,
    pub size: u64,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// One row of the tree store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub container: String,
    pub name: String,
    pub uuid: Uuid,
    pub create_ts: DateTime<Utc>,
    pub modified_ts: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub acl: Acl,
    #[serde(default)]
    pub content: Option<Content>,
}

impl Entry {
    pub fn new(container: &str, name: &str, uuid: Uuid) -> Self {
        let now = Utc::now();
        Self {
            container: container.to_string(),
            name: name.to_string(),
            uuid,
            create_ts: now,
            modified_ts: now,
            metadata: Metadata::new(),
            acl: Acl::new(),
            content: None,
        }
    }

    pub fn is_self_row(&self) -> bool { self.name == SELF_NAME }

    pub fn is_child_ref(&self) -> bool { self.name.ends_with(super::paths::SEP) }
}

/// Partial update: only the supplied fields change. `modified_ts` is always restamped.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub metadata: Option<Metadata>,
    pub acl: Option<Acl>,
    pub url: Option<String>,
    pub size: Option<u64>,
    pub mimetype: Option<Option<String>>,
}

impl EntryUpdate {
    pub fn apply(self, entry: &mut Entry) {
        if let Some(m) = self.metadata { entry.metadata = m; }
        if let Some(a) = self.acl { entry.acl = a; }
        if let Some(c) = entry.content.as_mut() {
            if let Some(u) = self.url { c.url = u; }
            if let Some(s) = self.size { c.size = s; }
            if let Some(mt) = self.mimetype { c.mimetype = mt; }
        }
        entry.modified_ts = Utc::now();
    }
}

/// Collection view over a self-row.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub entry: Entry,
    pub is_root: bool,
    pub name: String,
    pub path: String,
    pub container: String,
}

impl Collection {
    pub fn from_entry(entry: Entry) -> Self {
        let is_root = entry.is_self_row() && entry.container == ROOT_PATH;
        let path = entry.container.clone();
        let (container, name) = split(&path);
        let name = if is_root { ROOT_PATH.to_string() } else { name };
        Self { entry, is_root, name, path, container }
    }

    pub fn uuid(&self) -> Uuid { self.entry.uuid }
}

/// Resource view over a leaf row.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub entry: Entry,
    pub path: String,
}

impl Resource {
    pub fn from_entry(entry: Entry) -> Self {
        let path = merge(&entry.container, &entry.name);
        Self { entry, path }
    }

    pub fn uuid(&self) -> Uuid { self.entry.uuid }
    pub fn name(&self) -> &str { &self.entry.name }
    pub fn container(&self) -> &str { &self.entry.container }
    pub fn url(&self) -> &str { self.entry.content.as_ref().map(|c| c.url.as_str()).unwrap_or("") }
    pub fn size(&self) -> u64 { self.entry.content.as_ref().map(|c| c.size).unwrap_or(0) }
    pub fn mimetype(&self) -> Option<&str> { self.entry.content.as_ref().and_then(|c| c.mimetype.as_deref()) }
}

/// Either view, dispatched explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Collection(Collection),
    Resource(Resource),
}

impl Node {
    pub fn kind(&self) -> EntryKind {
        match self {
            Node::Collection(_) => EntryKind::Collection,
            Node::Resource(_) => EntryKind::Resource,
        }
    }

    pub fn entry(&self) -> &Entry {
        match self {
            Node::Collection(c) => &c.entry,
            Node::Resource(r) => &r.entry,
        }
    }

    pub fn uuid(&self) -> Uuid { self.entry().uuid }

    pub fn path(&self) -> &str {
        match self {
            Node::Collection(c) => &c.path,
            Node::Resource(r) => &r.path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Collection(c) => &c.name,
            Node::Resource(r) => &r.entry.name,
        }
    }

    /// Path of the collection this node inherits from; None for the root.
    pub fn parent_path(&self) -> Option<&str> {
        match self {
            Node::Collection(c) if c.is_root => None,
            Node::Collection(c) => Some(&c.container),
            Node::Resource(r) => Some(&r.entry.container),
        }
    }

    pub fn acl(&self) -> &Acl { &self.entry().acl }

    pub fn metadata(&self) -> &Metadata { &self.entry().metadata }
}
