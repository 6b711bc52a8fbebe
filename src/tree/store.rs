//! TreeStore: the authoritative path-keyed store for collections and resources.
//!
//! Every collection owns two rows: its self-row `(path, ".")` carrying
//! metadata and ACL, and a child-reference row `(parent, "<name>/")` carrying
//! only its uuid. Resources are a single row `(container, name)`.
//! Conflict detection relies on the backend's `put_if_absent`, so concurrent
//! creators of the same path see exactly one winner.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::{EntryKind, StoreError, StoreResult};
use super::keys::Keys;
use super::kv::{KvBackend, MemoryKv};
use super::paths::{child_ref_name, merge, normalize_nfc, split, validate_name, validate_path, SEP};
use super::types::{Acl, Collection, Content, Entry, EntryUpdate, Metadata, Node, Resource, ROOT_PATH, SELF_NAME};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeCounts {
    pub collections: usize,
    pub resources: usize,
}

#[derive(Clone)]
pub struct TreeStore {
    kv: Arc<dyn KvBackend>,
}

impl TreeStore {
    pub fn new(kv: Arc<dyn KvBackend>) -> Self { Self { kv } }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryKv::new())) }

    fn decode(key: &str, value: JsonValue) -> StoreResult<Entry> {
        serde_json::from_value(value).map_err(|source| StoreError::Corrupt { key: key.to_string(), source })
    }

    fn encode(entry: &Entry) -> StoreResult<JsonValue> {
        serde_json::to_value(entry).map_err(|source| StoreError::Corrupt {
            key: Keys::entry(&entry.container, &entry.name),
            source,
        })
    }

    /// Raw row lookup. Both parts are NFC-normalized, matching how rows are written.
    pub fn get(&self, container: &str, name: &str) -> StoreResult<Option<Entry>> {
        let key = Keys::entry(&normalize_nfc(container), &normalize_nfc(name));
        match self.kv.get(&key)? {
            Some(v) => Ok(Some(Self::decode(&key, v)?)),
            None => Ok(None),
        }
    }

    pub fn find_collection(&self, path: &str) -> StoreResult<Option<Collection>> {
        Ok(self.get(path, SELF_NAME)?.map(Collection::from_entry))
    }

    pub fn find_resource(&self, path: &str) -> StoreResult<Option<Resource>> {
        let (container, name) = split(path);
        if name.is_empty() {
            return Ok(None);
        }
        match self.get(&container, &name)? {
            Some(e) if e.content.is_some() => Ok(Some(Resource::from_entry(e))),
            _ => Ok(None),
        }
    }

    /// Collection first, then resource.
    pub fn find(&self, path: &str) -> StoreResult<Option<Node>> {
        if let Some(c) = self.find_collection(path)? {
            return Ok(Some(Node::Collection(c)));
        }
        Ok(self.find_resource(path)?.map(Node::Resource))
    }

    /// Create the root self-row if it does not exist. Returns the root and whether it was created.
    pub fn create_root(&self, acl: Acl) -> StoreResult<(Collection, bool)> {
        let mut entry = Entry::new(ROOT_PATH, SELF_NAME, Uuid::new_v4());
        entry.acl = acl;
        let key = Keys::entry(ROOT_PATH, SELF_NAME);
        if self.kv.put_if_absent(&key, Self::encode(&entry)?)? {
            debug!(target: "canopy::tree", "created root uuid={}", entry.uuid);
            return Ok((Collection::from_entry(entry), true));
        }
        let existing = self.find_collection(ROOT_PATH)?.ok_or_else(|| StoreError::NotFound(ROOT_PATH.into()))?;
        Ok((existing, false))
    }

    /// Create a collection `name` under `container`.
    ///
    /// Fails with `NoSuchParent` if `container` has no self-row and with
    /// `NameConflict` if a resource or collection already occupies the path.
    pub fn create_collection(&self, name: &str, container: &str, metadata: Option<Metadata>) -> StoreResult<Collection> {
        self.create_collection_with_acl(name, container, metadata, Acl::new())
    }

    /// As [`TreeStore::create_collection`], with `acl` written in the same self-row.
    pub fn create_collection_with_acl(
        &self,
        name: &str,
        container: &str,
        metadata: Option<Metadata>,
        acl: Acl,
    ) -> StoreResult<Collection> {
        let name = normalize_nfc(name);
        let container = normalize_nfc(container);
        let container = container.as_str();
        validate_name(&name)?;
        validate_path(container)?;
        let path = merge(container, &name);

        if self.find_collection(container)?.is_none() {
            return Err(StoreError::NoSuchParent(container.to_string()));
        }
        if self.get(container, &name)?.is_some() {
            return Err(StoreError::conflict(EntryKind::Resource, path));
        }

        let mut entry = Entry::new(&path, SELF_NAME, Uuid::new_v4());
        entry.acl = acl;
        if let Some(m) = metadata { entry.metadata = m; }
        if !self.kv.put_if_absent(&Keys::entry(&path, SELF_NAME), Self::encode(&entry)?)? {
            return Err(StoreError::conflict(EntryKind::Collection, path));
        }
        let child = Entry::new(container, &child_ref_name(&name), entry.uuid);
        self.kv.put(&Keys::entry(container, &child.name), Self::encode(&child)?)?;
        debug!(target: "canopy::tree", "created collection path={} uuid={}", path, entry.uuid);
        Ok(Collection::from_entry(entry))
    }

    /// Create a resource row `(container, name)`.
    pub fn create_resource(
        &self,
        container: &str,
        name: &str,
        content: Content,
        metadata: Option<Metadata>,
        acl: Acl,
    ) -> StoreResult<Resource> {
        let name = normalize_nfc(name);
        let container = normalize_nfc(container);
        let container = container.as_str();
        validate_name(&name)?;
        validate_path(container)?;
        let path = merge(container, &name);

        if self.find_collection(container)?.is_none() {
            return Err(StoreError::NoSuchParent(container.to_string()));
        }
        if self.find_collection(&path)?.is_some() || self.get(container, &child_ref_name(&name))?.is_some() {
            return Err(StoreError::conflict(EntryKind::Collection, path));
        }

        let mut entry = Entry::new(container, &name, Uuid::new_v4());
        entry.content = Some(content);
        entry.acl = acl;
        if let Some(m) = metadata { entry.metadata = m; }
        if !self.kv.put_if_absent(&Keys::entry(container, &name), Self::encode(&entry)?)? {
            return Err(StoreError::conflict(EntryKind::Resource, path));
        }
        debug!(target: "canopy::tree", "created resource path={} uuid={}", path, entry.uuid);
        Ok(Resource::from_entry(entry))
    }

    /// Apply a partial update to the row `(container, name)`; `modified_ts` is always recomputed.
    pub fn update(&self, container: &str, name: &str, update: EntryUpdate) -> StoreResult<Entry> {
        let key = Keys::entry(&normalize_nfc(container), &normalize_nfc(name));
        let mut entry = match self.kv.get(&key)? {
            Some(v) => Self::decode(&key, v)?,
            None => return Err(StoreError::NotFound(merge(container, name))),
        };
        update.apply(&mut entry);
        self.kv.put(&key, Self::encode(&entry)?)?;
        Ok(entry)
    }

    /// Remove the tree rows of the node at `path`. For a collection this is
    /// every row keyed under its path plus the parent's child reference; the
    /// root is never removed.
    ///
    /// Descendant collections keep their self-rows and stay visible to
    /// `find_collection`, `nodes` and `counts`. Deleting a non-empty
    /// collection must go through `Catalog::delete_all`, which empties it first.
    pub fn delete(&self, path: &str) -> StoreResult<Option<Node>> {
        match self.find(path)? {
            Some(Node::Collection(c)) if c.is_root => Ok(None),
            Some(Node::Collection(c)) => {
                for (k, _) in self.kv.scan_prefix(&Keys::container_prefix(&c.path))? {
                    self.kv.delete(&k)?;
                }
                self.kv.delete(&Keys::entry(&c.container, &child_ref_name(&c.name)))?;
                debug!(target: "canopy::tree", "deleted collection rows path={}", c.path);
                Ok(Some(Node::Collection(c)))
            }
            Some(Node::Resource(r)) => {
                self.kv.delete(&Keys::entry(r.container(), r.name()))?;
                debug!(target: "canopy::tree", "deleted resource row path={}", r.path);
                Ok(Some(Node::Resource(r)))
            }
            None => Ok(None),
        }
    }

    /// Child names of the collection at `path`, partitioned into (collections, resources).
    pub fn get_children(&self, path: &str) -> StoreResult<(Vec<String>, Vec<String>)> {
        let mut collections = Vec::new();
        let mut resources = Vec::new();
        for (k, _) in self.kv.scan_prefix(&Keys::container_prefix(&normalize_nfc(path)))? {
            let Some((_, name)) = Keys::parse_entry(&k) else { continue };
            if name == SELF_NAME {
                continue;
            }
            match name.strip_suffix(SEP) {
                Some(coll) => collections.push(coll.to_string()),
                None => resources.push(name.to_string()),
            }
        }
        Ok((collections, resources))
    }

    /// Every self-row and resource row (child references excluded).
    pub fn nodes(&self) -> StoreResult<Vec<Node>> {
        let mut out = Vec::new();
        for (k, v) in self.kv.scan_prefix(Keys::entry_prefix())? {
            let e = Self::decode(&k, v)?;
            if e.is_self_row() {
                out.push(Node::Collection(Collection::from_entry(e)));
            } else if e.content.is_some() {
                out.push(Node::Resource(Resource::from_entry(e)));
            }
        }
        Ok(out)
    }

    pub fn counts(&self) -> StoreResult<TreeCounts> {
        let mut counts = TreeCounts::default();
        for n in self.nodes()? {
            match n {
                Node::Collection(_) => counts.collections += 1,
                Node::Resource(_) => counts.resources += 1,
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod store_tests;
