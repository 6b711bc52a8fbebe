//! Tree store: path-keyed rows for the collection/resource hierarchy.

pub mod paths;
pub mod keys;
pub mod kv;
pub mod types;
pub mod store;

pub use kv::{KvBackend, MemoryKv};
pub use paths::{merge, split, normalize_nfc};
pub use store::{TreeCounts, TreeStore};
pub use types::{AccessMask, Acl, Collection, Content, Entry, EntryUpdate, Metadata, Node, Resource, ROOT_PATH, SELF_NAME};
