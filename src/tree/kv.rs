//! Key/value backend the tree store is layered on.
//! The trait is what a durable store must expose; `MemoryKv` is the
//! in-process implementation used by the binary and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use crate::error::StoreResult;

/// Operations the tree store needs from its backend. Implementations must be
/// safe for concurrent writers; `put_if_absent` is the only atomic primitive
/// relied upon.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<JsonValue>>;
    fn put(&self, key: &str, value: JsonValue) -> StoreResult<()>;
    /// Insert only when the key is vacant. Returns false if a value was already present.
    fn put_if_absent(&self, key: &str, value: JsonValue) -> StoreResult<bool>;
    fn delete(&self, key: &str) -> StoreResult<bool>;
    /// All (key, value) pairs whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, JsonValue)>>;
}

/// A single named in-memory KV map.
#[derive(Clone, Default)]
pub struct MemoryKv {
    map: Arc<RwLock<BTreeMap<String, JsonValue>>>,
}

impl MemoryKv {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.map.read().len() }

    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }

    pub fn keys(&self) -> Vec<String> { self.map.read().keys().cloned().collect() }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> StoreResult<Option<JsonValue>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: JsonValue) -> StoreResult<()> {
        self.map.write().insert(key.to_string(), value);
        Ok(())
    }

    fn put_if_absent(&self, key: &str, value: JsonValue) -> StoreResult<bool> {
        let mut w = self.map.write();
        if w.contains_key(key) {
            return Ok(false);
        }
        w.insert(key.to_string(), value);
        Ok(true)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.map.write().remove(key).is_some())
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, JsonValue)>> {
        let r = self.map.read();
        Ok(r.range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_if_absent_is_first_writer_wins() {
        let kv = MemoryKv::new();
        assert!(kv.put_if_absent("a", json!(1)).unwrap());
        assert!(!kv.put_if_absent("a", json!(2)).unwrap());
        assert_eq!(kv.get("a").unwrap(), Some(json!(1)));
    }

    #[test]
    fn scan_prefix_is_ordered_and_bounded() {
        let kv = MemoryKv::new();
        for k in ["p::b", "p::a", "q::a", "p:", "p::c"] {
            kv.put(k, json!(k)).unwrap();
        }
        let keys: Vec<String> = kv.scan_prefix("p::").unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["p::a", "p::b", "p::c"]);
        assert!(kv.delete("p::a").unwrap());
        assert!(!kv.delete("p::a").unwrap());
        assert_eq!(kv.len(), 4);
    }
}
