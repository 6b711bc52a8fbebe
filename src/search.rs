//! Search index hook. The catalog resets and re-indexes a node whenever it
//! changes; the query language itself belongs to the external index.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::tree::Node;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IndexField {
    Name,
    Metadata,
}

pub trait SearchIndex: Send + Sync {
    /// Forget everything indexed for `node_id`.
    fn reset(&self, node_id: Uuid) -> StoreResult<()>;
    /// Index the selected fields of `node`; returns the number of distinct terms recorded.
    fn index(&self, node: &Node, fields: &[IndexField]) -> StoreResult<usize>;
}

/// Lowercased alphanumeric runs.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(str::to_lowercase)
}

fn terms_for(node: &Node, fields: &[IndexField]) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    for field in fields {
        match field {
            IndexField::Name => terms.extend(tokenize(node.name())),
            IndexField::Metadata => {
                for (k, v) in node.metadata() {
                    terms.extend(tokenize(k));
                    terms.extend(tokenize(v));
                }
            }
        }
    }
    terms
}

#[derive(Default)]
struct Inner {
    postings: HashMap<String, BTreeSet<Uuid>>,
    docs: HashMap<Uuid, BTreeSet<String>>,
}

/// In-memory inverted index.
#[derive(Clone, Default)]
pub struct MemorySearchIndex {
    inner: Arc<RwLock<Inner>>,
}

impl MemorySearchIndex {
    pub fn new() -> Self { Self::default() }

    pub fn doc_count(&self) -> usize { self.inner.read().docs.len() }

    pub fn terms_of(&self, node_id: Uuid) -> BTreeSet<String> {
        self.inner.read().docs.get(&node_id).cloned().unwrap_or_default()
    }

    /// Nodes matching any of `query`'s terms, most matching terms first.
    pub fn find(&self, query: &str) -> Vec<(Uuid, usize)> {
        let r = self.inner.read();
        let mut hits: HashMap<Uuid, usize> = HashMap::new();
        for term in tokenize(query).collect::<BTreeSet<_>>() {
            if let Some(ids) = r.postings.get(&term) {
                for id in ids {
                    *hits.entry(*id).or_default() += 1;
                }
            }
        }
        let mut out: Vec<(Uuid, usize)> = hits.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        out
    }
}

impl SearchIndex for MemorySearchIndex {
    fn reset(&self, node_id: Uuid) -> StoreResult<()> {
        let mut w = self.inner.write();
        if let Some(terms) = w.docs.remove(&node_id) {
            for t in terms {
                if let Some(ids) = w.postings.get_mut(&t) {
                    ids.remove(&node_id);
                    if ids.is_empty() {
                        w.postings.remove(&t);
                    }
                }
            }
        }
        Ok(())
    }

    fn index(&self, node: &Node, fields: &[IndexField]) -> StoreResult<usize> {
        let id = node.uuid();
        let terms = terms_for(node, fields);
        let mut w = self.inner.write();
        for t in &terms {
            w.postings.entry(t.clone()).or_default().insert(id);
        }
        let n = terms.len();
        w.docs.entry(id).or_default().extend(terms);
        Ok(n)
    }
}
