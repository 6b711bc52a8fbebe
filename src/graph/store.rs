//! Graph store contract and the in-process implementation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use super::query::{EdgeLabel, GraphBatch, GraphOp, Properties, VertexKey, VertexLabel};

/// Operations the graph mirror needs from a graph database.
pub trait GraphStore: Send + Sync {
    /// Apply a batch. A batch either applies fully or fails without effect.
    fn execute(&self, batch: &GraphBatch) -> StoreResult<()>;
    fn vertex(&self, key: &VertexKey) -> StoreResult<Option<Properties>>;
    /// Targets of `label` edges leaving `from`.
    fn out_edges(&self, from: &VertexKey, label: EdgeLabel) -> StoreResult<Vec<VertexKey>>;
    fn vertices(&self, label: VertexLabel) -> StoreResult<Vec<VertexKey>>;
}

#[derive(Default)]
struct Inner {
    vertices: HashMap<VertexKey, Properties>,
    edges: BTreeSet<(EdgeLabel, VertexKey, VertexKey)>,
}

fn missing(key: &VertexKey) -> StoreError {
    StoreError::Graph(format!("vertex {:?} {} not found", key.label, key.uuid))
}

impl Inner {
    fn apply(&mut self, op: &GraphOp) {
        match op {
            GraphOp::AddVertex { key, props } => {
                self.vertices.entry(*key).or_insert_with(|| props.clone());
            }
            GraphOp::AddEdge { label, from, to } => {
                self.edges.insert((*label, *from, *to));
            }
            GraphOp::SetProperty { key, name, value } => {
                if let Some(p) = self.vertices.get_mut(key) {
                    p.insert(name.clone(), value.clone());
                }
            }
            GraphOp::DropProperty { key, name } => {
                if let Some(p) = self.vertices.get_mut(key) {
                    p.remove(name);
                }
            }
            GraphOp::DropVertex { key } => {
                self.vertices.remove(key);
                self.edges.retain(|(_, f, t)| f != key && t != key);
            }
        }
    }
}

/// In-memory property graph. Dropping a vertex cascades to its edges.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryGraph {
    pub fn new() -> Self { Self::default() }

    pub fn vertex_count(&self) -> usize { self.inner.read().vertices.len() }

    pub fn edge_count(&self) -> usize { self.inner.read().edges.len() }

    pub fn has_edge(&self, label: EdgeLabel, from: &VertexKey, to: &VertexKey) -> bool {
        self.inner.read().edges.contains(&(label, *from, *to))
    }
}

impl GraphStore for MemoryGraph {
    fn execute(&self, batch: &GraphBatch) -> StoreResult<()> {
        let mut w = self.inner.write();
        // Validate against the state the batch itself builds up, then apply.
        let mut pending: BTreeSet<VertexKey> = BTreeSet::new();
        let mut dropped: BTreeSet<VertexKey> = BTreeSet::new();
        let exists = |k: &VertexKey, pending: &BTreeSet<VertexKey>, dropped: &BTreeSet<VertexKey>, inner: &Inner| {
            !dropped.contains(k) && (pending.contains(k) || inner.vertices.contains_key(k))
        };
        for op in batch.ops() {
            match op {
                GraphOp::AddVertex { key, .. } => {
                    dropped.remove(key);
                    pending.insert(*key);
                }
                GraphOp::AddEdge { from, to, .. } => {
                    for k in [from, to] {
                        if !exists(k, &pending, &dropped, &*w) {
                            return Err(missing(k));
                        }
                    }
                }
                GraphOp::SetProperty { key, .. } | GraphOp::DropProperty { key, .. } => {
                    if !exists(key, &pending, &dropped, &*w) {
                        return Err(missing(key));
                    }
                }
                GraphOp::DropVertex { key } => {
                    pending.remove(key);
                    dropped.insert(*key);
                }
            }
        }
        for op in batch.ops() {
            w.apply(op);
        }
        Ok(())
    }

    fn vertex(&self, key: &VertexKey) -> StoreResult<Option<Properties>> {
        Ok(self.inner.read().vertices.get(key).cloned())
    }

    fn out_edges(&self, from: &VertexKey, label: EdgeLabel) -> StoreResult<Vec<VertexKey>> {
        Ok(self
            .inner
            .read()
            .edges
            .iter()
            .filter(|(l, f, _)| *l == label && f == from)
            .map(|(_, _, t)| *t)
            .collect())
    }

    fn vertices(&self, label: VertexLabel) -> StoreResult<Vec<VertexKey>> {
        let mut out: Vec<VertexKey> = self.inner.read().vertices.keys().filter(|k| k.label == label).copied().collect();
        out.sort();
        Ok(out)
    }
}
