//! GraphMirror: the derived vertex/edge view of the tree.
//!
//! Mutations here run after the tree write they mirror has committed and are
//! allowed to fail; callers log and carry on. A stale mirror is brought back
//! in line by `check_root` on root lookup or by an explicit `reconcile`.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::identity::User;
use crate::tree::{Collection, Metadata, Node, Resource, TreeStore};
use super::query::{
    collection_props, is_reserved, resource_props, user_props, EdgeLabel, GraphBatch, Properties, VertexKey,
    VertexLabel,
};
use super::store::{GraphStore, MemoryGraph};

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub vertices_added: usize,
    pub edges_added: usize,
    pub vertices_dropped: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool { *self == RepairReport::default() }
}

pub fn vertex_key(node: &Node) -> VertexKey {
    match node {
        Node::Collection(c) => VertexKey::collection(c.uuid()),
        Node::Resource(r) => VertexKey::resource(r.uuid()),
    }
}

fn node_props(node: &Node) -> Properties {
    match node {
        Node::Collection(c) => collection_props(c),
        Node::Resource(r) => resource_props(r),
    }
}

#[derive(Clone)]
pub struct GraphMirror {
    graph: Arc<dyn GraphStore>,
}

impl GraphMirror {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self { Self { graph } }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryGraph::new())) }

    pub fn store(&self) -> &Arc<dyn GraphStore> { &self.graph }

    pub fn has_vertex(&self, key: &VertexKey) -> StoreResult<bool> {
        Ok(self.graph.vertex(key)?.is_some())
    }

    pub fn add_root(&self, root: &Collection) -> StoreResult<()> {
        let batch = GraphBatch::new().add_vertex(VertexKey::collection(root.uuid()), collection_props(root));
        self.graph.execute(&batch)?;
        info!(target: "canopy::graph", "root vertex {} added", root.uuid());
        Ok(())
    }

    /// True when the root's vertex exists.
    pub fn check_root(&self, root: &Collection) -> StoreResult<bool> {
        self.has_vertex(&VertexKey::collection(root.uuid()))
    }

    pub fn ensure_user(&self, user: &User) -> StoreResult<VertexKey> {
        let key = VertexKey::user(user.uuid);
        self.graph.execute(&GraphBatch::new().add_vertex(key, user_props(user)))?;
        Ok(key)
    }

    fn attach(&self, parent: Uuid, key: VertexKey, props: Properties, owner: Option<&User>) -> StoreResult<()> {
        let parent_key = VertexKey::collection(parent);
        let mut batch = GraphBatch::new().add_vertex(key, props).add_edge(EdgeLabel::Son, parent_key, key);
        if let Some(u) = owner {
            let ukey = VertexKey::user(u.uuid);
            batch = batch.add_vertex(ukey, user_props(u)).add_edge(EdgeLabel::Owns, ukey, key);
        }
        self.graph.execute(&batch)
    }

    /// Vertex for a new collection, `son` edge from its parent and `owns` edge from the owner.
    pub fn add_collection(&self, parent: Uuid, coll: &Collection, owner: Option<&User>) -> StoreResult<()> {
        let key = VertexKey::collection(coll.uuid());
        self.attach(parent, key, collection_props(coll), owner)?;
        if !coll.entry.metadata.is_empty() {
            self.update_metadata(&key, &coll.entry.metadata)?;
        }
        debug!(target: "canopy::graph", "collection vertex {} under {}", coll.path, parent);
        Ok(())
    }

    pub fn add_resource(&self, parent: Uuid, res: &Resource, owner: Option<&User>) -> StoreResult<()> {
        let key = VertexKey::resource(res.uuid());
        self.attach(parent, key, resource_props(res), owner)?;
        if !res.entry.metadata.is_empty() {
            self.update_metadata(&key, &res.entry.metadata)?;
        }
        debug!(target: "canopy::graph", "resource vertex {} under {}", res.path, parent);
        Ok(())
    }

    /// Stored metadata of a vertex: its properties minus the denormalized ones.
    pub fn metadata(&self, key: &VertexKey) -> StoreResult<Option<Metadata>> {
        Ok(self
            .graph
            .vertex(key)?
            .map(|props| props.into_iter().filter(|(k, _)| !is_reserved(k)).collect()))
    }

    /// Three-way diff of stored metadata against `new`: keys only in the old
    /// set are dropped, shared keys overwritten, new keys added. Returns the
    /// number of property operations issued.
    pub fn update_metadata(&self, key: &VertexKey, new: &Metadata) -> StoreResult<usize> {
        let old = self.metadata(key)?.unwrap_or_default();
        let mut batch = GraphBatch::new();
        for k in old.keys().filter(|k| !new.contains_key(*k)) {
            batch = batch.drop_property(*key, k);
        }
        for (k, v) in new.iter().filter(|(k, _)| !is_reserved(k)) {
            if old.get(k) != Some(v) {
                batch = batch.set_property(*key, k, v);
            }
        }
        let n = batch.len();
        if !batch.is_empty() {
            self.graph.execute(&batch)?;
        }
        Ok(n)
    }

    /// Refresh the denormalized properties and the metadata of an existing node's vertex.
    pub fn update_node(&self, node: &Node) -> StoreResult<()> {
        let key = vertex_key(node);
        let mut batch = GraphBatch::new();
        for (k, v) in node_props(node) {
            batch = batch.set_property(key, &k, &v);
        }
        self.graph.execute(&batch)?;
        self.update_metadata(&key, node.metadata())?;
        Ok(())
    }

    /// Drop a vertex; the store removes its edges.
    pub fn drop_vertex(&self, key: &VertexKey) -> StoreResult<()> {
        self.graph.execute(&GraphBatch::new().drop_vertex(*key))
    }

    /// Compare vertices against tree rows. Missing vertices and `son` edges
    /// are recreated; collection or resource vertices with no row are dropped.
    pub fn reconcile(&self, tree: &TreeStore) -> StoreResult<RepairReport> {
        let mut report = RepairReport::default();
        let nodes = tree.nodes()?;
        let mut live: HashSet<VertexKey> = HashSet::with_capacity(nodes.len());

        // Parents first so son edges always find both ends.
        let mut ordered: Vec<&Node> = nodes.iter().collect();
        ordered.sort_by_key(|n| (n.parent_path().is_some(), n.path().matches('/').count()));

        for node in ordered {
            let key = vertex_key(node);
            live.insert(key);
            if !self.has_vertex(&key)? {
                self.graph.execute(&GraphBatch::new().add_vertex(key, node_props(node)))?;
                self.update_metadata(&key, node.metadata())?;
                report.vertices_added += 1;
            }
            let Some(parent_path) = node.parent_path() else { continue };
            let Some(parent) = tree.find_collection(parent_path)? else { continue };
            let pkey = VertexKey::collection(parent.uuid());
            if !self.has_vertex(&pkey)? {
                continue;
            }
            if !self.graph.out_edges(&pkey, EdgeLabel::Son)?.contains(&key) {
                self.graph.execute(&GraphBatch::new().add_edge(EdgeLabel::Son, pkey, key))?;
                report.edges_added += 1;
            }
        }

        for label in [VertexLabel::Collection, VertexLabel::Resource] {
            for key in self.graph.vertices(label)? {
                if !live.contains(&key) {
                    self.drop_vertex(&key)?;
                    report.vertices_dropped += 1;
                }
            }
        }
        info!(
            target: "canopy::graph",
            "reconcile: +{} vertices, +{} edges, -{} vertices",
            report.vertices_added, report.edges_added, report.vertices_dropped
        );
        Ok(report)
    }
}

#[cfg(test)]
mod mirror_tests;
