//! Catalog: collection and resource lifecycle over the tree store.
//!
//! Every mutation writes the tree first. Only after the tree write commits
//! is the graph mirror updated (best effort, failures logged), then a
//! notification published and the search entry refreshed.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::acl::{Action, AclResolver};
use crate::config::CatalogConfig;
use crate::error::StoreResult;
use crate::graph::{GraphMirror, GraphStore, MemoryGraph, RepairReport};
use crate::identity::{Directory, MemoryDirectory, User};
use crate::notify::{Notification, NotificationSink, NotifyOp, TracingSink};
use crate::search::{MemorySearchIndex, SearchIndex};
use crate::tree::{KvBackend, MemoryKv, Node, TreeStore};

pub mod collection;
pub mod resource;

#[derive(Clone)]
pub struct Catalog {
    tree: TreeStore,
    graph: GraphMirror,
    acl: AclResolver,
    search: Arc<dyn SearchIndex>,
    notify: Arc<dyn NotificationSink>,
    directory: Arc<dyn Directory>,
    config: CatalogConfig,
}

/// Assembles a catalog; any backend left unset is the in-memory one.
#[derive(Default)]
pub struct CatalogBuilder {
    kv: Option<Arc<dyn KvBackend>>,
    graph: Option<Arc<dyn GraphStore>>,
    search: Option<Arc<dyn SearchIndex>>,
    notify: Option<Arc<dyn NotificationSink>>,
    directory: Option<Arc<dyn Directory>>,
    config: Option<CatalogConfig>,
}

impl CatalogBuilder {
    pub fn kv(mut self, kv: Arc<dyn KvBackend>) -> Self { self.kv = Some(kv); self }
    pub fn graph(mut self, graph: Arc<dyn GraphStore>) -> Self { self.graph = Some(graph); self }
    pub fn search(mut self, search: Arc<dyn SearchIndex>) -> Self { self.search = Some(search); self }
    pub fn notify(mut self, notify: Arc<dyn NotificationSink>) -> Self { self.notify = Some(notify); self }
    pub fn directory(mut self, directory: Arc<dyn Directory>) -> Self { self.directory = Some(directory); self }
    pub fn config(mut self, config: CatalogConfig) -> Self { self.config = Some(config); self }

    pub fn build(self) -> Catalog {
        let tree = TreeStore::new(self.kv.unwrap_or_else(|| Arc::new(MemoryKv::new())));
        Catalog {
            acl: AclResolver::new(tree.clone()),
            tree,
            graph: GraphMirror::new(self.graph.unwrap_or_else(|| Arc::new(MemoryGraph::new()))),
            search: self.search.unwrap_or_else(|| Arc::new(MemorySearchIndex::new())),
            notify: self.notify.unwrap_or_else(|| Arc::new(TracingSink)),
            directory: self.directory.unwrap_or_else(|| Arc::new(MemoryDirectory::new())),
            config: self.config.unwrap_or_default(),
        }
    }
}

impl Catalog {
    pub fn builder() -> CatalogBuilder { CatalogBuilder::default() }

    pub fn in_memory() -> Self { Self::builder().build() }

    pub fn tree(&self) -> &TreeStore { &self.tree }

    pub fn graph(&self) -> &GraphMirror { &self.graph }

    pub fn directory(&self) -> &Arc<dyn Directory> { &self.directory }

    pub fn config(&self) -> &CatalogConfig { &self.config }

    pub fn find(&self, path: &str) -> StoreResult<Option<Node>> { self.tree.find(path) }

    pub fn effective_actions(&self, user: &User, node: &Node) -> StoreResult<BTreeSet<Action>> {
        self.acl.effective_actions(user, node)
    }

    pub fn user_can(&self, user: &User, node: &Node, action: Action) -> StoreResult<bool> {
        self.acl.user_can(user, node, action)
    }

    /// Bring the graph mirror back in line with the tree.
    pub fn reconcile_graph(&self) -> StoreResult<RepairReport> { self.graph.reconcile(&self.tree) }

    fn owner(&self, username: Option<&str>) -> Option<User> {
        let name = username?;
        let user = self.directory.find_user(name);
        if user.is_none() {
            tracing::debug!(target: "canopy::graph", "owner {} unknown, no owns edge", name);
        }
        user
    }

    /// Log a failed mirror write; the tree write it follows stands.
    fn graph_best_effort(&self, what: &str, path: &str, res: StoreResult<()>) {
        if let Err(e) = res {
            warn!(target: "canopy::graph", "graph {} for {} failed, mirror stale until repair: {}", what, path, e);
        }
    }

    /// Reset and rebuild the search entry of `node`.
    pub fn reindex(&self, node: &Node) -> StoreResult<usize> {
        self.search.reset(node.uuid())?;
        self.search.index(node, &self.config.index_fields)
    }

    fn emit(&self, op: NotifyOp, pre: Option<&Node>, post: Option<&Node>, username: Option<&str>) {
        if let Some(note) = Notification::new(op, pre, post, username) {
            self.notify.publish(note);
        }
    }
}
