use tracing::info;

use crate::acl::acl_from_lists;
use crate::error::{StoreError, StoreResult};
use crate::graph::vertex_key;
use crate::notify::NotifyOp;
use crate::tree::{merge, Acl, Collection, EntryUpdate, Metadata, Node, ROOT_PATH, SELF_NAME};
use crate::tprintln;
use super::Catalog;

impl Catalog {
    /// The root collection, created with the configured ACL on first use.
    /// A root whose vertex is missing from the graph gets it back.
    pub fn get_root(&self) -> StoreResult<Collection> {
        if let Some(root) = self.tree.find_collection(ROOT_PATH)? {
            match self.graph.check_root(&root) {
                Ok(true) => {}
                Ok(false) => {
                    info!(target: "canopy::graph", "root vertex missing, recreating");
                    self.graph_best_effort("add root", ROOT_PATH, self.graph.add_root(&root));
                }
                Err(e) => self.graph_best_effort("check root", ROOT_PATH, Err(e)),
            }
            return Ok(root);
        }
        let (root, created) = self.tree.create_root(self.config.root_acl.clone())?;
        if created {
            info!(target: "canopy::tree", "root collection created uuid={}", root.uuid());
        }
        if !self.graph.check_root(&root).unwrap_or(false) {
            self.graph_best_effort("add root", ROOT_PATH, self.graph.add_root(&root));
        }
        Ok(root)
    }

    /// Create collection `name` under `container`, owned by `username` when given.
    pub fn create_collection(
        &self,
        name: &str,
        container: &str,
        metadata: Option<Metadata>,
        username: Option<&str>,
    ) -> StoreResult<Collection> {
        self.create_collection_with_acl(name, container, metadata, Acl::new(), username)
    }

    /// As [`Catalog::create_collection`], with `acl` set on the initial tree write.
    pub fn create_collection_with_acl(
        &self,
        name: &str,
        container: &str,
        metadata: Option<Metadata>,
        acl: Acl,
        username: Option<&str>,
    ) -> StoreResult<Collection> {
        let coll = self.tree.create_collection_with_acl(name, container, metadata, acl)?;
        tprintln!("create_collection {} uuid={}", coll.path, coll.uuid());

        match self.tree.find_collection(container)? {
            Some(parent) => {
                let owner = self.owner(username);
                let res = self.graph.add_collection(parent.uuid(), &coll, owner.as_ref());
                self.graph_best_effort("add collection", &coll.path, res);
            }
            None => self.graph_best_effort(
                "add collection",
                &coll.path,
                Err(StoreError::NoSuchParent(container.to_string())),
            ),
        }

        let node = Node::Collection(coll.clone());
        self.emit(NotifyOp::Create, None, Some(&node), username);
        self.reindex(&node)?;
        Ok(coll)
    }

    pub fn find_collection(&self, path: &str) -> StoreResult<Option<Collection>> { self.tree.find_collection(path) }

    /// Partial update of a collection's metadata and/or ACL.
    pub fn update_collection(
        &self,
        path: &str,
        metadata: Option<Metadata>,
        acl: Option<Acl>,
        username: Option<&str>,
    ) -> StoreResult<Collection> {
        let pre = self.tree.find_collection(path)?.ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let entry = self.tree.update(path, SELF_NAME, EntryUpdate { metadata, acl, ..Default::default() })?;
        let post = Collection::from_entry(entry);
        let node = Node::Collection(post.clone());
        self.graph_best_effort("update", path, self.graph.update_node(&node));
        self.emit(NotifyOp::Update, Some(&Node::Collection(pre)), Some(&node), username);
        self.reindex(&node)?;
        Ok(post)
    }

    /// Replace the ACL of the collection or resource at `path` from read/write group lists.
    pub fn set_acl_lists(&self, path: &str, read_access: &[String], write_access: &[String]) -> StoreResult<Node> {
        let acl = acl_from_lists(read_access, write_access);
        match self.tree.find(path)? {
            Some(Node::Collection(_)) => Ok(Node::Collection(self.update_collection(path, None, Some(acl), None)?)),
            Some(Node::Resource(_)) => {
                let update = EntryUpdate { acl: Some(acl), ..Default::default() };
                Ok(Node::Resource(self.update_resource(path, update, None)?))
            }
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    /// Child names of the collection at `path`: (collections, resources).
    pub fn get_children(&self, path: &str) -> StoreResult<(Vec<String>, Vec<String>)> {
        if self.tree.find_collection(path)?.is_none() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        self.tree.get_children(path)
    }

    /// Delete whatever lives at `path`. Collections are removed recursively.
    pub fn delete(&self, path: &str, username: Option<&str>) -> StoreResult<bool> {
        match self.tree.find(path)? {
            Some(Node::Collection(_)) => self.delete_all(path, username),
            Some(Node::Resource(_)) => self.delete_resource(path, username),
            None => Ok(false),
        }
    }

    /// Delete the collection at `path` with everything beneath it: resources
    /// first, then sub-collections depth first, then the collection itself.
    /// The root is never removed, though its children are.
    pub fn delete_all(&self, path: &str, username: Option<&str>) -> StoreResult<bool> {
        let Some(coll) = self.tree.find_collection(path)? else { return Ok(false) };
        let (collections, resources) = self.tree.get_children(path)?;
        for name in resources {
            self.delete_resource(&merge(path, &name), username)?;
        }
        for name in collections {
            self.delete_all(&merge(path, &name), username)?;
        }
        if coll.is_root {
            return Ok(false);
        }
        let Some(node) = self.tree.delete(path)? else { return Ok(false) };
        tprintln!("delete_collection {}", path);
        self.graph_best_effort("drop", path, self.graph.drop_vertex(&vertex_key(&node)));
        self.emit(NotifyOp::Delete, Some(&node), None, username);
        self.search.reset(node.uuid())?;
        Ok(true)
    }
}
