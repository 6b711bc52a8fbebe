use crate::error::{StoreError, StoreResult};
use crate::graph::vertex_key;
use crate::notify::NotifyOp;
use crate::tree::{split, Acl, Content, EntryUpdate, Metadata, Node, Resource};
use crate::tprintln;
use super::Catalog;

impl Catalog {
    /// Create resource `name` in `container`. A path already taken by a
    /// resource or collection fails with `NameConflict` before anything else
    /// is touched.
    pub fn create_resource(
        &self,
        container: &str,
        name: &str,
        content: Content,
        metadata: Option<Metadata>,
        acl: Acl,
        username: Option<&str>,
    ) -> StoreResult<Resource> {
        let res = self.tree.create_resource(container, name, content, metadata, acl)?;
        tprintln!("create_resource {} uuid={}", res.path, res.uuid());

        match self.tree.find_collection(container)? {
            Some(parent) => {
                let owner = self.owner(username);
                let r = self.graph.add_resource(parent.uuid(), &res, owner.as_ref());
                self.graph_best_effort("add resource", &res.path, r);
            }
            None => self.graph_best_effort(
                "add resource",
                &res.path,
                Err(StoreError::NoSuchParent(container.to_string())),
            ),
        }

        let node = Node::Resource(res.clone());
        self.emit(NotifyOp::Create, None, Some(&node), username);
        self.reindex(&node)?;
        Ok(res)
    }

    pub fn find_resource(&self, path: &str) -> StoreResult<Option<Resource>> { self.tree.find_resource(path) }

    pub fn update_resource(&self, path: &str, update: EntryUpdate, username: Option<&str>) -> StoreResult<Resource> {
        let pre = self.tree.find_resource(path)?.ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let (container, name) = split(path);
        let entry = self.tree.update(&container, &name, update)?;
        let post = Resource::from_entry(entry);
        let node = Node::Resource(post.clone());
        self.graph_best_effort("update", path, self.graph.update_node(&node));
        self.emit(NotifyOp::Update, Some(&Node::Resource(pre)), Some(&node), username);
        self.reindex(&node)?;
        Ok(post)
    }

    pub fn delete_resource(&self, path: &str, username: Option<&str>) -> StoreResult<bool> {
        let node = match self.tree.find_resource(path)? {
            Some(_) => self.tree.delete(path)?,
            None => None,
        };
        let Some(node) = node else { return Ok(false) };
        self.graph_best_effort("drop", path, self.graph.drop_vertex(&vertex_key(&node)));
        self.emit(NotifyOp::Delete, Some(&node), None, username);
        self.search.reset(node.uuid())?;
        Ok(true)
    }
}
