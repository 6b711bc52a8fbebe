//! Effective-permission resolution over the tree.
//!
//! A node with a non-empty ACL answers for itself. A node with an empty ACL
//! has no local rule and inherits from its parent collection, walking up
//! until a rule is found or the root is reached. An empty root yields no
//! actions at all.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::identity::User;
use crate::tree::{AccessMask, Acl, Node, TreeStore};

/// Pseudo-group matching any authenticated user.
pub const AUTHENTICATED: &str = "AUTHENTICATED@";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Delete,
    Edit,
}

impl Action {
    pub fn all() -> BTreeSet<Action> {
        [Action::Read, Action::Write, Action::Delete, Action::Edit].into_iter().collect()
    }
}

/// Actions implied by a single group mask.
pub fn actions_for_mask(mask: AccessMask) -> BTreeSet<Action> {
    match mask {
        AccessMask::Read => [Action::Read].into_iter().collect(),
        AccessMask::Write => [Action::Write, Action::Delete, Action::Edit].into_iter().collect(),
        AccessMask::ReadWrite => Action::all(),
    }
}

/// Actions granted by one non-empty ACL to `user`.
fn evaluate(acl: &Acl, user: &User) -> BTreeSet<Action> {
    if user.administrator {
        return Action::all();
    }
    let mut actions = BTreeSet::new();
    for gid in user.groups.iter().map(String::as_str).chain(std::iter::once(AUTHENTICATED)) {
        if let Some(mask) = acl.get(gid) {
            actions.extend(actions_for_mask(*mask));
        }
    }
    actions
}

/// Build an ACL from read and write group lists. A group in both gets read/write.
pub fn acl_from_lists(read_access: &[String], write_access: &[String]) -> Acl {
    let mut acl = Acl::new();
    for gid in read_access {
        acl.insert(gid.clone(), AccessMask::Read);
    }
    for gid in write_access {
        let mask = match acl.get(gid) {
            Some(AccessMask::Read) | Some(AccessMask::ReadWrite) => AccessMask::ReadWrite,
            _ => AccessMask::Write,
        };
        acl.insert(gid.clone(), mask);
    }
    acl
}

/// Inverse of [`acl_from_lists`].
pub fn acl_to_lists(acl: &Acl) -> (Vec<String>, Vec<String>) {
    let mut read = Vec::new();
    let mut write = Vec::new();
    for (gid, mask) in acl {
        if mask.can_read() { read.push(gid.clone()); }
        if mask.can_write() { write.push(gid.clone()); }
    }
    (read, write)
}

#[derive(Clone)]
pub struct AclResolver {
    tree: TreeStore,
}

impl AclResolver {
    pub fn new(tree: TreeStore) -> Self { Self { tree } }

    /// Effective actions for `user` on `node`, inheriting through empty ACLs.
    pub fn effective_actions(&self, user: &User, node: &Node) -> StoreResult<BTreeSet<Action>> {
        if !node.acl().is_empty() {
            return Ok(evaluate(node.acl(), user));
        }
        let mut parent = node.parent_path().map(str::to_string);
        while let Some(path) = parent {
            let Some(coll) = self.tree.find_collection(&path)? else {
                tracing::warn!(target: "canopy::acl", "dangling parent {} while resolving {}", path, node.path());
                return Ok(BTreeSet::new());
            };
            if !coll.entry.acl.is_empty() {
                return Ok(evaluate(&coll.entry.acl, user));
            }
            parent = if coll.is_root { None } else { Some(coll.container.clone()) };
        }
        Ok(BTreeSet::new())
    }

    /// Administrators may do anything; everyone else needs the action in their effective set.
    pub fn user_can(&self, user: &User, node: &Node, action: Action) -> StoreResult<bool> {
        if user.administrator {
            return Ok(true);
        }
        Ok(self.effective_actions(user, node)?.contains(&action))
    }
}
