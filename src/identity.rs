//! Users and groups as seen by the store. Account management lives elsewhere;
//! the store only needs to look principals up by name.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub administrator: bool,
}

impl User {
    pub fn new(name: &str) -> Self {
        Self { uuid: Uuid::new_v4(), name: name.to_string(), groups: BTreeSet::new(), administrator: false }
    }

    pub fn with_groups<I: IntoIterator<Item = String>>(mut self, groups: I) -> Self {
        self.groups.extend(groups);
        self
    }

    pub fn admin(mut self) -> Self {
        self.administrator = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub uuid: Uuid,
    pub name: String,
}

impl Group {
    pub fn new(name: &str) -> Self { Self { uuid: Uuid::new_v4(), name: name.to_string() } }

    /// Id used as the ACL key for this group.
    pub fn id(&self) -> String { self.uuid.to_string() }
}

/// Lookup contract for the external identity service.
pub trait Directory: Send + Sync {
    fn find_user(&self, name: &str) -> Option<User>;
    fn find_group(&self, name: &str) -> Option<Group>;
}

#[derive(Clone, Default)]
pub struct MemoryDirectory {
    users: Arc<RwLock<HashMap<String, User>>>,
    groups: Arc<RwLock<HashMap<String, Group>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self { Self::default() }

    pub fn add_user(&self, user: User) -> User {
        self.users.write().insert(user.name.clone(), user.clone());
        user
    }

    pub fn add_group(&self, group: Group) -> Group {
        self.groups.write().insert(group.name.clone(), group.clone());
        group
    }
}

impl Directory for MemoryDirectory {
    fn find_user(&self, name: &str) -> Option<User> { self.users.read().get(name).cloned() }

    fn find_group(&self, name: &str) -> Option<Group> { self.groups.read().get(name).cloned() }
}
