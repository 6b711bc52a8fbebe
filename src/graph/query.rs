//! Typed graph operations.
//! ----------------------
//! Mutations are expressed as `GraphOp` values keyed on (label, uuid) and
//! property maps, buffered in a `GraphBatch` and handed to the graph store
//! in one call. Nothing is assembled by string interpolation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::User;
use crate::tree::{Collection, Resource};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VertexLabel {
    Collection,
    Resource,
    User,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EdgeLabel {
    Son,
    Owns,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexKey {
    pub label: VertexLabel,
    pub uuid: Uuid,
}

impl VertexKey {
    pub fn collection(uuid: Uuid) -> Self { Self { label: VertexLabel::Collection, uuid } }
    pub fn resource(uuid: Uuid) -> Self { Self { label: VertexLabel::Resource, uuid } }
    pub fn user(uuid: Uuid) -> Self { Self { label: VertexLabel::User, uuid } }
}

pub type Properties = BTreeMap<String, String>;

/// Denormalized keys every vertex carries; never treated as user metadata.
pub const RESERVED_PROPS: &[&str] = &["name", "uuid", "size", "mimetype", "create_ts", "modified_ts"];

pub fn is_reserved(prop: &str) -> bool { RESERVED_PROPS.contains(&prop) }

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOp {
    AddVertex { key: VertexKey, props: Properties },
    AddEdge { label: EdgeLabel, from: VertexKey, to: VertexKey },
    SetProperty { key: VertexKey, name: String, value: String },
    DropProperty { key: VertexKey, name: String },
    DropVertex { key: VertexKey },
}

/// Ordered list of operations applied together by the graph store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphBatch {
    ops: Vec<GraphOp>,
}

impl GraphBatch {
    pub fn new() -> Self { Self::default() }

    pub fn add_vertex(mut self, key: VertexKey, props: Properties) -> Self {
        self.ops.push(GraphOp::AddVertex { key, props });
        self
    }

    pub fn add_edge(mut self, label: EdgeLabel, from: VertexKey, to: VertexKey) -> Self {
        self.ops.push(GraphOp::AddEdge { label, from, to });
        self
    }

    pub fn set_property(mut self, key: VertexKey, name: &str, value: &str) -> Self {
        self.ops.push(GraphOp::SetProperty { key, name: name.to_string(), value: value.to_string() });
        self
    }

    pub fn drop_property(mut self, key: VertexKey, name: &str) -> Self {
        self.ops.push(GraphOp::DropProperty { key, name: name.to_string() });
        self
    }

    pub fn drop_vertex(mut self, key: VertexKey) -> Self {
        self.ops.push(GraphOp::DropVertex { key });
        self
    }

    pub fn ops(&self) -> &[GraphOp] { &self.ops }

    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    pub fn len(&self) -> usize { self.ops.len() }
}

fn ts(t: &chrono::DateTime<chrono::Utc>) -> String { t.to_rfc3339() }

pub fn collection_props(c: &Collection) -> Properties {
    let mut p = Properties::new();
    p.insert("name".into(), c.name.clone());
    p.insert("uuid".into(), c.uuid().to_string());
    p.insert("create_ts".into(), ts(&c.entry.create_ts));
    p.insert("modified_ts".into(), ts(&c.entry.modified_ts));
    p
}

pub fn resource_props(r: &Resource) -> Properties {
    let mut p = Properties::new();
    p.insert("name".into(), r.name().to_string());
    p.insert("uuid".into(), r.uuid().to_string());
    p.insert("size".into(), r.size().to_string());
    if let Some(mt) = r.mimetype() {
        p.insert("mimetype".into(), mt.to_string());
    }
    p.insert("create_ts".into(), ts(&r.entry.create_ts));
    p.insert("modified_ts".into(), ts(&r.entry.modified_ts));
    p
}

pub fn user_props(u: &User) -> Properties {
    let mut p = Properties::new();
    p.insert("name".into(), u.name.clone());
    p.insert("uuid".into(), u.uuid.to_string());
    p
}
