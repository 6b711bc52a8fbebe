//! Change notifications for collections and resources.
//!
//! Each create/update/delete publishes a `Notification` whose payload is the
//! JSON string `{"pre": <state>, "post": <state>}`; an absent side is `{}`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::EntryKind;
use crate::tree::{Metadata, Node};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifyOp {
    Create,
    Update,
    Delete,
}

/// Serializable snapshot of a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeState {
    pub uuid: Uuid,
    pub container: String,
    pub name: String,
    pub create_ts: DateTime<Utc>,
    pub modified_ts: DateTime<Utc>,
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

impl NodeState {
    pub fn of(node: &Node) -> Self {
        let e = node.entry();
        let (container, name) = match node {
            Node::Collection(c) => (c.container.clone(), c.name.clone()),
            Node::Resource(r) => (r.container().to_string(), r.name().to_string()),
        };
        let content = e.content.as_ref();
        Self {
            uuid: e.uuid,
            container,
            name,
            create_ts: e.create_ts,
            modified_ts: e.modified_ts,
            metadata: e.metadata.clone(),
            url: content.map(|c| c.url.clone()),
            size: content.map(|c| c.size),
            mimetype: content.and_then(|c| c.mimetype.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub op: NotifyOp,
    pub kind: EntryKind,
    pub path: String,
    pub username: Option<String>,
    pub payload: String,
}

impl Notification {
    pub fn new(op: NotifyOp, pre: Option<&Node>, post: Option<&Node>, username: Option<&str>) -> Option<Self> {
        let subject = post.or(pre)?;
        Some(Self {
            op,
            kind: subject.kind(),
            path: subject.path().to_string(),
            username: username.map(str::to_string),
            payload: payload(pre, post),
        })
    }
}

pub fn payload(pre: Option<&Node>, post: Option<&Node>) -> String {
    let side = |n: Option<&Node>| match n {
        Some(n) => serde_json::to_value(NodeState::of(n)).unwrap_or_else(|_| json!({})),
        None => json!({}),
    };
    json!({ "pre": side(pre), "post": side(post) }).to_string()
}

pub trait NotificationSink: Send + Sync {
    fn publish(&self, note: Notification);
}

/// Logs every notification at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&self, note: Notification) {
        tracing::debug!(
            target: "canopy::notify",
            "{:?} {} {} by {}: {}",
            note.op, note.kind, note.path, note.username.as_deref().unwrap_or("-"), note.payload
        );
    }
}

/// Keeps notifications in memory for inspection.
#[derive(Clone, Default)]
pub struct MemorySink {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl MemorySink {
    pub fn new() -> Self { Self::default() }

    pub fn drain(&self) -> Vec<Notification> { std::mem::take(&mut *self.seen.lock()) }

    pub fn len(&self) -> usize { self.seen.lock().len() }

    pub fn is_empty(&self) -> bool { self.seen.lock().is_empty() }
}

impl NotificationSink for MemorySink {
    fn publish(&self, note: Notification) { self.seen.lock().push(note); }
}
