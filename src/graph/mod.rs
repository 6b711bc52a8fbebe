//! Graph mirror of the tree: typed operations, the graph store contract and
//! the eventual-consistency protocol layered over it.

pub mod query;
pub mod store;
pub mod mirror;

pub use mirror::{vertex_key, GraphMirror, RepairReport};
pub use query::{EdgeLabel, GraphBatch, GraphOp, Properties, VertexKey, VertexLabel};
pub use store::{GraphStore, MemoryGraph};
