use super::*;
use crate::tree::{Acl, Content, EntryUpdate};

fn setup() -> (TreeStore, MemoryGraph, GraphMirror, Collection) {
    let tree = TreeStore::in_memory();
    let graph = MemoryGraph::new();
    let mirror = GraphMirror::new(Arc::new(graph.clone()));
    let (root, _) = tree.create_root(Acl::new()).unwrap();
    mirror.add_root(&root).unwrap();
    (tree, graph, mirror, root)
}

fn meta(pairs: &[(&str, &str)]) -> Metadata {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn add_collection_links_parent_and_owner() {
    let (tree, graph, mirror, root) = setup();
    let owner = User::new("alice");
    let docs = tree.create_collection("docs", "/", Some(meta(&[("project", "x")]))).unwrap();
    mirror.add_collection(root.uuid(), &docs, Some(&owner)).unwrap();

    let key = VertexKey::collection(docs.uuid());
    assert!(graph.has_edge(EdgeLabel::Son, &VertexKey::collection(root.uuid()), &key));
    assert!(graph.has_edge(EdgeLabel::Owns, &VertexKey::user(owner.uuid), &key));
    assert_eq!(mirror.metadata(&key).unwrap().unwrap(), meta(&[("project", "x")]));
}

#[test]
fn add_under_missing_parent_fails_without_effect() {
    let (tree, graph, mirror, _root) = setup();
    let docs = tree.create_collection("docs", "/", None).unwrap();
    let before = graph.vertex_count();
    assert!(mirror.add_collection(Uuid::new_v4(), &docs, None).is_err());
    assert_eq!(graph.vertex_count(), before);
}

#[test]
fn metadata_update_is_a_three_way_diff() {
    let (tree, _graph, mirror, root) = setup();
    let docs = tree.create_collection("docs", "/", Some(meta(&[("a", "1"), ("b", "2")]))).unwrap();
    mirror.add_collection(root.uuid(), &docs, None).unwrap();
    let key = VertexKey::collection(docs.uuid());

    // drop a, keep b unchanged, add c
    let ops = mirror.update_metadata(&key, &meta(&[("b", "2"), ("c", "3")])).unwrap();
    assert_eq!(ops, 2);
    assert_eq!(mirror.metadata(&key).unwrap().unwrap(), meta(&[("b", "2"), ("c", "3")]));

    // overwrite b
    mirror.update_metadata(&key, &meta(&[("b", "9"), ("c", "3")])).unwrap();
    assert_eq!(mirror.metadata(&key).unwrap().unwrap(), meta(&[("b", "9"), ("c", "3")]));
}

#[test]
fn reserved_properties_are_not_metadata() {
    let (tree, graph, mirror, root) = setup();
    let r = tree
        .create_resource("/", "a.txt", Content { url: "file://h/a.txt".into(), size: 5, mimetype: Some("text/plain".into()) }, None, Acl::new())
        .unwrap();
    mirror.add_resource(root.uuid(), &r, None).unwrap();
    let key = VertexKey::resource(r.uuid());
    let props = graph.vertex(&key).unwrap().unwrap();
    assert_eq!(props.get("size").map(String::as_str), Some("5"));
    assert!(mirror.metadata(&key).unwrap().unwrap().is_empty());
    // a metadata key colliding with a reserved name is ignored
    assert_eq!(mirror.update_metadata(&key, &meta(&[("size", "7")])).unwrap(), 0);
}

#[test]
fn update_node_refreshes_denormalized_copy() {
    let (tree, graph, mirror, root) = setup();
    let r = tree
        .create_resource("/", "a.txt", Content { url: "u1".into(), size: 1, mimetype: None }, None, Acl::new())
        .unwrap();
    mirror.add_resource(root.uuid(), &r, None).unwrap();
    let e = tree.update("/", "a.txt", EntryUpdate { size: Some(42), ..Default::default() }).unwrap();
    mirror.update_node(&Node::Resource(Resource::from_entry(e))).unwrap();
    let props = graph.vertex(&VertexKey::resource(r.uuid())).unwrap().unwrap();
    assert_eq!(props.get("size").map(String::as_str), Some("42"));
}

#[test]
fn drop_vertex_cascades_edges() {
    let (tree, graph, mirror, root) = setup();
    let docs = tree.create_collection("docs", "/", None).unwrap();
    mirror.add_collection(root.uuid(), &docs, Some(&User::new("bob"))).unwrap();
    assert_eq!(graph.edge_count(), 2);
    mirror.drop_vertex(&VertexKey::collection(docs.uuid())).unwrap();
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn check_root_detects_missing_vertex() {
    let tree = TreeStore::in_memory();
    let mirror = GraphMirror::in_memory();
    let (root, _) = tree.create_root(Acl::new()).unwrap();
    assert!(!mirror.check_root(&root).unwrap());
    mirror.add_root(&root).unwrap();
    assert!(mirror.check_root(&root).unwrap());
}

#[test]
fn reconcile_repairs_both_directions() {
    let (tree, graph, mirror, root) = setup();
    // tree rows whose graph writes never happened
    let docs = tree.create_collection("docs", "/", None).unwrap();
    let sub = tree.create_collection("sub", "/docs", None).unwrap();
    // a vertex whose tree row is gone
    let ghost = tree.create_collection("ghost", "/", None).unwrap();
    mirror.add_collection(root.uuid(), &ghost, None).unwrap();
    tree.delete("/ghost").unwrap();

    let report = mirror.reconcile(&tree).unwrap();
    assert_eq!(report, RepairReport { vertices_added: 2, edges_added: 2, vertices_dropped: 1 });
    assert!(graph.has_edge(EdgeLabel::Son, &VertexKey::collection(docs.uuid()), &VertexKey::collection(sub.uuid())));

    assert!(mirror.reconcile(&tree).unwrap().is_clean());
}
