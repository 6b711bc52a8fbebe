use super::*;
use crate::tree::types::AccessMask;

fn content(url: &str) -> Content {
    Content { url: url.to_string(), size: 3, mimetype: Some("text/plain".into()) }
}

fn store_with_root() -> TreeStore {
    let t = TreeStore::in_memory();
    t.create_root(Acl::new()).unwrap();
    t
}

#[test]
fn collection_has_self_row_and_child_reference() {
    let t = store_with_root();
    let c = t.create_collection("docs", "/", None).unwrap();
    assert_eq!(c.path, "/docs");
    assert_eq!(c.container, "/");
    assert_eq!(c.name, "docs");
    assert!(!c.is_root);

    let self_row = t.get("/docs", ".").unwrap().unwrap();
    let child = t.get("/", "docs/").unwrap().unwrap();
    assert_eq!(self_row.uuid, child.uuid);
    assert!(child.is_child_ref());
}

#[test]
fn root_is_created_once() {
    let t = TreeStore::in_memory();
    let mut acl = Acl::new();
    acl.insert("AUTHENTICATED@".into(), AccessMask::Read);
    let (r1, created1) = t.create_root(acl).unwrap();
    let (r2, created2) = t.create_root(Acl::new()).unwrap();
    assert!(created1);
    assert!(!created2);
    assert_eq!(r1.uuid(), r2.uuid());
    assert!(r2.is_root);
    assert_eq!(r2.entry.acl.get("AUTHENTICATED@"), Some(&AccessMask::Read));
}

#[test]
fn create_under_missing_parent_fails() {
    let t = store_with_root();
    let err = t.create_collection("x", "/nope", None).unwrap_err();
    assert!(matches!(err, StoreError::NoSuchParent(ref p) if p == "/nope"));
    let err = t.create_resource("/nope", "a.txt", content("file://h/a"), None, Acl::new()).unwrap_err();
    assert!(matches!(err, StoreError::NoSuchParent(_)));
}

#[test]
fn conflicts_between_collections_and_resources() {
    let t = store_with_root();
    t.create_collection("docs", "/", None).unwrap();
    t.create_resource("/", "a.txt", content("file://h/a.txt"), None, Acl::new()).unwrap();

    let e = t.create_collection("docs", "/", None).unwrap_err();
    assert!(matches!(e, StoreError::NameConflict { kind: EntryKind::Collection, .. }));
    let e = t.create_collection("a.txt", "/", None).unwrap_err();
    assert!(matches!(e, StoreError::NameConflict { kind: EntryKind::Resource, .. }));
    let e = t.create_resource("/", "docs", content("file://h/docs"), None, Acl::new()).unwrap_err();
    assert!(matches!(e, StoreError::NameConflict { kind: EntryKind::Collection, .. }));
    let e = t.create_resource("/", "a.txt", content("file://h/other"), None, Acl::new()).unwrap_err();
    assert!(matches!(e, StoreError::NameConflict { kind: EntryKind::Resource, .. }));
    // loser did not overwrite the winner
    assert_eq!(t.find_resource("/a.txt").unwrap().unwrap().url(), "file://h/a.txt");
}

#[test]
fn children_are_partitioned() {
    let t = store_with_root();
    t.create_collection("b", "/", None).unwrap();
    t.create_collection("a", "/", None).unwrap();
    t.create_resource("/", "z.txt", content("u"), None, Acl::new()).unwrap();
    t.create_resource("/a", "inner.txt", content("u"), None, Acl::new()).unwrap();
    let (colls, rescs) = t.get_children("/").unwrap();
    assert_eq!(colls, vec!["a", "b"]);
    assert_eq!(rescs, vec!["z.txt"]);
    let (colls, rescs) = t.get_children("/a").unwrap();
    assert!(colls.is_empty());
    assert_eq!(rescs, vec!["inner.txt"]);
}

#[test]
fn update_is_partial_and_restamps() {
    let t = store_with_root();
    let r = t.create_resource("/", "a.txt", content("old"), None, Acl::new()).unwrap();
    let before = r.entry.modified_ts;
    std::thread::sleep(std::time::Duration::from_millis(5));
    let e = t.update("/", "a.txt", EntryUpdate { url: Some("new".into()), ..Default::default() }).unwrap();
    assert_eq!(e.content.as_ref().unwrap().url, "new");
    assert_eq!(e.content.as_ref().unwrap().size, 3);
    assert_eq!(e.create_ts, r.entry.create_ts);
    assert!(e.modified_ts > before);

    let missing = t.update("/", "nope", EntryUpdate::default()).unwrap_err();
    assert!(matches!(missing, StoreError::NotFound(_)));
}

#[test]
fn delete_removes_both_rows_and_skips_root() {
    let t = store_with_root();
    t.create_collection("docs", "/", None).unwrap();
    assert!(t.delete("/docs").unwrap().is_some());
    assert!(t.get("/docs", ".").unwrap().is_none());
    assert!(t.get("/", "docs/").unwrap().is_none());
    assert!(t.delete("/").unwrap().is_none());
    assert!(t.find_collection("/").unwrap().is_some());
}

#[test]
fn names_are_nfc_normalized() {
    let t = store_with_root();
    t.create_collection("Cafe\u{0301}", "/", None).unwrap();
    assert!(t.find_collection("/Caf\u{e9}").unwrap().is_some());
}

#[test]
fn lookups_and_updates_accept_either_normal_form() {
    let t = store_with_root();
    let nfd = "Cafe\u{0301}";
    t.create_collection(nfd, "/", None).unwrap();
    t.create_resource(&format!("/{nfd}"), nfd, content("u"), None, Acl::new()).unwrap();

    assert!(t.find_collection(&format!("/{nfd}")).unwrap().is_some());
    let r = t.find_resource(&format!("/{nfd}/{nfd}")).unwrap().unwrap();
    assert_eq!(r.path, "/Caf\u{e9}/Caf\u{e9}");
    assert_eq!(t.get_children(&format!("/{nfd}")).unwrap().1, vec!["Caf\u{e9}"]);
    t.update(&format!("/{nfd}"), nfd, EntryUpdate { url: Some("v".into()), ..Default::default() }).unwrap();
    assert_eq!(t.find_resource("/Caf\u{e9}/Caf\u{e9}").unwrap().unwrap().url(), "v");

    let e = t.create_resource("/", nfd, content("x"), None, Acl::new()).unwrap_err();
    assert!(matches!(e, StoreError::NameConflict { kind: EntryKind::Collection, .. }));
}

#[test]
fn collection_acl_is_written_with_the_self_row() {
    let t = store_with_root();
    let mut acl = Acl::new();
    acl.insert("g1".into(), AccessMask::ReadWrite);
    let c = t.create_collection_with_acl("shared", "/", None, acl).unwrap();
    assert_eq!(c.entry.acl.get("g1"), Some(&AccessMask::ReadWrite));
    let stored = t.get("/shared", ".").unwrap().unwrap();
    assert_eq!(stored.acl.get("g1"), Some(&AccessMask::ReadWrite));
}

#[test]
fn delete_leaves_descendant_collections_in_place() {
    let t = store_with_root();
    t.create_collection("a", "/", None).unwrap();
    t.create_collection("b", "/a", None).unwrap();
    t.create_resource("/a/b", "deep.txt", content("u"), None, Acl::new()).unwrap();

    t.delete("/a").unwrap();
    assert!(t.find_collection("/a").unwrap().is_none());
    // only the direct rows go; emptying the subtree is the catalog's job
    assert!(t.find_collection("/a/b").unwrap().is_some());
    assert!(t.find_resource("/a/b/deep.txt").unwrap().is_some());
    assert_eq!(t.counts().unwrap(), TreeCounts { collections: 2, resources: 1 });
}

#[test]
fn counts_skip_child_references() {
    let t = store_with_root();
    t.create_collection("sub", "/", None).unwrap();
    t.create_resource("/", "a.txt", content("u"), None, Acl::new()).unwrap();
    t.create_resource("/sub", "b.txt", content("u"), None, Acl::new()).unwrap();
    assert_eq!(t.counts().unwrap(), TreeCounts { collections: 2, resources: 2 });
}
