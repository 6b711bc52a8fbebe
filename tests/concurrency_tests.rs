use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use canopy::content::MemoryContentStore;
use canopy::ingest::{IngestJob, JobContext, ResourceDescriptor, ResourceUpserter, UpsertOutcome};
use canopy::tree::{Acl, Content};
use canopy::Catalog;

const RACERS: usize = 16;

fn job(fullpath: PathBuf, is_reference: bool, host: &str) -> IngestJob {
    IngestJob {
        resource: ResourceDescriptor {
            name: "shared.bin".into(),
            container: "/".into(),
            mimetype: None,
            size: 4,
            ext_type: "BIN".into(),
            read_access: vec!["g".into()],
            write_access: vec!["g".into()],
            compress: false,
        },
        context: JobContext {
            fullpath,
            local_ip: host.into(),
            rel_dir: "/".into(),
            filename: "shared.bin".into(),
            user: "racer".into(),
        },
        is_reference,
    }
}

#[test]
fn concurrent_creates_leave_one_row() {
    let catalog = Catalog::in_memory();
    catalog.get_root().unwrap();
    let wins: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..RACERS)
            .map(|i| {
                let catalog = &catalog;
                s.spawn(move || {
                    let c = Content { url: format!("file://h{i}/x"), size: 1, mimetype: None };
                    match catalog.create_resource("/", "x", c, None, Acl::new(), None) {
                        Ok(_) => 1,
                        Err(e) => {
                            assert!(e.is_conflict(), "unexpected {e}");
                            0
                        }
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });
    assert_eq!(wins, 1);
    assert_eq!(catalog.tree().counts().unwrap().resources, 1);
}

#[test]
fn racing_upserts_converge_on_one_url() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("shared.bin");
    fs::write(&src, b"data").unwrap();

    let catalog = Catalog::in_memory();
    catalog.get_root().unwrap();
    let upserter = ResourceUpserter::new(catalog.clone(), Arc::new(MemoryContentStore::new()), 1024);

    // copy mode: every racer uploads its own object, so every URL differs
    let outcomes: Vec<UpsertOutcome> = thread::scope(|s| {
        let handles: Vec<_> = (0..RACERS)
            .map(|_| {
                let (upserter, j) = (&upserter, job(src.clone(), false, "h"));
                s.spawn(move || upserter.upsert(&j).unwrap().1)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|o| **o == UpsertOutcome::Created).count(), 1);
    assert_eq!(catalog.tree().counts().unwrap().resources, 1);

    let reads: HashSet<String> = (0..RACERS)
        .map(|_| catalog.find_resource("/shared.bin").unwrap().unwrap().url().to_string())
        .collect();
    assert_eq!(reads.len(), 1);
}

#[test]
fn racing_reference_upserts_adopt_without_rewrites() {
    let catalog = Catalog::in_memory();
    catalog.get_root().unwrap();
    let upserter = ResourceUpserter::new(catalog.clone(), Arc::new(MemoryContentStore::new()), 1024);

    let outcomes: Vec<UpsertOutcome> = thread::scope(|s| {
        let handles: Vec<_> = (0..RACERS)
            .map(|_| {
                let (upserter, j) = (&upserter, job(PathBuf::from("/src/shared.bin"), true, "10.0.0.1"));
                s.spawn(move || upserter.upsert(&j).unwrap().1)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let adopted_clean = outcomes.iter().filter(|o| **o == UpsertOutcome::Adopted { url_updated: false }).count();
    assert_eq!(adopted_clean, RACERS - 1);
    let r = catalog.find_resource("/shared.bin").unwrap().unwrap();
    assert_eq!(r.url(), "file://10.0.0.1/shared.bin");
}
