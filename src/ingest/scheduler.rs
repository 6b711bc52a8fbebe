//! The ingester: one walker thread producing jobs, a fixed pool of workers
//! consuming them through a bounded queue.
//!
//! Per visited directory the walker resolves (or creates) the matching
//! collection before it enqueues any job for the files inside it, so a
//! worker always finds its parent collection present. The path → collection
//! cache lives on the walker's stack and never crosses into a job.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info, warn};

use crate::acl::acl_from_lists;
use crate::catalog::Catalog;
use crate::config::EffectiveIngestConfig;
use crate::content::ContentStore;
use crate::error::{EntryKind, StoreError, StoreResult};
use crate::identity::{Group, User};
use crate::tree::{normalize_nfc, split, Collection, ROOT_PATH};
use super::describe::describe;
use super::job::{IngestJob, JobContext, ResourceDescriptor};
use super::names::decode_os;
use super::queue::JobQueue;
use super::retry::run_with_retry;
use super::timer::TimerCounter;
use super::upsert::{ResourceUpserter, UpsertOutcome};
use super::walker::{collection_path, resolve_start, walk};
use super::IngestReport;

#[derive(Default)]
struct WorkerTally {
    created: AtomicUsize,
    adopted: AtomicUsize,
    dropped: AtomicUsize,
}

#[derive(Default)]
struct WalkTally {
    collections_created: usize,
    collections_adopted: usize,
    jobs_enqueued: usize,
    branches_skipped: usize,
}

pub struct Ingester {
    catalog: Catalog,
    content: Arc<dyn ContentStore>,
    cfg: EffectiveIngestConfig,
    user: User,
    /// Group ids granted read and write on everything ingested.
    groups: Vec<String>,
}

impl Ingester {
    pub fn new(catalog: Catalog, content: Arc<dyn ContentStore>, cfg: EffectiveIngestConfig, user: User, group: &Group) -> Self {
        Self { catalog, content, cfg, user, groups: vec![group.id()] }
    }

    pub fn config(&self) -> &EffectiveIngestConfig { &self.cfg }

    /// Ingest the tree under `folder`. Returns once every enqueued job has
    /// been processed, successfully or dropped after its attempts ran out.
    pub fn run(&self, folder: &Path) -> StoreResult<IngestReport> {
        // Resolved before anything is written: a pattern matching nothing aborts cleanly.
        let start = resolve_start(folder, self.cfg.include_pattern.as_deref())?;
        info!(target: "canopy::ingest", "starting at {}", start.display());
        let root = self.catalog.get_root()?;

        let queue: JobQueue<IngestJob> = JobQueue::new(self.cfg.queue_capacity);
        let tally = WorkerTally::default();
        let upserter = ResourceUpserter::new(self.catalog.clone(), self.content.clone(), self.cfg.chunk_size);

        let walked = thread::scope(|s| {
            let mut spawn_failure = None;
            for n in 0..self.cfg.workers {
                let (queue, tally, upserter) = (&queue, &tally, &upserter);
                let max_attempts = self.cfg.max_attempts;
                let spawned = thread::Builder::new()
                    .name(format!("canopy-worker-{n}"))
                    .spawn_scoped(s, move || worker_loop(queue, tally, upserter, max_attempts));
                if let Err(e) = spawned {
                    spawn_failure = Some(StoreError::from(e));
                    break;
                }
            }
            let walked = match spawn_failure {
                Some(e) => Err(e),
                None => self.walk(folder, &start, root, &queue),
            };
            queue.join();
            queue.close();
            walked
        });
        let walked = walked?;

        let report = IngestReport {
            collections_created: walked.collections_created,
            collections_adopted: walked.collections_adopted,
            jobs_enqueued: walked.jobs_enqueued,
            resources_created: tally.created.load(Ordering::SeqCst),
            resources_adopted: tally.adopted.load(Ordering::SeqCst),
            jobs_dropped: tally.dropped.load(Ordering::SeqCst),
            branches_skipped: walked.branches_skipped,
        };
        info!(target: "canopy::ingest", "ingest of {} finished: {:?}", folder.display(), report);
        Ok(report)
    }

    fn walk(&self, folder: &Path, start: &Path, root: Collection, queue: &JobQueue<IngestJob>) -> StoreResult<WalkTally> {
        let mut tally = WalkTally::default();
        let mut timer = TimerCounter::new();
        let mut cache: HashMap<String, Collection> = HashMap::new();
        cache.insert(ROOT_PATH.to_string(), root);

        let mut it = walk(start);
        while let Some(next) = it.next() {
            let entry = match next {
                Ok(e) => e,
                Err(e) => {
                    warn!(target: "canopy::ingest", "walk error: {}", e);
                    continue;
                }
            };
            // On-disk spelling, kept for reference URLs; tree paths are NFC.
            let disk_path = collection_path(folder, entry.path())?;
            let path = normalize_nfc(&disk_path);

            if entry.file_type().is_dir() {
                timer.enter("get-collection");
                let resolved = self.resolve_collection(&path, &mut cache, &mut tally);
                timer.exit("get-collection");
                if let Err(e) = resolved {
                    // Files below a collection that could not be resolved have no parent to land in.
                    error!(target: "canopy::ingest", "skipping branch {} [{}]: {}", path, e.code_str(), e);
                    tally.branches_skipped += 1;
                    it.skip_current_dir();
                }
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            let filename = decode_os(entry.file_name());
            if self.cfg.is_skipped(&filename) {
                debug!(target: "canopy::ingest", "skip suffix {}", path);
                continue;
            }
            let (container, _) = split(&path);
            let Some(coll) = cache.get(&container) else {
                warn!(target: "canopy::ingest", "no collection resolved for {}", container);
                continue;
            };
            let local = match describe(entry.path()) {
                Ok(l) => l,
                Err(e) => {
                    warn!(target: "canopy::ingest", "cannot stat {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            let (disk_dir, _) = split(&disk_path);
            let job = IngestJob {
                resource: ResourceDescriptor {
                    name: normalize_nfc(&filename),
                    container: coll.path.clone(),
                    mimetype: local.mimetype,
                    size: local.size,
                    ext_type: local.ext_type,
                    read_access: self.groups.clone(),
                    write_access: self.groups.clone(),
                    compress: self.cfg.compress,
                },
                context: JobContext {
                    fullpath: entry.path().to_path_buf(),
                    local_ip: self.cfg.local_ip.clone(),
                    rel_dir: disk_dir,
                    filename,
                    user: self.user.name.clone(),
                },
                is_reference: self.cfg.is_reference,
            };

            timer.enter("push");
            let pushed = queue.put(job);
            timer.exit("push");
            if pushed.is_err() {
                return Err(StoreError::transient("job queue closed during walk"));
            }
            tally.jobs_enqueued += 1;
        }
        timer.summary();
        Ok(tally)
    }

    /// Cache, then tree lookup, then create. Only the walker calls this.
    ///
    /// A new collection is written with the ingest groups' ACL in one row,
    /// so a failure after the tree write never leaves it without grants.
    fn resolve_collection(
        &self,
        path: &str,
        cache: &mut HashMap<String, Collection>,
        tally: &mut WalkTally,
    ) -> StoreResult<()> {
        if cache.contains_key(path) {
            return Ok(());
        }
        if let Some(c) = self.catalog.find_collection(path)? {
            tally.collections_adopted += 1;
            cache.insert(path.to_string(), c);
            return Ok(());
        }
        let (parent, name) = split(path);
        let acl = acl_from_lists(&self.groups, &self.groups);
        let coll = match self.catalog.create_collection_with_acl(&name, &parent, None, acl, Some(&self.user.name)) {
            Ok(c) => {
                tally.collections_created += 1;
                c
            }
            Err(e) if matches!(&e, StoreError::NameConflict { kind: EntryKind::Collection, .. }) => {
                // created by a concurrent ingester between lookup and create
                let c = self.catalog.find_collection(path)?.ok_or(e)?;
                tally.collections_adopted += 1;
                c
            }
            Err(e) => return Err(e),
        };
        cache.insert(path.to_string(), coll);
        Ok(())
    }
}

fn worker_loop(queue: &JobQueue<IngestJob>, tally: &WorkerTally, upserter: &ResourceUpserter, max_attempts: usize) {
    while let Some(job) = queue.get() {
        let id = job.id();
        match run_with_retry(max_attempts, &id, |_| upserter.upsert(&job)) {
            Ok((_, UpsertOutcome::Created)) => {
                tally.created.fetch_add(1, Ordering::SeqCst);
            }
            Ok((_, UpsertOutcome::Adopted { .. })) => {
                tally.adopted.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                error!(target: "canopy::worker", "dropping job {} [{}]: {}", id, e.code_str(), e);
                tally.dropped.fetch_add(1, Ordering::SeqCst);
            }
        }
        queue.task_done();
    }
}
