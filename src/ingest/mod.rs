//! Bulk ingestion of a local directory tree.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::{EffectiveIngestConfig, GlobalIngestConfig, IngestOptions};
use crate::content::ContentStore;
use crate::error::StoreResult;
use crate::identity::{Group, User};

pub mod names;
pub mod describe;
pub mod job;
pub mod queue;
pub mod retry;
pub mod upsert;
pub mod walker;
pub mod timer;
pub mod scheduler;

pub use job::{IngestJob, JobContext, ResourceDescriptor};
pub use queue::JobQueue;
pub use scheduler::Ingester;
pub use upsert::{ResourceUpserter, UpsertOutcome};

/// Summary of one run. Dropped jobs are those whose attempts ran out.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    pub collections_created: usize,
    pub collections_adopted: usize,
    pub jobs_enqueued: usize,
    pub resources_created: usize,
    pub resources_adopted: usize,
    pub jobs_dropped: usize,
    pub branches_skipped: usize,
}

impl IngestReport {
    pub fn resources_succeeded(&self) -> usize { self.resources_created + self.resources_adopted }
}

/// Ingest `path` as `user`, granting `group` read/write on everything created.
/// Settings come from the environment overlaid with `opts`.
pub fn do_ingest(
    catalog: &Catalog,
    content: Arc<dyn ContentStore>,
    user: &User,
    group: &Group,
    path: &Path,
    opts: &IngestOptions,
) -> StoreResult<IngestReport> {
    let cfg = EffectiveIngestConfig::from_layers(&GlobalIngestConfig::from_env(), opts);
    Ingester::new(catalog.clone(), content, cfg, user.clone(), group).run(path)
}
