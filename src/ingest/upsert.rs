//! Create-or-adopt of one resource.
//!
//! The resource is created optimistically. A naming conflict means another
//! worker or an earlier run got there first: the existing row is adopted and
//! its URL brought up to date. Concurrent or repeated ingestion of a path
//! therefore converges on a single row.

use std::sync::Arc;

use tracing::info;

use crate::acl::acl_from_lists;
use crate::catalog::Catalog;
use crate::content::{content_url, upload_file, ContentStore};
use crate::error::StoreResult;
use crate::tree::{Content, EntryUpdate, Node, Resource};
use super::job::IngestJob;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Adopted { url_updated: bool },
}

#[derive(Clone)]
pub struct ResourceUpserter {
    catalog: Catalog,
    content: Arc<dyn ContentStore>,
    chunk_size: usize,
}

impl ResourceUpserter {
    pub fn new(catalog: Catalog, content: Arc<dyn ContentStore>, chunk_size: usize) -> Self {
        Self { catalog, content, chunk_size: chunk_size.max(1) }
    }

    /// Where the job's bytes live: a `file://` pointer or a freshly uploaded object.
    fn resolve_url(&self, job: &IngestJob) -> StoreResult<(String, u64)> {
        if job.is_reference {
            return Ok((job.reference_url(), job.resource.size));
        }
        let (id, size) = upload_file(self.content.as_ref(), &job.context.fullpath, self.chunk_size, job.resource.compress)?;
        Ok((content_url(id), size))
    }

    pub fn upsert(&self, job: &IngestJob) -> StoreResult<(Resource, UpsertOutcome)> {
        job.validate()?;
        let (url, size) = self.resolve_url(job)?;
        let desc = &job.resource;
        let content = Content { url: url.clone(), size, mimetype: desc.mimetype.clone() };
        let acl = acl_from_lists(&desc.read_access, &desc.write_access);

        let (resource, created) =
            match self.catalog.create_resource(&desc.container, &desc.name, content, None, acl, Some(&job.context.user)) {
                Ok(r) => {
                    info!(target: "canopy::worker", "resource {} created", r.path);
                    (r, true)
                }
                Err(e) if e.is_conflict() => {
                    let path = job.id();
                    // A collection at this path is not ours to adopt.
                    let existing = self.catalog.find_resource(&path)?.ok_or(e)?;
                    info!(target: "canopy::worker", "resource {} exists, adopting", path);
                    (existing, false)
                }
                Err(e) => return Err(e),
            };

        if created {
            return Ok((resource, UpsertOutcome::Created));
        }

        let mut resource = resource;
        // create_resource and update_resource reindex on their own.
        let url_updated = resource.url() != url;
        if url_updated {
            // TODO: release the superseded content object once content stores expose deletion.
            let update = EntryUpdate { url: Some(url), size: Some(size), ..Default::default() };
            resource = self.catalog.update_resource(&resource.path, update, Some(&job.context.user))?;
            info!(target: "canopy::worker", "resource {} url updated", resource.path);
        } else {
            self.catalog.reindex(&Node::Resource(resource.clone()))?;
        }
        Ok((resource, UpsertOutcome::Adopted { url_updated }))
    }
}
