//! The unit of work handed from the walker to the workers. A job carries
//! everything needed to create or adopt one resource; workers never consult
//! the walker's collection cache.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::content::file_url;
use crate::error::{StoreError, StoreResult};
use crate::tree::{merge, normalize_nfc};
use crate::tree::paths::{validate_name, validate_path};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub name: String,
    /// Path of the already-resolved parent collection.
    pub container: String,
    pub mimetype: Option<String>,
    pub size: u64,
    pub ext_type: String,
    pub read_access: Vec<String>,
    pub write_access: Vec<String>,
    pub compress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobContext {
    pub fullpath: PathBuf,
    pub local_ip: String,
    /// Directory of the file relative to the ingest root, "/"-separated.
    pub rel_dir: String,
    pub filename: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestJob {
    pub resource: ResourceDescriptor,
    pub context: JobContext,
    pub is_reference: bool,
}

impl IngestJob {
    /// NFC `container/name`: the tree path the job creates or adopts.
    pub fn id(&self) -> String { normalize_nfc(&merge(&self.resource.container, &self.resource.name)) }

    /// Malformed jobs fail the same way on every attempt.
    pub fn validate(&self) -> StoreResult<()> {
        let bad = |e: StoreError| StoreError::InvalidJob(format!("{}: {}", self.id(), e));
        validate_name(&self.resource.name).map_err(bad)?;
        validate_path(&self.resource.container).map_err(bad)?;
        if self.context.fullpath.as_os_str().is_empty() {
            return Err(StoreError::InvalidJob(format!("{}: no source path", self.id())));
        }
        if self.is_reference && self.context.local_ip.is_empty() {
            return Err(StoreError::InvalidJob(format!("{}: reference job without host", self.id())));
        }
        Ok(())
    }

    /// `file://` URL of the source for reference ingestion.
    pub fn reference_url(&self) -> String {
        file_url(&self.context.local_ip, &self.context.rel_dir, &self.context.filename)
    }
}
