use serde::{Deserialize, Serialize};

use crate::acl::AUTHENTICATED;
use crate::tree::{AccessMask, Acl};

/// Global ingest settings applied to every run unless overridden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalIngestConfig {
    pub workers: usize,
    /// Jobs the walker may queue ahead of the workers before it blocks.
    pub queue_capacity: usize,
    /// Bytes per content chunk in copy mode.
    pub chunk_size: usize,
    /// Attempts per job, first one included.
    pub max_attempts: usize,
    pub skip_suffixes: Vec<String>,
    pub default_local_ip: String,
}

impl Default for GlobalIngestConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 900,
            chunk_size: 1024 * 1024,
            max_attempts: 4,
            skip_suffixes: vec![".pyc".to_string()],
            default_local_ip: "127.0.0.1".to_string(),
        }
    }
}

fn env_usize(var: &str, current: usize) -> usize {
    match std::env::var(var) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(target: "canopy::config", "ignoring {}={:?}: not a number", var, raw);
                current
            }
        },
        Err(_) => current,
    }
}

impl GlobalIngestConfig {
    /// Defaults overlaid with CANOPY_INGEST_* environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.workers = env_usize("CANOPY_INGEST_WORKERS", cfg.workers);
        cfg.queue_capacity = env_usize("CANOPY_INGEST_QUEUE_CAPACITY", cfg.queue_capacity);
        cfg.chunk_size = env_usize("CANOPY_INGEST_CHUNK_SIZE", cfg.chunk_size);
        cfg.max_attempts = env_usize("CANOPY_INGEST_MAX_ATTEMPTS", cfg.max_attempts);
        if let Ok(ip) = std::env::var("CANOPY_INGEST_LOCAL_IP") {
            let ip = ip.trim();
            if ip.is_empty() {
                tracing::warn!(target: "canopy::config", "ignoring empty CANOPY_INGEST_LOCAL_IP");
            } else {
                cfg.default_local_ip = ip.to_string();
            }
        }
        cfg
    }
}

/// Per-run options. Unspecified values inherit from Global.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestOptions {
    /// Case-insensitive substring selecting the first matching top-level directory.
    pub include_pattern: Option<String>,
    pub local_ip: Option<String>,
    /// Record `file://` pointers instead of copying bytes.
    pub is_reference: bool,
    pub compress: bool,
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub chunk_size: Option<usize>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            include_pattern: None,
            local_ip: None,
            is_reference: false,
            compress: true,
            workers: None,
            queue_capacity: None,
            chunk_size: None,
        }
    }
}

/// Fully resolved config used by one ingest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectiveIngestConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub chunk_size: usize,
    pub max_attempts: usize,
    pub skip_suffixes: Vec<String>,
    pub local_ip: String,
    pub include_pattern: Option<String>,
    pub is_reference: bool,
    pub compress: bool,
}

impl EffectiveIngestConfig {
    /// Build from Global + per-run options. Counts and sizes never drop below 1.
    pub fn from_layers(global: &GlobalIngestConfig, opts: &IngestOptions) -> Self {
        let workers = opts.workers.unwrap_or(global.workers).max(1);
        let queue_capacity = opts.queue_capacity.unwrap_or(global.queue_capacity).max(1);
        let chunk_size = opts.chunk_size.unwrap_or(global.chunk_size).max(1);
        let local_ip = opts
            .local_ip
            .clone()
            .filter(|ip| !ip.is_empty())
            .unwrap_or_else(|| global.default_local_ip.clone());
        let include_pattern = opts.include_pattern.as_ref().map(|p| p.to_lowercase()).filter(|p| !p.is_empty());

        Self {
            workers,
            queue_capacity,
            chunk_size,
            max_attempts: global.max_attempts.max(1),
            skip_suffixes: global.skip_suffixes.clone(),
            local_ip,
            include_pattern,
            is_reference: opts.is_reference,
            compress: opts.compress,
        }
    }

    pub fn is_skipped(&self, file_name: &str) -> bool {
        self.skip_suffixes.iter().any(|s| file_name.ends_with(s.as_str()))
    }
}

/// Catalog-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// ACL seeded on the root when it is first created.
    pub root_acl: Acl,
    /// Node fields handed to the search index on every change.
    pub index_fields: Vec<crate::search::IndexField>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let mut root_acl = Acl::new();
        root_acl.insert(AUTHENTICATED.to_string(), AccessMask::Read);
        Self {
            root_acl,
            index_fields: vec![crate::search::IndexField::Name, crate::search::IndexField::Metadata],
        }
    }
}

#[cfg(test)]
mod config_tests;
