//! Content object storage: the chunk-append contract and a chunked uploader.
//!
//! An object is created with its first chunk; later chunks are appended by
//! sequence number. Reading concatenates chunks in sequence order.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{StoreError, StoreResult};

/// URL scheme of internally stored content.
pub const INTERNAL_SCHEME: &str = "cassandra://";
pub const FILE_SCHEME: &str = "file://";

pub fn content_url(id: Uuid) -> String { format!("{INTERNAL_SCHEME}{id}") }

/// Object id of an internal content URL.
pub fn parse_content_url(url: &str) -> Option<Uuid> {
    url.strip_prefix(INTERNAL_SCHEME).and_then(|s| Uuid::parse_str(s).ok())
}

/// `file://{host}{dir}/{name}` with each path segment percent-encoded.
/// `dir` is the slash-separated directory relative to the ingest root ("" for the root).
pub fn file_url(host: &str, dir: &str, name: &str) -> String {
    let mut url = format!("{FILE_SCHEME}{host}");
    for seg in dir.split('/').filter(|s| !s.is_empty()) {
        url.push('/');
        url.push_str(&urlencoding::encode(seg));
    }
    url.push('/');
    url.push_str(&urlencoding::encode(name));
    url
}

pub trait ContentStore: Send + Sync {
    /// New object holding `data` as chunk 0.
    fn create(&self, data: &[u8], compress: bool) -> StoreResult<Uuid>;
    fn append_chunk(&self, id: Uuid, data: &[u8], seq: u64, compress: bool) -> StoreResult<()>;
    fn read(&self, id: Uuid) -> StoreResult<Vec<u8>>;
}

#[derive(Debug, Clone)]
struct StoredChunk {
    bytes: Vec<u8>,
    compressed: bool,
    checksum: u64,
}

impl StoredChunk {
    fn encode(data: &[u8], compress: bool) -> StoreResult<Self> {
        let checksum = xxh3_64(data);
        let bytes = if compress {
            let mut enc = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), Compression::default());
            enc.write_all(data)?;
            enc.finish()?
        } else {
            data.to_vec()
        };
        Ok(Self { bytes, compressed: compress, checksum })
    }

    fn decode(&self, id: Uuid, seq: u64) -> StoreResult<Vec<u8>> {
        let data = if self.compressed {
            let mut out = Vec::new();
            ZlibDecoder::new(self.bytes.as_slice()).read_to_end(&mut out)?;
            out
        } else {
            self.bytes.clone()
        };
        if xxh3_64(&data) != self.checksum {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("checksum mismatch in object {id} chunk {seq}"),
            )));
        }
        Ok(data)
    }
}

/// In-memory content store.
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    objects: Arc<RwLock<HashMap<Uuid, BTreeMap<u64, StoredChunk>>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self { Self::default() }

    pub fn object_count(&self) -> usize { self.objects.read().len() }

    pub fn chunk_count(&self, id: Uuid) -> usize {
        self.objects.read().get(&id).map(|c| c.len()).unwrap_or(0)
    }

    /// Stored (possibly compressed) bytes across all objects.
    pub fn stored_bytes(&self) -> usize {
        self.objects.read().values().flat_map(|c| c.values()).map(|c| c.bytes.len()).sum()
    }
}

impl ContentStore for MemoryContentStore {
    fn create(&self, data: &[u8], compress: bool) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let chunk = StoredChunk::encode(data, compress)?;
        self.objects.write().insert(id, BTreeMap::from([(0, chunk)]));
        Ok(id)
    }

    fn append_chunk(&self, id: Uuid, data: &[u8], seq: u64, compress: bool) -> StoreResult<()> {
        let chunk = StoredChunk::encode(data, compress)?;
        let mut w = self.objects.write();
        let chunks = w.get_mut(&id).ok_or_else(|| StoreError::NotFound(content_url(id)))?;
        chunks.insert(seq, chunk);
        Ok(())
    }

    fn read(&self, id: Uuid) -> StoreResult<Vec<u8>> {
        let r = self.objects.read();
        let chunks = r.get(&id).ok_or_else(|| StoreError::NotFound(content_url(id)))?;
        let mut out = Vec::new();
        for (seq, chunk) in chunks {
            out.extend(chunk.decode(id, *seq)?);
        }
        Ok(out)
    }
}

/// Stream the file at `path` into `store` in `chunk_size` pieces. An empty
/// file still yields an (empty) object. Returns the object id and byte count.
pub fn upload_file(store: &dyn ContentStore, path: &Path, chunk_size: usize, compress: bool) -> StoreResult<(Uuid, u64)> {
    let mut reader = BufReader::new(File::open(path)?);
    let chunk_size = chunk_size.max(1);
    let mut buf = Vec::with_capacity(chunk_size);
    let mut id: Option<Uuid> = None;
    let mut seq: u64 = 0;
    let mut total: u64 = 0;
    loop {
        buf.clear();
        let n = (&mut reader).take(chunk_size as u64).read_to_end(&mut buf)?;
        if n == 0 && id.is_some() {
            break;
        }
        match id {
            None => id = Some(store.create(&buf, compress)?),
            Some(obj) => store.append_chunk(obj, &buf, seq, compress)?,
        }
        total += n as u64;
        seq += 1;
        if n < chunk_size {
            break;
        }
    }
    let id = id.ok_or_else(|| StoreError::NotFound(path.display().to_string()))?;
    debug!(target: "canopy::ingest", "uploaded {} ({} bytes, {} chunks) as {}", path.display(), total, seq, id);
    Ok((id, total))
}
