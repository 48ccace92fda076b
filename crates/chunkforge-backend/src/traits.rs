//! The core's only wire dependency: an injected search-backend client.

use async_trait::async_trait;
use chunkforge_parsing::Chunk;

use crate::error::Result;

/// One chunk's bulk-index outcome, paired with the backend's rejection reason.
#[derive(Debug, Clone)]
pub struct FailedChunk {
    pub chunk: Chunk,
    pub error: String,
}

/// Per-document outcome of a [`SearchBackendClient::bulk_index`] call.
#[derive(Debug, Clone, Default)]
pub struct BulkResult {
    pub succeeded: Vec<Chunk>,
    pub failed: Vec<FailedChunk>,
}

/// Search backend abstraction: vector/search index writes plus the commit
/// anchor, stored alongside the index so a fresh machine can resume.
///
/// Document id on bulk writes is the chunk's `chunk_hash`, so duplicate
/// delivery from the durable queue's at-least-once semantics is idempotent
/// at the backend.
#[async_trait]
pub trait SearchBackendClient: Send + Sync {
    /// Idempotently create `index` if it does not already exist.
    async fn ensure_index(&self, index: &str) -> Result<()>;

    /// Idempotently create `index`'s settings companion (anchor storage).
    async fn ensure_settings_index(&self, index: &str) -> Result<()>;

    /// Drop `index` entirely.
    async fn delete_index(&self, index: &str) -> Result<()>;

    /// Write `chunks` to `index`, keyed by `chunk_hash`. Reports per-document
    /// outcomes; on transport failure the whole batch is reported failed.
    async fn bulk_index(&self, index: &str, chunks: &[Chunk]) -> Result<BulkResult>;

    /// Delete every document in `index` whose `file_path` equals `path`.
    async fn delete_by_file_path(&self, index: &str, path: &str) -> Result<()>;

    /// Read the last drained commit hash for `(index, branch)`, if any.
    async fn get_anchor(&self, index: &str, branch: &str) -> Result<Option<String>>;

    /// Record `hash` as the last drained commit for `(index, branch)`.
    async fn put_anchor(&self, index: &str, branch: &str, hash: &str) -> Result<()>;
}
