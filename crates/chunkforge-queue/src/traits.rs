//! The [`ChunkQueue`] contract: at-least-once delivery of chunks to a single
//! worker process on a single host, local to one (repository, branch) pair.

use async_trait::async_trait;
use chunkforge_parsing::Chunk;

use crate::error::Result;
use crate::models::{QueueDepth, QueueItem};

#[async_trait]
pub trait ChunkQueue: Send + Sync {
    /// Atomically append all chunks under a single batch id. Duplicates
    /// (same `chunk_hash`) are permitted; dedup is the search backend's job.
    async fn enqueue(&self, chunks: &[Chunk]) -> Result<()>;

    /// Select up to `n` pending items in FIFO order (`created_at` then
    /// `id`), atomically flip them to `processing`, and stamp
    /// `processing_started_at`/`worker_pid`. Select-and-update happens in
    /// one serialized transaction so no item is handed to two callers.
    /// Returns fewer than `n` (possibly zero) if the pending set is smaller.
    async fn dequeue(&self, n: usize, worker_pid: u32) -> Result<Vec<QueueItem>>;

    /// Acknowledge successful processing by removing the items.
    async fn commit(&self, ids: &[i64]) -> Result<()>;

    /// For each item: if `retry_count + 1 >= max_retries`, mark `failed`;
    /// otherwise return it to `pending` with `retry_count` incremented and
    /// lease fields cleared. Batched in one transaction.
    async fn requeue(&self, ids: &[i64]) -> Result<()>;

    /// Remove every row and reset the enqueue-completed latch.
    async fn clear(&self) -> Result<()>;

    /// Latch the producer sets when it has finished enqueueing for this run.
    async fn mark_enqueue_completed(&self) -> Result<()>;

    /// Whether the producer has finished enqueueing for this run.
    async fn is_enqueue_completed(&self) -> Result<bool>;

    /// Reset `processing` items whose owner is gone or whose lease has
    /// expired back to `pending`. Returns the count recovered. Called
    /// unconditionally at worker startup.
    async fn requeue_stale_tasks(&self) -> Result<u64>;

    /// Gauge snapshot of queue contents by status.
    async fn queue_depth(&self) -> Result<QueueDepth>;
}
