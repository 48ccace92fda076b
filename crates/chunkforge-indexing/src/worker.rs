//! Indexer Worker (C5): drains the durable queue into the search backend
//! with bounded concurrency, bulk batching, and partial-failure reconciliation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chunkforge_backend::SearchBackendClient;
use chunkforge_parsing::Chunk;
use chunkforge_queue::{ChunkQueue, QueueItem};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::{IndexingError, Result};

/// Tallies accumulated across a worker's run, for logging/metrics.
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    pub batches_succeeded: u64,
    pub batches_failed: u64,
    pub batches_partial: u64,
    pub chunks_committed: u64,
    pub chunks_requeued: u64,
}

struct BatchOutcome {
    committed_ids: Vec<i64>,
    requeued_ids: Vec<i64>,
}

/// Drains `queue` into `backend` until the producer signals completion (or,
/// in watch mode, forever).
pub struct IndexerWorker {
    queue: Arc<dyn ChunkQueue>,
    backend: Arc<dyn SearchBackendClient>,
    index_name: String,
    batch_size: usize,
    concurrency: usize,
    poll_interval: Duration,
    watch_mode: bool,
    shutdown: Arc<AtomicBool>,
}

impl IndexerWorker {
    pub fn new(
        queue: Arc<dyn ChunkQueue>,
        backend: Arc<dyn SearchBackendClient>,
        index_name: impl Into<String>,
        batch_size: usize,
        concurrency: usize,
        poll_interval: Duration,
        watch_mode: bool,
    ) -> Self {
        Self {
            queue,
            backend,
            index_name: index_name.into(),
            batch_size,
            concurrency,
            poll_interval,
            watch_mode,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle the orchestrator can flip to request cooperative shutdown.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the drain loop to completion (non-watch mode) or until the
    /// shutdown handle is set (watch mode).
    pub async fn run(&self) -> Result<WorkerStats> {
        let stale = self
            .queue
            .requeue_stale_tasks()
            .await
            .map_err(IndexingError::from_queue)?;
        if stale > 0 {
            info!(stale, "recovered stale queue leases at worker startup");
        }

        let mut join_set: JoinSet<BatchOutcome> = JoinSet::new();
        let mut stats = WorkerStats::default();

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Backpressure gate: never let more than `concurrency` batches
            // be in flight at once.
            if join_set.len() >= self.concurrency {
                if let Some(outcome) = join_set.join_next().await {
                    self.apply_outcome(outcome, &mut stats).await?;
                }
                continue;
            }

            let items = self
                .queue
                .dequeue(self.batch_size, std::process::id())
                .await
                .map_err(IndexingError::from_queue)?;

            if items.is_empty() {
                if self.shutdown.load(Ordering::Relaxed) {
                    break;
                }
                if !self.watch_mode {
                    let enqueue_completed = self
                        .queue
                        .is_enqueue_completed()
                        .await
                        .map_err(IndexingError::from_queue)?;
                    if enqueue_completed && join_set.is_empty() {
                        break;
                    }
                }
                sleep(self.poll_interval).await;
                continue;
            }

            let backend = Arc::clone(&self.backend);
            let index_name = self.index_name.clone();
            join_set.spawn(async move { process_batch(backend, index_name, items).await });
        }

        while let Some(outcome) = join_set.join_next().await {
            self.apply_outcome(outcome, &mut stats).await?;
        }

        Ok(stats)
    }

    async fn apply_outcome(
        &self,
        outcome: std::result::Result<BatchOutcome, tokio::task::JoinError>,
        stats: &mut WorkerStats,
    ) -> Result<()> {
        let outcome = outcome.map_err(|e| IndexingError::Other(format!("batch task panicked: {e}")))?;

        if !outcome.committed_ids.is_empty() {
            self.queue
                .commit(&outcome.committed_ids)
                .await
                .map_err(IndexingError::from_queue)?;
        }
        if !outcome.requeued_ids.is_empty() {
            self.queue
                .requeue(&outcome.requeued_ids)
                .await
                .map_err(IndexingError::from_queue)?;
        }

        stats.chunks_committed += outcome.committed_ids.len() as u64;
        stats.chunks_requeued += outcome.requeued_ids.len() as u64;
        match (outcome.committed_ids.is_empty(), outcome.requeued_ids.is_empty()) {
            (false, true) => stats.batches_succeeded += 1,
            (true, false) => stats.batches_failed += 1,
            _ => stats.batches_partial += 1,
        }
        Ok(())
    }
}

async fn process_batch(
    backend: Arc<dyn SearchBackendClient>,
    index_name: String,
    items: Vec<QueueItem>,
) -> BatchOutcome {
    let mut id_by_hash = HashMap::with_capacity(items.len());
    let mut chunks = Vec::with_capacity(items.len());
    let mut all_ids = Vec::with_capacity(items.len());

    for item in &items {
        all_ids.push(item.id);
        match serde_json::from_str::<Chunk>(&item.document) {
            Ok(chunk) => {
                id_by_hash.insert(chunk.chunk_hash.clone(), item.id);
                chunks.push(chunk);
            }
            Err(err) => {
                warn!(id = item.id, error = %err, "dropping queue item with undeserializable document");
            }
        }
    }

    match backend.bulk_index(&index_name, &chunks).await {
        Ok(result) => {
            let committed_ids = result
                .succeeded
                .iter()
                .filter_map(|c| id_by_hash.get(&c.chunk_hash).copied())
                .collect();
            let requeued_ids = result
                .failed
                .iter()
                .filter_map(|f| id_by_hash.get(&f.chunk.chunk_hash).copied())
                .collect();
            BatchOutcome { committed_ids, requeued_ids }
        }
        Err(err) => {
            error!(error = %err, batch_size = items.len(), "bulk_index transport failure; requeuing whole batch");
            BatchOutcome { committed_ids: Vec::new(), requeued_ids: all_ids }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkforge_backend::InMemoryBackend;
    use chunkforge_parsing::{ChunkDraft, ChunkKind};
    use chunkforge_queue::InMemoryChunkQueue;
    use chrono::Utc;

    fn sample_chunk(content: &str) -> Chunk {
        let draft = ChunkDraft {
            kind: ChunkKind::Code,
            language: "rust".to_string(),
            node_kind: "function_item".to_string(),
            container_path: String::new(),
            start_line: 1,
            end_line: 1,
            content: content.to_string(),
            imports: Vec::new(),
            symbols: Vec::new(),
            exports: Vec::new(),
        };
        Chunk::from_draft(draft, "src/main.rs", "main", "deadbeef", Utc::now())
    }

    #[tokio::test]
    async fn drains_queue_and_commits_successful_batches() {
        let queue: Arc<dyn ChunkQueue> = Arc::new(InMemoryChunkQueue::new(3));
        let backend: Arc<dyn SearchBackendClient> = Arc::new(InMemoryBackend::new());
        queue
            .enqueue(&[sample_chunk("a"), sample_chunk("b")])
            .await
            .unwrap();
        queue.mark_enqueue_completed().await.unwrap();

        let worker = IndexerWorker::new(
            Arc::clone(&queue),
            Arc::clone(&backend),
            "repo-idx",
            10,
            2,
            Duration::from_millis(5),
            false,
        );
        let stats = worker.run().await.unwrap();

        assert_eq!(stats.chunks_committed, 2);
        assert_eq!(stats.chunks_requeued, 0);
        assert_eq!(queue.queue_depth().await.unwrap().pending, 0);
    }

    #[tokio::test]
    async fn whole_batch_transport_failure_requeues_every_item() {
        // max_retries=1 so a single requeue lands the item in `failed`,
        // keeping the assertion below independent of how many times the
        // worker's drain loop re-dequeues a still-pending item before that.
        let queue: Arc<dyn ChunkQueue> = Arc::new(InMemoryChunkQueue::new(1));
        let backend: Arc<dyn SearchBackendClient> =
            Arc::new(InMemoryBackend::new().with_bulk_index_failure());
        queue.enqueue(&[sample_chunk("a")]).await.unwrap();
        queue.mark_enqueue_completed().await.unwrap();

        let worker = IndexerWorker::new(
            Arc::clone(&queue),
            Arc::clone(&backend),
            "repo-idx",
            10,
            1,
            Duration::from_millis(5),
            false,
        );
        let stats = worker.run().await.unwrap();

        assert_eq!(stats.chunks_requeued, 1);
        assert_eq!(queue.queue_depth().await.unwrap().failed, 1);
    }
}
