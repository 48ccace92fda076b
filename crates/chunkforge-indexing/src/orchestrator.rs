//! Pipeline Orchestrator (C7): composes the Change Planner, Parser Pool,
//! Durable Work Queue, Indexer Worker, and Commit Anchor for one repository.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chunkforge_backend::SearchBackendClient;
use chunkforge_git::planner::{self, ChangeAction, PlanSummary};
use chunkforge_git::RepositoryContext;
use chunkforge_parsing::pool::{ParserPool, PoolFileInput};
use chunkforge_queue::ChunkQueue;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{IndexingError, Result};
use crate::worker::{IndexerWorker, WorkerStats};

/// Per-repository run parameters. One orchestrator instance processes one
/// repository; multiple repositories use separate instances (and separate
/// queues — this core never shares a queue across repositories).
pub struct RepositoryRun {
    pub repo_path: std::path::PathBuf,
    pub index_name: String,
    /// Drop the index and clear the queue before indexing, forcing a full run.
    pub clean: bool,
}

/// Tallies returned after a single orchestrator run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub plan: PlanSummary,
    pub worker: WorkerStats,
    pub anchor_advanced: bool,
}

pub struct PipelineOrchestrator {
    queue: Arc<dyn ChunkQueue>,
    backend: Arc<dyn SearchBackendClient>,
    parser_pool: ParserPool,
    max_chunk_size_bytes: usize,
    batch_size: usize,
    indexer_concurrency: usize,
    poll_interval: Duration,
}

impl PipelineOrchestrator {
    pub fn new(
        queue: Arc<dyn ChunkQueue>,
        backend: Arc<dyn SearchBackendClient>,
        parser_pool: ParserPool,
        max_chunk_size_bytes: usize,
        batch_size: usize,
        indexer_concurrency: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            backend,
            parser_pool,
            max_chunk_size_bytes,
            batch_size,
            indexer_concurrency,
            poll_interval,
        }
    }

    pub async fn run(&self, run: &RepositoryRun) -> Result<RunSummary> {
        let ctx = RepositoryContext::detect(&run.repo_path).map_err(IndexingError::from_git)?;

        self.backend
            .ensure_index(&run.index_name)
            .await
            .map_err(IndexingError::from_backend)?;
        self.backend
            .ensure_settings_index(&run.index_name)
            .await
            .map_err(IndexingError::from_backend)?;

        if run.clean {
            self.backend
                .delete_index(&run.index_name)
                .await
                .map_err(IndexingError::from_backend)?;
            self.backend
                .ensure_index(&run.index_name)
                .await
                .map_err(IndexingError::from_backend)?;
            self.queue.clear().await.map_err(IndexingError::from_queue)?;
        }

        let anchor = self
            .backend
            .get_anchor(&run.index_name, &ctx.branch)
            .await
            .map_err(IndexingError::from_backend)?;

        let plan = if run.clean || anchor.is_none() {
            planner::plan_full(&ctx.root_path).map_err(IndexingError::from_git)?
        } else {
            let repo = git2::Repository::discover(&ctx.root_path)
                .map_err(|e| IndexingError::Git(e.to_string()))?;
            planner::plan_incremental(&repo, &ctx.branch, anchor.as_deref())
                .map_err(IndexingError::from_git)?
        };

        info!(
            index_only = plan.summary.index_only,
            delete_only = plan.summary.delete_only,
            delete_and_index = plan.summary.delete_and_index,
            "change plan computed"
        );

        // Deletes are dispatched before the parser pool begins producing chunks.
        for action in &plan.actions {
            if matches!(action, ChangeAction::DeleteOnly { .. } | ChangeAction::DeleteAndIndex { .. }) {
                self.backend
                    .delete_by_file_path(&run.index_name, action.path())
                    .await
                    .map_err(IndexingError::from_backend)?;
            }
        }

        let mut files = Vec::new();
        for action in &plan.actions {
            if matches!(action, ChangeAction::IndexOnly { .. } | ChangeAction::DeleteAndIndex { .. }) {
                let abs = ctx.absolutize_path(action.path());
                match tokio::fs::read(&abs).await {
                    Ok(raw_bytes) => files.push(PoolFileInput { file_path: action.path().to_string(), raw_bytes }),
                    Err(err) => warn!(path = action.path(), error = %err, "skipping unreadable file"),
                }
            }
        }

        let (tx, mut rx) = mpsc::channel(self.batch_size.max(1));
        let parse_handle = {
            let pool = &self.parser_pool;
            pool.run(files, &ctx.branch, self.max_chunk_size_bytes, tx)
        };

        let enqueue_task = async {
            while let Some(result) = rx.recv().await {
                match result.chunks {
                    Ok(chunks) if !chunks.is_empty() => {
                        if let Err(err) = self.queue.enqueue(&chunks).await {
                            warn!(file = result.file_path, error = %err, "failed to enqueue chunks");
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(file = result.file_path, error = %err, "extraction failed");
                    }
                }
            }
        };

        let (metrics, ()) = tokio::join!(parse_handle, enqueue_task);
        info!(
            files_processed = metrics.files_processed,
            files_failed = metrics.files_failed,
            chunks_created = metrics.chunks_created,
            chunks_skipped = metrics.chunks_skipped,
            "parser pool drained"
        );

        self.queue
            .mark_enqueue_completed()
            .await
            .map_err(IndexingError::from_queue)?;

        let worker = IndexerWorker::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.backend),
            run.index_name.clone(),
            self.batch_size,
            self.indexer_concurrency,
            self.poll_interval,
            false,
        );
        let worker_stats = worker.run().await?;

        let depth = self.queue.queue_depth().await.map_err(IndexingError::from_queue)?;
        let drained = depth.pending == 0 && depth.processing == 0;

        let mut anchor_advanced = false;
        if drained {
            let head = RepositoryContext::detect(&run.repo_path).map_err(IndexingError::from_git)?;
            if let Some(sha) = head.commit_sha {
                self.backend
                    .put_anchor(&run.index_name, &ctx.branch, &sha)
                    .await
                    .map_err(IndexingError::from_backend)?;
                anchor_advanced = true;
            }
        } else {
            warn!("worker exited with a non-empty queue; commit anchor left unchanged");
        }

        Ok(RunSummary { plan: plan.summary, worker: worker_stats, anchor_advanced })
    }
}
