//! Dependency-injection factory composing already-constructed collaborators
//! into a [`PipelineOrchestrator`], mirroring this codebase's `ServiceFactory`
//! pattern: every component is substitutable with an in-memory/mock
//! implementation for tests, with no feature flags.

use std::sync::Arc;

use chunkforge_backend::SearchBackendClient;
use chunkforge_config::PipelineConfig;
use chunkforge_parsing::pool::ParserPool;
use chunkforge_queue::{ChunkQueue, SqliteChunkQueue};

use crate::error::{IndexingError, Result};
use crate::orchestrator::PipelineOrchestrator;

pub struct OrchestratorFactory {
    config: PipelineConfig,
}

impl OrchestratorFactory {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build an orchestrator backed by a durable SQLite queue on disk for
    /// `(repository_id, branch)`, using the injected backend client.
    pub async fn orchestrator_with_sqlite_queue(
        &self,
        repository_id: &str,
        branch: &str,
        backend: Arc<dyn SearchBackendClient>,
    ) -> Result<PipelineOrchestrator> {
        let store_path = self.config.queue.store_path(repository_id, branch);
        let queue = SqliteChunkQueue::connect(
            &store_path,
            self.config.queue.max_retries as i32,
            self.config.queue.stale_timeout,
        )
        .await
        .map_err(IndexingError::from_queue)?;

        Ok(self.orchestrator(Arc::new(queue), backend))
    }

    /// Build an orchestrator from an already-constructed queue (e.g. an
    /// in-memory queue in tests, or a pre-opened SQLite queue).
    pub fn orchestrator(
        &self,
        queue: Arc<dyn ChunkQueue>,
        backend: Arc<dyn SearchBackendClient>,
    ) -> PipelineOrchestrator {
        let parser_pool = ParserPool::new(self.config.parser_pool.cpu_cores);
        PipelineOrchestrator::new(
            queue,
            backend,
            parser_pool,
            self.config.extractor.max_chunk_size_bytes,
            self.config.indexer.batch_size,
            self.config.indexer.concurrency,
            self.config.queue.poll_interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkforge_backend::InMemoryBackend;
    use chunkforge_queue::InMemoryChunkQueue;

    #[test]
    fn orchestrator_builds_from_in_memory_collaborators() {
        let factory = OrchestratorFactory::new(PipelineConfig::from_env());
        let queue: Arc<dyn ChunkQueue> = Arc::new(InMemoryChunkQueue::default());
        let backend: Arc<dyn SearchBackendClient> = Arc::new(InMemoryBackend::new());
        let _orchestrator = factory.orchestrator(queue, backend);
    }
}
