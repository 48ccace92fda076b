//! In-memory [`SearchBackendClient`] test harness.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chunkforge_parsing::Chunk;

use crate::error::Result;
use crate::traits::{BulkResult, SearchBackendClient};

#[derive(Default)]
struct IndexState {
    documents: HashMap<String, Chunk>,
    anchors: HashMap<String, String>,
}

/// In-memory stand-in for a real search backend, used by tests in downstream
/// crates (the indexer worker, the orchestrator) with no network dependency.
pub struct InMemoryBackend {
    indices: Mutex<HashMap<String, IndexState>>,
    settings_indices: Mutex<HashSet<String>>,
    fail_bulk_index: bool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            indices: Mutex::new(HashMap::new()),
            settings_indices: Mutex::new(HashSet::new()),
            fail_bulk_index: false,
        }
    }

    /// Force every `bulk_index` call to fail as a whole batch, exercising the
    /// worker's whole-batch-requeue path.
    pub fn with_bulk_index_failure(mut self) -> Self {
        self.fail_bulk_index = true;
        self
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.indices
            .lock()
            .expect("lock poisoned")
            .get(index)
            .map_or(0, |state| state.documents.len())
    }

    pub fn documents(&self, index: &str) -> Vec<Chunk> {
        self.indices
            .lock()
            .expect("lock poisoned")
            .get(index)
            .map(|state| state.documents.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackendClient for InMemoryBackend {
    async fn ensure_index(&self, index: &str) -> Result<()> {
        self.indices
            .lock()
            .expect("lock poisoned")
            .entry(index.to_string())
            .or_default();
        Ok(())
    }

    async fn ensure_settings_index(&self, index: &str) -> Result<()> {
        self.settings_indices.lock().expect("lock poisoned").insert(index.to_string());
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        self.indices.lock().expect("lock poisoned").remove(index);
        Ok(())
    }

    async fn bulk_index(&self, index: &str, chunks: &[Chunk]) -> Result<BulkResult> {
        if self.fail_bulk_index {
            return Err(crate::error::BackendError::transport("mock backend configured to fail bulk_index"));
        }

        let mut indices = self.indices.lock().expect("lock poisoned");
        let state = indices.entry(index.to_string()).or_default();

        let mut result = BulkResult::default();
        for chunk in chunks {
            state.documents.insert(chunk.chunk_hash.clone(), chunk.clone());
            result.succeeded.push(chunk.clone());
        }
        Ok(result)
    }

    async fn delete_by_file_path(&self, index: &str, path: &str) -> Result<()> {
        if let Some(state) = self.indices.lock().expect("lock poisoned").get_mut(index) {
            state.documents.retain(|_, chunk| chunk.file_path != path);
        }
        Ok(())
    }

    async fn get_anchor(&self, index: &str, branch: &str) -> Result<Option<String>> {
        Ok(self
            .indices
            .lock()
            .expect("lock poisoned")
            .get(index)
            .and_then(|state| state.anchors.get(branch).cloned()))
    }

    async fn put_anchor(&self, index: &str, branch: &str, hash: &str) -> Result<()> {
        let mut indices = self.indices.lock().expect("lock poisoned");
        let state = indices.entry(index.to_string()).or_default();
        state.anchors.insert(branch.to_string(), hash.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chunkforge_parsing::{ChunkDraft, ChunkKind};

    fn sample_chunk(path: &str, content: &str) -> Chunk {
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
        Chunk::from_draft(draft, path, "main", "deadbeef", Utc::now())
    }

    #[tokio::test]
    async fn bulk_index_then_delete_by_file_path() {
        let backend = InMemoryBackend::new();
        backend.ensure_index("repo-idx").await.unwrap();

        let chunks = vec![sample_chunk("src/a.rs", "fn a() {}"), sample_chunk("src/b.rs", "fn b() {}")];
        let result = backend.bulk_index("repo-idx", &chunks).await.unwrap();
        assert_eq!(result.succeeded.len(), 2);
        assert_eq!(backend.document_count("repo-idx"), 2);

        backend.delete_by_file_path("repo-idx", "src/a.rs").await.unwrap();
        assert_eq!(backend.document_count("repo-idx"), 1);
    }

    #[tokio::test]
    async fn anchor_round_trips_per_branch() {
        let backend = InMemoryBackend::new();
        backend.ensure_settings_index("repo-idx").await.unwrap();
        assert_eq!(backend.get_anchor("repo-idx", "main").await.unwrap(), None);

        backend.put_anchor("repo-idx", "main", "abc123").await.unwrap();
        assert_eq!(backend.get_anchor("repo-idx", "main").await.unwrap(), Some("abc123".to_string()));
        assert_eq!(backend.get_anchor("repo-idx", "dev").await.unwrap(), None);
    }

    #[tokio::test]
    async fn bulk_index_failure_mode_reports_whole_batch_as_transport_error() {
        let backend = InMemoryBackend::new().with_bulk_index_failure();
        let chunks = vec![sample_chunk("src/a.rs", "fn a() {}")];
        assert!(backend.bulk_index("idx", &chunks).await.is_err());
    }
}
