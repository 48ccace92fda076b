//! In-memory [`ChunkQueue`] test harness, mirroring this codebase's
//! `MockChunkQueue` test pattern (`chunk_queue.rs`) but as a first-class
//! crate type rather than a private test-only struct, since integration
//! tests in other crates (the indexer worker, the orchestrator) need a
//! `ChunkQueue` implementation with no SQLite file.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use chunkforge_parsing::Chunk;

use crate::error::Result;
use crate::models::{QueueDepth, QueueItem, QueueStatus};
use crate::traits::ChunkQueue;

struct Entry {
    item: QueueItem,
}

pub struct InMemoryChunkQueue {
    entries: Mutex<Vec<Entry>>,
    next_id: Mutex<i64>,
    enqueue_completed: Mutex<bool>,
    max_retries: i32,
}

impl InMemoryChunkQueue {
    pub fn new(max_retries: i32) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
            enqueue_completed: Mutex::new(false),
            max_retries,
        }
    }
}

impl Default for InMemoryChunkQueue {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl ChunkQueue for InMemoryChunkQueue {
    async fn enqueue(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let batch_id = Utc::now().to_rfc3339();
        let mut entries = self.entries.lock().expect("lock poisoned");
        let mut next_id = self.next_id.lock().expect("lock poisoned");

        for chunk in chunks {
            let document = serde_json::to_string(chunk)?;
            let id = *next_id;
            *next_id += 1;
            entries.push(Entry {
                item: QueueItem {
                    id,
                    batch_id: batch_id.clone(),
                    document,
                    status: QueueStatus::Pending,
                    retry_count: 0,
                    created_at: Utc::now(),
                    processing_started_at: None,
                    worker_pid: None,
                },
            });
        }
        Ok(())
    }

    async fn dequeue(&self, n: usize, worker_pid: u32) -> Result<Vec<QueueItem>> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let now = Utc::now();
        let mut claimed = Vec::new();

        for entry in entries.iter_mut() {
            if claimed.len() >= n {
                break;
            }
            if entry.item.status == QueueStatus::Pending {
                entry.item.status = QueueStatus::Processing;
                entry.item.processing_started_at = Some(now);
                entry.item.worker_pid = Some(i64::from(worker_pid));
                claimed.push(entry.item.clone());
            }
        }
        Ok(claimed)
    }

    async fn commit(&self, ids: &[i64]) -> Result<()> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.retain(|e| !ids.contains(&e.item.id));
        Ok(())
    }

    async fn requeue(&self, ids: &[i64]) -> Result<()> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        for entry in entries.iter_mut() {
            if ids.contains(&entry.item.id) {
                entry.item.retry_count += 1;
                if entry.item.retry_count >= self.max_retries {
                    entry.item.status = QueueStatus::Failed;
                } else {
                    entry.item.status = QueueStatus::Pending;
                }
                entry.item.processing_started_at = None;
                entry.item.worker_pid = None;
            }
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.lock().expect("lock poisoned").clear();
        *self.enqueue_completed.lock().expect("lock poisoned") = false;
        Ok(())
    }

    async fn mark_enqueue_completed(&self) -> Result<()> {
        *self.enqueue_completed.lock().expect("lock poisoned") = true;
        Ok(())
    }

    async fn is_enqueue_completed(&self) -> Result<bool> {
        Ok(*self.enqueue_completed.lock().expect("lock poisoned"))
    }

    async fn requeue_stale_tasks(&self) -> Result<u64> {
        // The in-memory queue has no cross-process pid concept; tests that
        // need stale recovery construct a new queue sharing the same
        // backing store instead of simulating lease expiry here.
        Ok(0)
    }

    async fn queue_depth(&self) -> Result<QueueDepth> {
        let entries = self.entries.lock().expect("lock poisoned");
        let mut depth = QueueDepth::default();
        for entry in entries.iter() {
            match entry.item.status {
                QueueStatus::Pending => depth.pending += 1,
                QueueStatus::Processing => depth.processing += 1,
                QueueStatus::Failed => depth.failed += 1,
            }
        }
        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkforge_parsing::{ChunkDraft, ChunkKind};

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
    async fn enqueue_then_dequeue_claims_pending_items() {
        let queue = InMemoryChunkQueue::new(3);
        queue
            .enqueue(&[sample_chunk("a"), sample_chunk("b"), sample_chunk("c")])
            .await
            .unwrap();

        let claimed = queue.dequeue(2, 42).await.unwrap();
        assert_eq!(claimed.len(), 2);

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.pending, 1);
        assert_eq!(depth.processing, 2);
    }

    #[tokio::test]
    async fn requeue_exceeding_max_retries_marks_failed() {
        let queue = InMemoryChunkQueue::new(2);
        queue.enqueue(&[sample_chunk("a")]).await.unwrap();
        let claimed = queue.dequeue(1, 1).await.unwrap();
        let id = claimed[0].id;

        queue.requeue(&[id]).await.unwrap();
        assert_eq!(queue.queue_depth().await.unwrap().pending, 1);

        let claimed = queue.dequeue(1, 1).await.unwrap();
        queue.requeue(&[claimed[0].id]).await.unwrap();
        assert_eq!(queue.queue_depth().await.unwrap().failed, 1);
    }

    #[tokio::test]
    async fn concurrent_dequeue_never_overlaps() {
        let queue = std::sync::Arc::new(InMemoryChunkQueue::new(3));
        queue
            .enqueue(&(0..10).map(|i| sample_chunk(&format!("chunk{i}"))).collect::<Vec<_>>())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for worker_id in 0..4u32 {
            let queue = std::sync::Arc::clone(&queue);
            handles.push(tokio::spawn(async move { queue.dequeue(3, worker_id).await.unwrap() }));
        }

        let mut all_ids = Vec::new();
        for handle in handles {
            all_ids.extend(handle.await.unwrap().into_iter().map(|i| i.id));
        }
        let unique: std::collections::HashSet<_> = all_ids.iter().collect();
        assert_eq!(all_ids.len(), unique.len(), "no item should be claimed twice");
    }

    #[tokio::test]
    async fn enqueue_completed_latch_round_trips() {
        let queue = InMemoryChunkQueue::new(3);
        assert!(!queue.is_enqueue_completed().await.unwrap());
        queue.mark_enqueue_completed().await.unwrap();
        assert!(queue.is_enqueue_completed().await.unwrap());
        queue.clear().await.unwrap();
        assert!(!queue.is_enqueue_completed().await.unwrap());
    }
}
