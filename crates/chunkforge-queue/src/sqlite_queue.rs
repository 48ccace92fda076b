//! SQLite-backed [`ChunkQueue`]: a single-file, WAL-enabled durable store.
//!
//! Adapted from this codebase's `PostgresChunkQueue` (`SELECT ... FOR UPDATE
//! SKIP LOCKED`) to a single-writer model: SQLite has no `SKIP LOCKED`, so
//! `dequeue` instead runs its select-then-update inside a `BEGIN IMMEDIATE`
//! transaction, which serializes writers at the database level and gives
//! the same "no item handed out twice" guarantee for this queue's
//! single-process-per-repository design.

use std::path::Path;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chunkforge_parsing::Chunk;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use sysinfo::{Pid, System};

use crate::error::{QueueError, Result};
use crate::models::{QueueDepth, QueueItem, QueueStatus};
use crate::traits::ChunkQueue;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteChunkQueue {
    pool: SqlitePool,
    max_retries: i32,
    stale_timeout: StdDuration,
}

impl SqliteChunkQueue {
    /// Open (creating if missing) the queue store at `db_path` and run
    /// migrations. `max_retries` and `stale_timeout` govern `requeue` and
    /// `requeue_stale_tasks` respectively.
    pub async fn connect(
        db_path: &Path,
        max_retries: i32,
        stale_timeout: StdDuration,
    ) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(QueueError::from)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;

        Ok(Self {
            pool,
            max_retries,
            stale_timeout,
        })
    }

    fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<QueueItem> {
        let status: String = row.try_get("status")?;
        Ok(QueueItem {
            id: row.try_get("id")?,
            batch_id: row.try_get("batch_id")?,
            document: row.try_get("document")?,
            status: status.parse().map_err(|e: String| {
                sqlx::Error::ColumnDecode {
                    index: "status".to_string(),
                    source: e.into(),
                }
            })?,
            retry_count: row.try_get("retry_count")?,
            created_at: row.try_get("created_at")?,
            processing_started_at: row.try_get("processing_started_at")?,
            worker_pid: row.try_get("worker_pid")?,
        })
    }
}

#[async_trait]
impl ChunkQueue for SqliteChunkQueue {
    async fn enqueue(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let batch_id = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for chunk in chunks {
            let document = serde_json::to_string(chunk)?;
            sqlx::query("INSERT INTO queue (batch_id, document, status) VALUES (?, ?, 'pending')")
                .bind(&batch_id)
                .bind(&document)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn dequeue(&self, n: usize, worker_pid: u32) -> Result<Vec<QueueItem>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        // `BEGIN IMMEDIATE` takes the write lock up front, so the
        // select-then-update below is serialized against any other writer
        // the instant the transaction opens rather than at first write.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let n_i64 = i64::try_from(n).unwrap_or(i64::MAX);
        let ids: Vec<i64> = sqlx::query(
            "SELECT id FROM queue WHERE status = 'pending' ORDER BY created_at ASC, id ASC LIMIT ?",
        )
        .bind(n_i64)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(|row| row.get::<i64, _>("id"))
        .collect();

        if ids.is_empty() {
            tx.commit().await?;
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut update = QueryBuilder::<Sqlite>::new(
            "UPDATE queue SET status = 'processing', processing_started_at = ",
        );
        update.push_bind(now);
        update.push(", worker_pid = ");
        update.push_bind(i64::from(worker_pid));
        update.push(" WHERE id IN (");
        let mut separated = update.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        update.push(")");
        update.build().execute(&mut *tx).await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM queue WHERE id IN (");
        let mut separated = select.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        select.push(") ORDER BY created_at ASC, id ASC");
        let rows = select.build().fetch_all(&mut *tx).await?;
        let items = rows
            .iter()
            .map(Self::row_to_item)
            .collect::<sqlx::Result<Vec<_>>>()?;

        tx.commit().await?;
        Ok(items)
    }

    async fn commit(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM queue WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        query.push(")");
        query.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn requeue(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut query = QueryBuilder::<Sqlite>::new(
            "UPDATE queue SET status = CASE WHEN retry_count + 1 >= ",
        );
        query.push_bind(self.max_retries);
        query.push(
            " THEN 'failed' ELSE 'pending' END, \
             processing_started_at = CASE WHEN retry_count + 1 >= ",
        );
        query.push_bind(self.max_retries);
        query.push(" THEN processing_started_at ELSE NULL END, worker_pid = CASE WHEN retry_count + 1 >= ");
        query.push_bind(self.max_retries);
        query.push(" THEN worker_pid ELSE NULL END, retry_count = retry_count + 1 WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        query.push(")");
        query.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM queue").execute(&mut *tx).await?;
        sqlx::query("UPDATE queue_meta SET enqueue_completed = 0 WHERE id = 1")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn mark_enqueue_completed(&self) -> Result<()> {
        sqlx::query("UPDATE queue_meta SET enqueue_completed = 1 WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_enqueue_completed(&self) -> Result<bool> {
        let row = sqlx::query("SELECT enqueue_completed FROM queue_meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<bool, _>("enqueue_completed"))
    }

    async fn requeue_stale_tasks(&self) -> Result<u64> {
        let rows = sqlx::query(
            "SELECT id, worker_pid, processing_started_at FROM queue WHERE status = 'processing'",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut system = System::new();
        system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
        let now = Utc::now();

        let mut stale_ids = Vec::new();
        for row in rows {
            let id: i64 = row.get("id");
            let worker_pid: Option<i64> = row.get("worker_pid");
            let started_at: Option<DateTime<Utc>> = row.get("processing_started_at");

            let pid_gone = match worker_pid {
                Some(pid) => system
                    .process(Pid::from_u32(u32::try_from(pid).unwrap_or(u32::MAX)))
                    .is_none(),
                None => true,
            };
            let lease_expired = match started_at {
                Some(started) => now - started > Duration::from_std(self.stale_timeout).unwrap_or(Duration::zero()),
                None => true,
            };

            if pid_gone || lease_expired {
                stale_ids.push(id);
            }
        }

        if stale_ids.is_empty() {
            return Ok(0);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "UPDATE queue SET status = 'pending', processing_started_at = NULL, worker_pid = NULL WHERE id IN (",
        );
        let mut separated = query.separated(", ");
        for id in &stale_ids {
            separated.push_bind(*id);
        }
        query.push(")");
        query.build().execute(&self.pool).await?;

        Ok(stale_ids.len() as u64)
    }

    async fn queue_depth(&self) -> Result<QueueDepth> {
        let row = sqlx::query(
            "SELECT \
                COUNT(*) FILTER (WHERE status = 'pending') AS pending, \
                COUNT(*) FILTER (WHERE status = 'processing') AS processing, \
                COUNT(*) FILTER (WHERE status = 'failed') AS failed \
             FROM queue",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(QueueDepth {
            pending: row.get("pending"),
            processing: row.get("processing"),
            failed: row.get("failed"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkforge_parsing::{Chunk, ChunkDraft, ChunkKind};

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

    async fn temp_queue(max_retries: i32, stale_timeout: StdDuration) -> (SqliteChunkQueue, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("queue.db");
        let queue = SqliteChunkQueue::connect(&db_path, max_retries, stale_timeout)
            .await
            .expect("connect");
        (queue, dir)
    }

    #[tokio::test]
    async fn enqueue_and_dequeue_round_trip() {
        let (queue, _dir) = temp_queue(3, StdDuration::from_secs(300)).await;
        queue
            .enqueue(&[sample_chunk("fn a() {}"), sample_chunk("fn b() {}")])
            .await
            .unwrap();

        let items = queue.dequeue(10, 1234).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.status == QueueStatus::Processing));

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.processing, 2);
        assert_eq!(depth.pending, 0);
    }

    #[tokio::test]
    async fn dequeue_never_hands_out_the_same_item_twice() {
        let (queue, _dir) = temp_queue(3, StdDuration::from_secs(300)).await;
        queue
            .enqueue(&(0..5).map(|i| sample_chunk(&format!("fn f{i}() {{}}"))).collect::<Vec<_>>())
            .await
            .unwrap();

        let first = queue.dequeue(3, 1).await.unwrap();
        let second = queue.dequeue(3, 2).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
        let mut ids: Vec<i64> = first.iter().chain(second.iter()).map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn requeue_marks_failed_after_max_retries() {
        let (queue, _dir) = temp_queue(1, StdDuration::from_secs(300)).await;
        queue.enqueue(&[sample_chunk("fn a() {}")]).await.unwrap();
        let items = queue.dequeue(1, 1).await.unwrap();
        let id = items[0].id;

        queue.requeue(&[id]).await.unwrap();

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.failed, 1);
        assert_eq!(depth.pending, 0);
    }

    #[tokio::test]
    async fn requeue_returns_to_pending_below_max_retries() {
        let (queue, _dir) = temp_queue(5, StdDuration::from_secs(300)).await;
        queue.enqueue(&[sample_chunk("fn a() {}")]).await.unwrap();
        let items = queue.dequeue(1, 1).await.unwrap();
        let id = items[0].id;

        queue.requeue(&[id]).await.unwrap();

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.pending, 1);
        assert_eq!(depth.failed, 0);
    }

    #[tokio::test]
    async fn commit_removes_items() {
        let (queue, _dir) = temp_queue(3, StdDuration::from_secs(300)).await;
        queue.enqueue(&[sample_chunk("fn a() {}")]).await.unwrap();
        let items = queue.dequeue(1, 1).await.unwrap();

        queue.commit(&[items[0].id]).await.unwrap();

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.pending, 0);
        assert_eq!(depth.processing, 0);
        assert_eq!(depth.failed, 0);
    }

    #[tokio::test]
    async fn requeue_stale_tasks_recovers_dead_worker_items() {
        let (queue, _dir) = temp_queue(3, StdDuration::from_secs(300)).await;
        queue.enqueue(&[sample_chunk("fn a() {}")]).await.unwrap();
        // A pid essentially guaranteed not to exist on this host.
        queue.dequeue(1, 0xFFFF_FFF0).await.unwrap();

        let recovered = queue.requeue_stale_tasks().await.unwrap();
        assert_eq!(recovered, 1);

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.pending, 1);
        assert_eq!(depth.processing, 0);
    }

    #[tokio::test]
    async fn enqueue_completed_latch_round_trips() {
        let (queue, _dir) = temp_queue(3, StdDuration::from_secs(300)).await;
        assert!(!queue.is_enqueue_completed().await.unwrap());
        queue.mark_enqueue_completed().await.unwrap();
        assert!(queue.is_enqueue_completed().await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_rows_and_resets_latch() {
        let (queue, _dir) = temp_queue(3, StdDuration::from_secs(300)).await;
        queue.enqueue(&[sample_chunk("fn a() {}")]).await.unwrap();
        queue.mark_enqueue_completed().await.unwrap();

        queue.clear().await.unwrap();

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.pending, 0);
        assert!(!queue.is_enqueue_completed().await.unwrap());
    }
}
