//! The Parser Pool (C3): bounded concurrency across a batch of files.
//!
//! Each file is parsed on its own task, gated by a semaphore sized to
//! `cpuCores`. Results stream back to the caller in completion order, not
//! input order, so a slow file never blocks faster ones behind it.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::ParsingError;
use crate::extractor::{self, ExtractionMetrics};
use crate::model::Chunk;

/// One file queued for parsing.
#[derive(Debug, Clone)]
pub struct PoolFileInput {
    pub file_path: String,
    pub raw_bytes: Vec<u8>,
}

/// A single file's outcome, streamed back as soon as its task completes.
pub struct PoolFileResult {
    pub file_path: String,
    pub chunks: Result<Vec<Chunk>, ParsingError>,
}

/// Bounded-concurrency file parser.
pub struct ParserPool {
    cpu_cores: usize,
}

impl ParserPool {
    pub fn new(cpu_cores: usize) -> Self {
        Self {
            cpu_cores: cpu_cores.max(1),
        }
    }

    /// Parse every file in `files`, streaming each [`PoolFileResult`] to
    /// `sink` as it completes. Returns the run's aggregated
    /// [`ExtractionMetrics`] once every file has finished (or the sink has
    /// been dropped, in which case the pool stops early and drains the
    /// remaining in-flight tasks without reporting them).
    pub async fn run(
        &self,
        files: Vec<PoolFileInput>,
        git_branch: &str,
        max_chunk_size_bytes: usize,
        sink: mpsc::Sender<PoolFileResult>,
    ) -> ExtractionMetrics {
        let semaphore = Arc::new(Semaphore::new(self.cpu_cores));
        let mut join_set = JoinSet::new();

        for file in files {
            let semaphore = Arc::clone(&semaphore);
            let git_branch = git_branch.to_string();
            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("parser pool semaphore is never closed early");
                let PoolFileInput {
                    file_path,
                    raw_bytes,
                } = file;
                let result = extractor::extract(&raw_bytes, &file_path, &git_branch, max_chunk_size_bytes);
                (file_path, result)
            });
        }

        // `language` carries no meaning at the aggregate level; every
        // per-file outcome already reports its own.
        let mut aggregate = ExtractionMetrics::default();

        while let Some(joined) = join_set.join_next().await {
            let (file_path, result) = match joined {
                Ok(pair) => pair,
                Err(join_err) => {
                    warn!(error = %join_err, "parser pool task panicked");
                    aggregate.files_failed += 1;
                    continue;
                }
            };

            match result {
                Ok(outcome) => {
                    aggregate.files_processed += 1;
                    aggregate.chunks_created += outcome.metrics.chunks_created;
                    aggregate.chunks_skipped += outcome.metrics.chunks_skipped;
                    aggregate.chunk_sizes.extend(outcome.metrics.chunk_sizes);
                    let sent = sink
                        .send(PoolFileResult {
                            file_path,
                            chunks: Ok(outcome.chunks),
                        })
                        .await;
                    if sent.is_err() {
                        debug!("parser pool sink closed, draining remaining tasks silently");
                        break;
                    }
                }
                Err(err) => {
                    aggregate.files_failed += 1;
                    let sent = sink
                        .send(PoolFileResult {
                            file_path,
                            chunks: Err(err),
                        })
                        .await;
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }

        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn processes_every_file_and_reports_results() {
        let pool = ParserPool::new(2);
        let files = vec![
            PoolFileInput {
                file_path: "src/a.rs".to_string(),
                raw_bytes: b"fn a() {}\n".to_vec(),
            },
            PoolFileInput {
                file_path: "src/b.rs".to_string(),
                raw_bytes: b"fn b() {}\n".to_vec(),
            },
            PoolFileInput {
                file_path: "assets/logo.png".to_string(),
                raw_bytes: b"\x00\x01binary".to_vec(),
            },
        ];

        let (tx, mut rx) = mpsc::channel(8);
        let metrics = pool.run(files, "main", 1_000_000, tx).await;

        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }

        assert_eq!(results.len(), 3);
        assert_eq!(metrics.files_processed, 2);
        assert_eq!(metrics.files_failed, 1);
        assert!(
            results
                .iter()
                .any(|r| r.file_path == "assets/logo.png" && r.chunks.is_err())
        );
    }

    #[tokio::test]
    async fn respects_cpu_core_bound_without_deadlocking() {
        let pool = ParserPool::new(1);
        let files: Vec<PoolFileInput> = (0..5)
            .map(|i| PoolFileInput {
                file_path: format!("src/f{i}.rs"),
                raw_bytes: format!("fn f{i}() {{}}\n").into_bytes(),
            })
            .collect();

        let (tx, mut rx) = mpsc::channel(8);
        let metrics = pool.run(files, "main", 1_000_000, tx).await;

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 5);
        assert_eq!(metrics.files_processed, 5);
    }
}
