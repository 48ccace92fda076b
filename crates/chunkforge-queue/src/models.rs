//! Domain models for the durable chunk queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`QueueItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    /// Eligible to be dequeued.
    Pending,
    /// Claimed by a worker; holds an implicit lease.
    Processing,
    /// Exhausted `MAX_RETRIES`; will not be dequeued again.
    Failed,
}

impl std::str::FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "failed" => Ok(Self::Failed),
            other => Err(format!("invalid queue status: {other}")),
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A durable envelope around one enqueued [`chunkforge_parsing::Chunk`].
///
/// The chunk itself is stored pre-serialized (`document`) so the queue has
/// no dependency on how the extractor evolves its own fields beyond the
/// serde contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    /// ISO-8601 timestamp shared by every item enqueued in the same batch.
    pub batch_id: String,
    /// JSON-serialized `Chunk`.
    pub document: String,
    pub status: QueueStatus,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub worker_pid: Option<i64>,
}

/// Gauge snapshot of queue contents by status, for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueDepth {
    pub pending: i64,
    pub processing: i64,
    pub failed: i64,
}
