//! The Durable Work Queue (C1): at-least-once delivery of chunks to a
//! single worker process on a single host, local to one (repository,
//! branch) pair.

pub mod error;
pub mod mock;
pub mod models;
pub mod sqlite_queue;
pub mod traits;

pub use error::QueueError;
pub use mock::InMemoryChunkQueue;
pub use models::{QueueDepth, QueueItem, QueueStatus};
pub use sqlite_queue::SqliteChunkQueue;
pub use traits::ChunkQueue;
