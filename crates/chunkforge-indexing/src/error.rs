//! Error types for the indexer worker and pipeline orchestrator.

chunkforge_common::define_error_enum! {
    pub enum IndexingError {
        #[error("queue error: {0}")]
        Queue(String),
        #[error("backend error: {0}")]
        Backend(String),
        #[error("git error: {0}")]
        Git(String),
    }
}

chunkforge_common::impl_common_conversions!(IndexingError);

impl IndexingError {
    pub fn from_queue(err: chunkforge_queue::QueueError) -> Self {
        Self::Queue(err.to_string())
    }

    pub fn from_backend(err: chunkforge_backend::BackendError) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn from_git(err: chunkforge_git::GitError) -> Self {
        Self::Git(err.to_string())
    }
}
