//! Error types for the durable work queue.

chunkforge_common::define_error_enum! {
    pub enum QueueError {
        /// Local queue I/O failure; fatal for the current run (§7: `StorageError`).
        #[error("queue storage error: {0}")]
        Storage(String),
    }
}

chunkforge_common::impl_common_conversions!(QueueError, with_serde);

impl From<sqlx::Error> for QueueError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for QueueError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl QueueError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
