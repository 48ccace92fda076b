//! The injected search-backend client interface (C8): the core's only wire
//! dependency, plus the Commit Anchor (C6) operations it carries.

pub mod error;
pub mod mock;
pub mod traits;

pub use error::BackendError;
pub use mock::InMemoryBackend;
pub use traits::{BulkResult, FailedChunk, SearchBackendClient};
