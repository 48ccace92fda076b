//! The Indexer Worker (C5) and Pipeline Orchestrator (C7): draining the
//! durable queue into the search backend, and composing the core per
//! repository end to end.

pub mod error;
pub mod factory;
pub mod orchestrator;
pub mod worker;

pub use error::IndexingError;
pub use factory::OrchestratorFactory;
pub use orchestrator::{PipelineOrchestrator, RepositoryRun, RunSummary};
pub use worker::{IndexerWorker, WorkerStats};
