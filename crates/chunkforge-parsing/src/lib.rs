//! The Language Extractor and Parser Pool: turns files into [`model::Chunk`]s.

pub mod binary;
pub mod error;
pub mod extractor;
pub mod hashing;
pub mod languages;
pub mod model;
pub mod pool;

pub use error::ParsingError;
pub use extractor::{extract, ExtractionMetrics, ExtractionOutcome};
pub use model::{Chunk, ChunkDraft, ChunkKind, Export, ExportKind, Import, ImportKind, Symbol};
pub use pool::{ParserPool, PoolFileResult};
