//! CLI entry point wiring the indexing pipeline core together for local use.
//!
//! Building a real search backend is out of scope for this core (it is
//! consumed as an external collaborator behind `SearchBackendClient`), so
//! this binary wires the in-memory backend and is meant for local runs and
//! smoke-testing the pipeline end to end, not production query serving.

mod cli;
mod logging;

use std::sync::Arc;

use chunkforge_backend::{InMemoryBackend, SearchBackendClient};
use chunkforge_config::source::{ConfigurationLoader, EnvironmentSource, TomlFileSource};
use chunkforge_git::RepositoryContext;
use chunkforge_indexing::{IndexerWorker, OrchestratorFactory, RepositoryRun};
use chunkforge_queue::SqliteChunkQueue;
use clap::Parser;
use cli::{Args, Command};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chunkforge_common::init::initialize_environment();

    let args = Args::parse();
    let log_dir = args.log_dir.clone().unwrap_or_else(logging::default_log_dir);
    let _guards = logging::init(&log_dir)?;

    let config = load_config(args.config_file.clone())?;
    let factory = OrchestratorFactory::new(config);

    match args.command {
        Command::Index { repo_path, index_name, clean } => run_index(&factory, repo_path, index_name, clean).await,
        Command::Drain { repo_path, index_name } => run_drain(&factory, repo_path, index_name).await,
    }
}

/// Assembles the layered configuration: an optional TOML file (explicit
/// `--config-file`, or `./chunkforge.toml` if present) underneath process
/// environment variables, which take precedence.
fn load_config(config_file: Option<std::path::PathBuf>) -> anyhow::Result<chunkforge_config::PipelineConfig> {
    let toml_path = config_file.or_else(|| {
        let default = std::path::PathBuf::from("chunkforge.toml");
        default.exists().then_some(default)
    });

    let mut loader = ConfigurationLoader::new();
    if let Some(path) = toml_path {
        info!(path = %path.display(), "loading configuration file");
        loader = loader.add_source(Box::new(TomlFileSource::new(path)));
    }
    loader = loader.add_source(Box::new(EnvironmentSource));

    Ok(loader.load()?)
}

async fn run_index(
    factory: &OrchestratorFactory,
    repo_path: std::path::PathBuf,
    index_name: Option<String>,
    clean: bool,
) -> anyhow::Result<()> {
    let ctx = RepositoryContext::detect(&repo_path)?;
    let index_name = index_name.unwrap_or_else(|| ctx.repository_id.clone());

    let backend: Arc<dyn SearchBackendClient> = Arc::new(InMemoryBackend::new());
    let orchestrator = factory
        .orchestrator_with_sqlite_queue(&ctx.repository_id, &ctx.branch, backend)
        .await?;

    info!(repository_id = ctx.repository_id, branch = ctx.branch, index_name, "starting indexing run");

    let run = RepositoryRun { repo_path, index_name, clean };
    let summary = orchestrator.run(&run).await?;

    info!(
        index_only = summary.plan.index_only,
        delete_only = summary.plan.delete_only,
        delete_and_index = summary.plan.delete_and_index,
        chunks_committed = summary.worker.chunks_committed,
        chunks_requeued = summary.worker.chunks_requeued,
        anchor_advanced = summary.anchor_advanced,
        "indexing run complete"
    );

    Ok(())
}

async fn run_drain(
    factory: &OrchestratorFactory,
    repo_path: std::path::PathBuf,
    index_name: Option<String>,
) -> anyhow::Result<()> {
    let ctx = RepositoryContext::detect(&repo_path)?;
    let index_name = index_name.unwrap_or_else(|| ctx.repository_id.clone());
    let config = factory.config();

    let store_path = config.queue.store_path(&ctx.repository_id, &ctx.branch);
    let queue = Arc::new(
        SqliteChunkQueue::connect(&store_path, config.queue.max_retries as i32, config.queue.stale_timeout).await?,
    );
    let backend: Arc<dyn SearchBackendClient> = Arc::new(InMemoryBackend::new());

    let worker = IndexerWorker::new(
        queue,
        backend,
        index_name,
        config.indexer.batch_size,
        config.indexer.concurrency,
        config.queue.poll_interval,
        false,
    );

    let stats = worker.run().await?;
    info!(
        chunks_committed = stats.chunks_committed,
        chunks_requeued = stats.chunks_requeued,
        batches_succeeded = stats.batches_succeeded,
        batches_failed = stats.batches_failed,
        "drain complete"
    );

    Ok(())
}
