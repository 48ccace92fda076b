//! Command-line surface over the indexing pipeline core. Everything the CLI
//! does, another embedding application (a server, an editor plugin) could do
//! just as well by calling `chunkforge_indexing` directly — this binary is
//! one concrete caller, not a special one.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Indexing pipeline CLI", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Directory for rotating log files (defaults to an OS-specific location).
    #[arg(long, global = true)]
    pub log_dir: Option<std::path::PathBuf>,

    /// TOML configuration file, layered beneath environment variables
    /// (defaults to `./chunkforge.toml` if present).
    #[arg(long, global = true)]
    pub config_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single indexing pass over a repository: plan, parse, enqueue,
    /// drain, advance the commit anchor.
    Index {
        /// Path to the repository's working directory (defaults to the current directory).
        #[arg(long, default_value = ".")]
        repo_path: std::path::PathBuf,

        /// Backend index name (defaults to the detected repository id).
        #[arg(long)]
        index_name: Option<String>,

        /// Drop the existing index and queue first, forcing a full re-index.
        #[arg(long)]
        clean: bool,
    },

    /// Run the indexer worker only, draining whatever is already queued for
    /// a repository without re-planning or re-parsing.
    Drain {
        /// Path to the repository's working directory (defaults to the current directory).
        #[arg(long, default_value = ".")]
        repo_path: std::path::PathBuf,

        /// Backend index name (defaults to the detected repository id).
        #[arg(long)]
        index_name: Option<String>,
    },
}
