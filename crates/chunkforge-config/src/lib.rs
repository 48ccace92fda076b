//! Centralized configuration for the indexing pipeline core.
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants below)
//! 2. Environment variable overrides
//! 3. Runtime validation via [`validation::Validate`]

pub mod error;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};

use validation::Validate;

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

const DEFAULT_BATCH_SIZE: usize = 500;
const DEFAULT_MAX_QUEUE_SIZE: usize = 100_000;
const DEFAULT_MAX_CHUNK_SIZE_BYTES: usize = 1_000_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_STALE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 90;
const DEFAULT_QUEUE_BASE_DIR: &str = ".chunkforge/queues";

/// Parses an environment variable, returning `None` if it is unset or fails
/// to parse (rather than falling back to a default), so callers can tell
/// "not overridden" apart from "overridden with this value".
fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Top-level configuration for the indexing pipeline core.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    /// Durable work queue (C1) configuration.
    pub queue: QueueConfig,
    /// Language extractor (C2) configuration.
    pub extractor: ExtractorConfig,
    /// Parser pool (C3) configuration.
    pub parser_pool: ParserPoolConfig,
    /// Indexer worker (C5) configuration.
    pub indexer: IndexerConfig,
    /// Search backend authentication (C8, external).
    pub backend: BackendConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables with safe defaults.
    pub fn from_env() -> Self {
        let mut config = Self::defaults();
        config.apply_env_overrides();
        config
    }

    pub(crate) fn defaults() -> Self {
        Self {
            queue: QueueConfig::defaults(),
            extractor: ExtractorConfig::defaults(),
            parser_pool: ParserPoolConfig::defaults(),
            indexer: IndexerConfig::defaults(),
            backend: BackendConfig::defaults(),
        }
    }

    /// Overwrite fields whose corresponding environment variable is
    /// actually set, leaving everything else (e.g. values a lower-priority
    /// `ConfigurationSource` already loaded) untouched.
    pub(crate) fn apply_env_overrides(&mut self) {
        self.queue.apply_env_overrides();
        self.extractor.apply_env_overrides();
        self.parser_pool.apply_env_overrides();
        self.indexer.apply_env_overrides();
        self.backend.apply_env_overrides();
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.queue.validate()?;
        self.extractor.validate()?;
        self.parser_pool.validate()?;
        self.indexer.validate()?;
        self.backend.validate()?;

        if self.queue.stale_timeout.as_secs() <= self.indexer.transport_timeout.as_secs() {
            return Err(ConfigError::Generic {
                message: format!(
                    "stale_timeout ({:?}) must exceed transport_timeout ({:?})",
                    self.queue.stale_timeout, self.indexer.transport_timeout
                ),
            });
        }

        Ok(())
    }
}

/// Durable work queue configuration (C1).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QueueConfig {
    /// Root directory containing one subdirectory per (repository, branch)
    /// queue store. Corresponds to `QUEUE_BASE_DIR`.
    pub base_dir: std::path::PathBuf,
    /// Optional single-repository override. Corresponds to `QUEUE_DIR`.
    pub queue_dir: Option<std::path::PathBuf>,
    /// Advisory soft cap on queue depth (`MAX_QUEUE_SIZE`).
    pub max_queue_size: usize,
    /// Number of requeue attempts before an item is parked in `failed`.
    pub max_retries: u32,
    /// How long a `processing` lease may be held before it is considered stale.
    #[serde(with = "duration_secs")]
    pub stale_timeout: std::time::Duration,
    /// How long the worker sleeps between empty dequeues in watch mode.
    #[serde(with = "duration_secs")]
    pub poll_interval: std::time::Duration,
}

impl QueueConfig {
    fn defaults() -> Self {
        Self {
            base_dir: std::path::PathBuf::from(DEFAULT_QUEUE_BASE_DIR),
            queue_dir: None,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            stale_timeout: std::time::Duration::from_secs(DEFAULT_STALE_TIMEOUT_SECS),
            poll_interval: std::time::Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    fn from_env() -> Self {
        let mut config = Self::defaults();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env::<std::path::PathBuf>("QUEUE_BASE_DIR") {
            self.base_dir = v;
        }
        if let Some(v) = parse_env::<std::path::PathBuf>("QUEUE_DIR") {
            self.queue_dir = Some(v);
        }
        if let Some(v) = parse_env("MAX_QUEUE_SIZE") {
            self.max_queue_size = v;
        }
        if let Some(v) = parse_env("MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = parse_env::<u64>("STALE_TIMEOUT_SECS") {
            self.stale_timeout = std::time::Duration::from_secs(v);
        }
        if let Some(v) = parse_env::<u64>("POLL_INTERVAL_SECS") {
            self.poll_interval = std::time::Duration::from_secs(v);
        }
    }

    /// Resolve the queue store path for a given repository identifier and
    /// branch, honoring a single-repo `QUEUE_DIR` override when present.
    pub fn store_path(&self, repository_id: &str, branch: &str) -> std::path::PathBuf {
        if let Some(dir) = &self.queue_dir {
            return dir.join("queue.db");
        }
        let safe_repo = repository_id.replace(['/', ':'], "_");
        self.base_dir.join(safe_repo).join(branch).join("queue.db")
    }
}

impl Validate for QueueConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.max_queue_size as u64, 1, 10_000_000, "max_queue_size")?;
        validation::validate_range(u64::from(self.max_retries), 0, 100, "max_retries")?;
        Ok(())
    }
}

/// Language extractor configuration (C2).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExtractorConfig {
    /// Chunks larger than this many bytes are dropped and counted as skipped.
    pub max_chunk_size_bytes: usize,
    /// When non-empty, restricts extraction to this subset of registered
    /// languages (`SEMANTIC_CODE_INDEXER_LANGUAGES`).
    pub enabled_languages: Vec<String>,
}

impl ExtractorConfig {
    fn defaults() -> Self {
        Self {
            max_chunk_size_bytes: DEFAULT_MAX_CHUNK_SIZE_BYTES,
            enabled_languages: Vec::new(),
        }
    }

    fn from_env() -> Self {
        let mut config = Self::defaults();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env("MAX_CHUNK_SIZE_BYTES") {
            self.max_chunk_size_bytes = v;
        }
        if let Ok(v) = std::env::var("SEMANTIC_CODE_INDEXER_LANGUAGES") {
            self.enabled_languages = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }
}

impl Validate for ExtractorConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(
            self.max_chunk_size_bytes as u64,
            1,
            1_000_000_000,
            "max_chunk_size_bytes",
        )
    }
}

/// Parser pool configuration (C3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParserPoolConfig {
    /// Number of concurrent parse workers (`CPU_CORES`).
    pub cpu_cores: usize,
}

impl ParserPoolConfig {
    fn default_cores() -> usize {
        (std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(2)
            .max(2)
            / 2)
        .max(1)
    }

    fn defaults() -> Self {
        Self {
            cpu_cores: Self::default_cores(),
        }
    }

    fn from_env() -> Self {
        let mut config = Self::defaults();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env("CPU_CORES") {
            self.cpu_cores = v;
        }
    }
}

impl Validate for ParserPoolConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.cpu_cores as u64, 1, 1024, "cpu_cores")
    }
}

/// Indexer worker configuration (C5).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexerConfig {
    /// Bulk batch size sent to the search backend per request (`BATCH_SIZE`).
    pub batch_size: usize,
    /// Maximum number of in-flight bulk batches.
    pub concurrency: usize,
    /// Per-request transport timeout; a timeout is treated as a batch failure.
    #[serde(with = "duration_secs")]
    pub transport_timeout: std::time::Duration,
}

impl IndexerConfig {
    fn defaults() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            transport_timeout: std::time::Duration::from_secs(DEFAULT_TRANSPORT_TIMEOUT_SECS),
        }
    }

    fn from_env() -> Self {
        let mut config = Self::defaults();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env("BATCH_SIZE") {
            self.batch_size = v;
        }
        if let Some(v) = parse_env("INDEXER_CONCURRENCY") {
            self.concurrency = v;
        }
        if let Some(v) = parse_env::<u64>("TRANSPORT_TIMEOUT_SECS") {
            self.transport_timeout = std::time::Duration::from_secs(v);
        }
    }
}

impl Validate for IndexerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.batch_size as u64, 1, 100_000, "batch_size")?;
        validation::validate_range(self.concurrency as u64, 1, 1024, "concurrency")?;
        Ok(())
    }
}

/// Search backend authentication mode (C8, external collaborator).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum BackendAuth {
    /// Hosted cloud id + API key.
    CloudId { cloud_id: String, api_key: String },
    /// Self-hosted endpoint + API key.
    Endpoint { endpoint: String, api_key: String },
    /// Self-hosted endpoint + basic auth credentials.
    EndpointUserPass {
        endpoint: String,
        username: String,
        password: String,
    },
    /// No auth configured yet; only valid until the orchestrator actually
    /// needs to reach the backend.
    Unconfigured,
}

/// Search backend connection configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BackendConfig {
    pub auth: BackendAuth,
}

impl BackendConfig {
    fn defaults() -> Self {
        Self {
            auth: BackendAuth::Unconfigured,
        }
    }

    fn from_env() -> Self {
        let mut config = Self::defaults();
        config.apply_env_overrides();
        config
    }

    /// Only recomputes `auth` when at least one `BACKEND_*` variable is
    /// actually set, so that layering this over a config already populated
    /// by another source (e.g. a TOML file) leaves it alone when the
    /// environment says nothing about backend auth.
    fn apply_env_overrides(&mut self) {
        let cloud_id = std::env::var("BACKEND_CLOUD_ID").ok();
        let endpoint = std::env::var("BACKEND_ENDPOINT").ok();
        let api_key = std::env::var("BACKEND_API_KEY").ok();
        let username = std::env::var("BACKEND_USERNAME").ok();
        let password = std::env::var("BACKEND_PASSWORD").ok();

        if cloud_id.is_none()
            && endpoint.is_none()
            && api_key.is_none()
            && username.is_none()
            && password.is_none()
        {
            return;
        }

        self.auth = match (cloud_id, endpoint, api_key, username, password) {
            (Some(cloud_id), _, Some(api_key), _, _) => BackendAuth::CloudId { cloud_id, api_key },
            (None, Some(endpoint), Some(api_key), _, _) => {
                BackendAuth::Endpoint { endpoint, api_key }
            }
            (None, Some(endpoint), None, Some(username), Some(password)) => {
                BackendAuth::EndpointUserPass {
                    endpoint,
                    username,
                    password,
                }
            }
            _ => BackendAuth::Unconfigured,
        };
    }
}

impl Validate for BackendConfig {
    fn validate(&self) -> ConfigResult<()> {
        match &self.auth {
            BackendAuth::Unconfigured => Err(ConfigError::MissingField {
                field: "backend auth (cloud-id+api-key, endpoint+api-key, or endpoint+user/pass)"
                    .to_string(),
            }),
            BackendAuth::CloudId { cloud_id, api_key } => {
                validation::validate_non_empty(cloud_id, "backend.cloud_id")?;
                validation::validate_non_empty(api_key, "backend.api_key")
            }
            BackendAuth::Endpoint { endpoint, api_key } => {
                validation::validate_non_empty(endpoint, "backend.endpoint")?;
                validation::validate_non_empty(api_key, "backend.api_key")
            }
            BackendAuth::EndpointUserPass {
                endpoint,
                username,
                password,
            } => {
                validation::validate_non_empty(endpoint, "backend.endpoint")?;
                validation::validate_non_empty(username, "backend.username")?;
                validation::validate_non_empty(password, "backend.password")
            }
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_backend_env() {
        for key in [
            "BACKEND_CLOUD_ID",
            "BACKEND_ENDPOINT",
            "BACKEND_API_KEY",
            "BACKEND_USERNAME",
            "BACKEND_PASSWORD",
        ] {
            // SAFETY: test-only, single-threaded-per-test env mutation.
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn defaults_are_sane() {
        clear_backend_env();
        let config = PipelineConfig::from_env();
        assert_eq!(config.indexer.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(
            config.extractor.max_chunk_size_bytes,
            DEFAULT_MAX_CHUNK_SIZE_BYTES
        );
        assert_eq!(config.queue.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn validate_rejects_missing_backend_auth() {
        clear_backend_env();
        let config = PipelineConfig::from_env();
        let result = config.validate();
        assert!(result.is_err());
    }

    #[test]
    fn validate_accepts_endpoint_and_api_key() {
        clear_backend_env();
        // SAFETY: test-only env mutation, scoped to this test.
        unsafe {
            std::env::set_var("BACKEND_ENDPOINT", "https://search.example.com");
            std::env::set_var("BACKEND_API_KEY", "secret");
        }
        let config = PipelineConfig::from_env();
        assert!(config.validate().is_ok());
        clear_backend_env();
    }

    #[test]
    fn stale_timeout_must_exceed_transport_timeout() {
        clear_backend_env();
        // SAFETY: test-only env mutation, scoped to this test.
        unsafe {
            std::env::set_var("BACKEND_ENDPOINT", "https://search.example.com");
            std::env::set_var("BACKEND_API_KEY", "secret");
            std::env::set_var("STALE_TIMEOUT_SECS", "10");
            std::env::set_var("TRANSPORT_TIMEOUT_SECS", "90");
        }
        let config = PipelineConfig::from_env();
        assert!(config.validate().is_err());
        // SAFETY: test-only env mutation, scoped to this test.
        unsafe {
            std::env::remove_var("STALE_TIMEOUT_SECS");
            std::env::remove_var("TRANSPORT_TIMEOUT_SECS");
        }
        clear_backend_env();
    }

    #[test]
    fn store_path_uses_repo_and_branch() {
        let config = QueueConfig::from_env();
        let path = config.store_path("github.com/acme/widgets", "main");
        assert!(path.ends_with("github.com_acme_widgets/main/queue.db"));
    }
}
