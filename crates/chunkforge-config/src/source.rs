//! Configuration source loading and composition.

use crate::validation::Validate;
use crate::{ConfigResult, PipelineConfig};
use std::path::Path;

/// A source that can produce a [`PipelineConfig`].
pub trait ConfigurationSource {
    /// Load configuration from this source standalone.
    ///
    /// # Errors
    /// Returns a [`crate::ConfigError`] if the source exists but cannot be
    /// parsed.
    fn load(&self) -> ConfigResult<PipelineConfig>;

    /// Apply this source onto a configuration a lower-priority source may
    /// have already populated. Sources that hold a complete, self-contained
    /// configuration (e.g. a TOML file) replace it wholesale; sources that
    /// represent sparse overrides (e.g. the environment) should override
    /// `ConfigurationSource::apply_overrides` to merge field-by-field
    /// instead, so a higher-priority source only clobbers the fields it
    /// actually has an opinion on.
    ///
    /// # Errors
    /// Returns a [`crate::ConfigError`] if the source exists but cannot be
    /// parsed.
    fn apply_overrides(&self, config: &mut PipelineConfig) -> ConfigResult<()> {
        *config = self.load()?;
        Ok(())
    }

    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Priority of this source; higher wins when sources conflict.
    fn priority(&self) -> u8;
}

/// Loads configuration from process environment variables.
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn load(&self) -> ConfigResult<PipelineConfig> {
        Ok(PipelineConfig::from_env())
    }

    fn apply_overrides(&self, config: &mut PipelineConfig) -> ConfigResult<()> {
        config.apply_env_overrides();
        Ok(())
    }

    fn name(&self) -> &str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100
    }
}

/// Loads configuration from a TOML file on disk.
pub struct TomlFileSource {
    path: std::path::PathBuf,
}

impl TomlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for TomlFileSource {
    fn load(&self) -> ConfigResult<PipelineConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    fn name(&self) -> &str {
        "toml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Combines multiple [`ConfigurationSource`]s, applying them in priority
/// order (lowest first) so the highest-priority source wins, then validates
/// the merged result.
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Load and validate configuration from all registered sources,
    /// applying them lowest-priority first so each higher-priority source
    /// layers its overrides onto what the previous ones already populated
    /// (e.g. `EnvironmentSource` over `TomlFileSource`) rather than
    /// replacing the whole configuration.
    ///
    /// # Errors
    /// Returns a [`crate::ConfigError`] if the merged configuration fails
    /// validation.
    pub fn load(&self) -> ConfigResult<PipelineConfig> {
        let mut config = PipelineConfig::defaults();

        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            match source.apply_overrides(&mut config) {
                Ok(()) => {
                    tracing::debug!(source = source.name(), "applied configuration source");
                }
                Err(err) => {
                    tracing::warn!(source = source.name(), error = %err, "failed to load configuration source");
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}
