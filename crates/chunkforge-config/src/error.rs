//! Configuration error types.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A numeric field is outside its allowed range.
    #[error("value {value} is out of range for {field} (expected {min}-{max})")]
    OutOfRange {
        field: String,
        value: u64,
        min: u64,
        max: u64,
    },

    /// A required field was empty.
    #[error("missing required field: {field}")]
    MissingField { field: String },

    /// A port number was invalid.
    #[error("invalid port: {port}")]
    InvalidPort { port: u16 },

    /// Two or more mutually exclusive backend-auth modes were set at once.
    #[error("conflicting backend auth configuration: {0}")]
    ConflictingAuth(String),

    /// TOML parsing failure.
    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    /// IO failure while loading a config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all.
    #[error("configuration error: {message}")]
    Generic { message: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
