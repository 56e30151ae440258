//! Error types for configuration loading.

use std::path::PathBuf;

/// Errors raised while loading or validating the CloudFauxnt configuration.
///
/// All of these are fatal at startup; none can occur while serving requests.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected schema.
    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The configuration parsed but failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The public key file could not be read.
    #[error("failed to read public key file {}: {source}", path.display())]
    KeyRead {
        /// Path of the key file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The public key material is not a usable RSA public key.
    #[error("failed to parse public key: {0}")]
    Key(String),
}

/// Convenience result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
