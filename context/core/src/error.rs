//! Error Types
//!
//! Every fallible operation in this crate returns one of the enums below.
//! Nothing is retried or swallowed locally: failover across hosts belongs to
//! the request layer that drives the context.

use thiserror::Error;

/// Invalid client identity, raised while constructing a context
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The application ID was missing or empty
    #[error("a search client requires an application ID")]
    MissingApplicationId,

    /// The API key was missing or empty
    #[error("a search client requires an API key")]
    MissingApiKey,
}

/// Failures of the pooled multiplexer
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The transport could not create a multiplexer
    #[error("failed to create multiplexer: {0}")]
    CreateFailed(String),

    /// The handle is already registered with the multiplexer
    #[error("request {0} is already registered")]
    AlreadyRegistered(String),

    /// The handle was never registered (or was already released)
    #[error("request {0} is not registered")]
    NotRegistered(String),
}

/// Failures while loading [`ContextSettings`](crate::settings::ContextSettings)
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read
    #[error("failed to read settings from {path}: {source}")]
    Io {
        /// Path that was being read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// No settings path could be determined for this platform
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
}

/// Umbrella error for callers that don't care which layer failed
#[derive(Debug, Error)]
pub enum ContextError {
    /// Identity validation failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The multiplexer failed
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Settings could not be loaded
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::MissingApplicationId.to_string(),
            "a search client requires an application ID"
        );
        assert_eq!(
            ConfigError::MissingApiKey.to_string(),
            "a search client requires an API key"
        );
    }

    #[test]
    fn test_context_error_is_transparent() {
        let err: ContextError = PoolError::NotRegistered("abc".to_string()).into();
        assert_eq!(err.to_string(), "request abc is not registered");
        assert!(matches!(err, ContextError::Pool(_)));
    }
}
