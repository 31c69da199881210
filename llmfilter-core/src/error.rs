//! Error types for llmfilter.
//!
//! Two families exist and they never mix:
//! - [`ConfigError`] is fatal and only produced while building a filter.
//! - [`GenerationError`] is produced by a single generation call and is
//!   always absorbed by the invocation engine.

/// Errors raised by a single generation call.
///
/// The set is closed: backends map their failures onto one of these
/// variants, falling back to [`GenerationError::Other`] with the original
/// message.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend answered with a failure status
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// Model not found errors
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Backend answered but the payload was unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The generation task panicked or was cancelled
    #[error("Generation aborted: {0}")]
    Aborted(String),

    /// Anything else, carrying the original message
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Create a backend status error
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Create a model not found error
    pub fn model_not_found(model: impl Into<String>) -> Self {
        Self::ModelNotFound(model.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create an aborted error
    pub fn aborted(msg: impl Into<String>) -> Self {
        Self::Aborted(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<String> for GenerationError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GenerationError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// Startup-time configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `prompt` was missing or blank
    #[error("Configuration error: 'prompt' is required")]
    MissingPrompt,

    /// A setting name the filter does not know
    #[error(
        "Configuration error: unknown setting '{0}' (expected one of: {known})",
        known = crate::config::SETTING_KEYS.join(", ")
    )]
    UnknownSetting(String),

    /// A setting had a value that failed validation
    #[error("Configuration error: invalid value for '{key}': {message}")]
    InvalidSetting { key: String, message: String },

    /// `options_json` was not a JSON object
    #[error("Configuration error: invalid options_json: {0}")]
    InvalidOptions(String),

    /// The generation client could not be constructed
    #[error("Configuration error: failed to initialize {backend} client: {source}")]
    Client {
        backend: String,
        #[source]
        source: GenerationError,
    },
}

impl ConfigError {
    /// Create an invalid setting error
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an invalid options error
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    /// Create a client construction error
    pub fn client(backend: impl Into<String>, source: GenerationError) -> Self {
        Self::Client {
            backend: backend.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidOptions(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_keeps_original_message() {
        let err = GenerationError::from("model exploded");
        assert_eq!(err.to_string(), "model exploded");
    }

    #[test]
    fn test_backend_message() {
        let err = GenerationError::backend(500, "internal");
        assert_eq!(err.to_string(), "Backend returned 500: internal");
    }

    #[test]
    fn test_client_error_mentions_backend() {
        let err = ConfigError::client("ollama", GenerationError::model_not_found("nope"));
        let msg = err.to_string();
        assert!(msg.contains("ollama"));
        assert!(msg.contains("Model not found: nope"));
    }
}
