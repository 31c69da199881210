//! # llmfilter providers
//!
//! Generator implementations for llmfilter.

pub mod function;
pub mod ollama;
pub mod openai;

// Re-exports
pub use function::{BlockingGenerator, FunctionGenerator};
pub use ollama::{OllamaBuilder, OllamaGenerator};
pub use openai::{OpenAiBuilder, OpenAiGenerator};

use llmfilter_core::config::{Backend, FilterConfig};
use llmfilter_core::error::ConfigError;
use llmfilter_core::generator::Generator;

/// Construct the generator a configuration asks for.
///
/// The backend is contacted once to verify the model, so an unknown model
/// or an unreachable endpoint fails here rather than on the first record.
///
/// # Example
///
/// ```ignore
/// let config = FilterConfig::from_settings(settings)?;
/// let generator = llmfilter_provider::connect(&config).await?;
/// ```
pub async fn connect(config: &FilterConfig) -> Result<Box<dyn Generator>, ConfigError> {
    match config.backend {
        Backend::Ollama => {
            let generator = OllamaGenerator::builder()
                .base_url(&config.api_url)
                .model(&config.model_name)
                .connect()
                .await
                .map_err(|e| ConfigError::client(Backend::Ollama.as_str(), e))?;
            Ok(Box::new(generator))
        }
        Backend::OpenAi => {
            let ignored = openai::unsupported_options(&config.options);
            if !ignored.is_empty() {
                tracing::warn!(options = ?ignored, "options not supported by the openai backend are ignored");
            }

            let mut builder = OpenAiGenerator::builder()
                .api_base(&config.api_url)
                .model(&config.model_name);
            if let Some(api_key) = &config.api_key {
                builder = builder.api_key(api_key);
            }

            let generator = builder
                .connect()
                .await
                .map_err(|e| ConfigError::client(Backend::OpenAi.as_str(), e))?;
            Ok(Box::new(generator))
        }
    }
}
