//! # llmfilter
//!
//! Enrich log and event streams with generated text.
//!
//! For every record, llmfilter reads one field, sends it with a fixed prompt
//! to a text-generation backend and writes the answer into another field.
//! Each call is bounded by a deadline and every failure is turned into data,
//! so a slow or broken backend never stalls or crashes the pipeline.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! llmfilter = { version = "0.1", features = ["providers", "layers"] }
//! ```
//!
//! ```ignore
//! use llmfilter::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let filter = llmfilter::connect([
//!     ("prompt", "Tell me the main topic."),
//!     ("model_name", "llama3.2"),
//!     ("timeout", "10"),
//! ])
//! .await?;
//!
//! let mut record = Record::new();
//! record.insert("message".into(), "disk /dev/sda1 is 98% full".into());
//! filter.filter(&mut record).await;
//! println!("{}", record["llm_output"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: `providers`, `layers` and `cli`
//! - `providers`: Ollama, OpenAI-compatible and closure generators
//! - `layers`: Built-in generator layers (logging)
//! - `cli`: The `llmfilter` stdin/stdout host binary
//! - `full`: All features enabled

// Re-export core types and traits
pub use llmfilter_core::*;

// Re-export providers under `provider` module
#[cfg(feature = "llmfilter-provider")]
pub mod provider {
    //! Generator implementations.
    pub use llmfilter_provider::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "llmfilter-layer")]
pub mod layer {
    //! Built-in generator layers.
    pub use llmfilter_layer::*;
}

#[cfg(feature = "cli")]
pub mod host;

/// Build a ready-to-use filter from a flat settings bag.
///
/// Resolves the settings, connects to the configured backend (verifying the
/// model) and wraps the generator with logging. Every failure is a
/// [`ConfigError`] and should abort startup.
#[cfg(all(feature = "llmfilter-provider", feature = "llmfilter-layer"))]
pub async fn connect<I, K, V>(settings: I) -> std::result::Result<LlmFilter, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let config = FilterConfig::from_settings(settings)?;
    let generator = llmfilter_provider::connect(&config).await?;

    Ok(LlmFilter::builder(config, generator)
        .layer(llmfilter_layer::LoggingLayer::new())
        .finish())
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use llmfilter::prelude::*;
    //! ```

    pub use crate::{
        ConfigError, Event, FilterConfig, FilterStatus, GenerationError, GenerationRequest,
        Generator, InvocationOutcome, Layer, LlmFilter, OutcomeKind, Record,
    };

    #[cfg(feature = "llmfilter-provider")]
    pub use crate::provider::*;

    #[cfg(feature = "llmfilter-layer")]
    pub use crate::layer::*;
}
