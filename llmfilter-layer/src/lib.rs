//! # llmfilter layers
//!
//! Built-in layers for llmfilter generators.
//!
//! Currently implemented layers:
//! - `LoggingLayer`: Logs every generation call with timing information
//!
//! ## Usage
//!
//! ```ignore
//! use llmfilter_core::LlmFilter;
//! use llmfilter_layer::LoggingLayer;
//!
//! let filter = LlmFilter::builder(config, generator)
//!     .layer(LoggingLayer::new())
//!     .finish();
//! ```

pub mod logging;

// Re-exports
pub use logging::LoggingLayer;
