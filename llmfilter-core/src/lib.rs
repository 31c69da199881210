//! # llmfilter core
//!
//! Core abstractions and runtime for enriching stream records with
//! generated text.
//!
//! This crate provides the generator and layer traits, configuration
//! resolution and the deadline-bounded invocation engine. Backend
//! implementations live in `llmfilter-provider`.

pub mod config;
pub mod error;
pub mod generator;
pub mod layer;
pub mod runtime;
pub mod types;

// Re-exports
pub use config::{Backend, FilterConfig, FilterConfigBuilder};
pub use error::{ConfigError, GenerationError};
pub use generator::Generator;
pub use layer::{Layer, LayeredGenerator};
pub use runtime::{BoundedInvoker, LlmFilter, LlmFilterBuilder};
pub use types::*;
