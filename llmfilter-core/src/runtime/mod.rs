//! Runtime layer for llmfilter.
//!
//! This module sits between the host, which hands over records, and the
//! generator, which produces text. It is responsible for:
//! - Extracting the input field and building generation requests
//! - Bounding every generation call with the configured deadline
//! - Lowering each outcome into the output field

pub mod filter;
pub mod invoker;

pub use filter::{LlmFilter, LlmFilterBuilder};
pub use invoker::BoundedInvoker;
