//! Core types for record enrichment.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Marker prefixed to every per-record failure written into a record.
pub const ERROR_PREFIX: &str = "Error: ";

/// Output written when a generation call misses its deadline.
pub const TIMEOUT_MESSAGE: &str = "Error: LLM processing timed out";

/// One unit of the stream: string keys, arbitrary JSON values.
pub type Record = serde_json::Map<String, Value>;

/// Generation options shared by every request of a configured filter.
pub type GenerationOptions = serde_json::Map<String, Value>;

/// A record together with its stream metadata.
///
/// `tag` and `timestamp` are opaque to the filter and passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub tag: String,
    pub timestamp: Value,
    pub record: Record,
}

impl Event {
    /// Create a new event
    pub fn new(tag: impl Into<String>, timestamp: Value, record: Record) -> Self {
        Self {
            tag: tag.into(),
            timestamp,
            record,
        }
    }
}

/// A single generation request.
///
/// `prompt` and `options` are shared across all requests of one filter,
/// `context` is the text extracted from the current record.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub request_id: String,
    pub prompt: Arc<str>,
    pub context: String,
    pub options: Arc<GenerationOptions>,
}

impl GenerationRequest {
    /// Create a new request with a fresh id
    pub fn new(
        prompt: Arc<str>,
        context: impl Into<String>,
        options: Arc<GenerationOptions>,
    ) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            prompt,
            context: context.into(),
            options,
        }
    }

    /// Convenience constructor with owned prompt and no options
    pub fn simple(prompt: &str, context: impl Into<String>) -> Self {
        Self::new(Arc::from(prompt), context, Arc::new(GenerationOptions::new()))
    }
}

/// Generator information
#[derive(Debug, Clone)]
pub struct GeneratorInfo {
    pub id: String,
    pub name: String,
    pub model: String,
    pub endpoint: String,
}

impl GeneratorInfo {
    /// Create generator info with no backing endpoint
    pub fn local(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model: String::new(),
            endpoint: String::new(),
        }
    }
}

/// Outcome class of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    DomainError,
    Timeout,
}

/// Tagged result of one invocation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The generator returned text within the deadline
    Success(String),
    /// The generator failed within the deadline
    DomainError(String),
    /// The deadline elapsed first
    Timeout,
}

impl InvocationOutcome {
    /// Get the outcome class
    pub fn kind(&self) -> OutcomeKind {
        match self {
            InvocationOutcome::Success(_) => OutcomeKind::Success,
            InvocationOutcome::DomainError(_) => OutcomeKind::DomainError,
            InvocationOutcome::Timeout => OutcomeKind::Timeout,
        }
    }

    /// Lower the outcome into the string written to the output field
    pub fn into_output(self) -> String {
        match self {
            InvocationOutcome::Success(text) => text,
            InvocationOutcome::DomainError(message) => format!("{ERROR_PREFIX}{message}"),
            InvocationOutcome::Timeout => TIMEOUT_MESSAGE.to_string(),
        }
    }
}

/// What the filter did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    /// Input field absent, record left untouched
    Unmodified,
    /// Output field written
    Modified(OutcomeKind),
}

impl FilterStatus {
    /// Whether the record was changed
    pub fn is_modified(&self) -> bool {
        matches!(self, FilterStatus::Modified(_))
    }
}
