//! Generator trait and core abstractions.

use crate::error::GenerationError;
use crate::types::*;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Core trait for text-generation backends.
///
/// A generator is built once, never mutated afterwards and called
/// concurrently from many records. Any serialization it needs is its own
/// business; callers hold it behind an `Arc` without locking.
#[async_trait]
pub trait Generator: Send + Sync + Debug + 'static {
    /// Get generator information
    fn info(&self) -> Arc<GeneratorInfo>;

    /// Generate text for one request.
    ///
    /// Implementations may fail and may take arbitrarily long. Bounding
    /// the call is the caller's job.
    async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError>;
}

#[async_trait]
impl Generator for Box<dyn Generator> {
    fn info(&self) -> Arc<GeneratorInfo> {
        (**self).info()
    }

    async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
        (**self).generate(req).await
    }
}
