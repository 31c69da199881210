//! Layer trait and abstractions.
//!
//! Layers wrap a generator with cross-cutting concerns such as logging.
//! They compose statically while the filter is being built; the finished
//! filter holds a single type-erased generator.

use crate::error::GenerationError;
use crate::generator::Generator;
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Layer trait for wrapping generators.
pub trait Layer<G: Generator> {
    /// The type of the layered generator
    type LayeredGenerator: Generator;

    /// Wrap the inner generator with this layer
    fn layer(&self, inner: G) -> Self::LayeredGenerator;
}

/// Helper trait for layered generators.
///
/// Provides forwarding defaults so implementers only override what they
/// intercept.
#[async_trait]
pub trait LayeredGenerator: Sized + Generator {
    /// The inner generator type
    type Inner: Generator;

    /// Get a reference to the inner generator
    fn inner(&self) -> &Self::Inner;

    /// Default implementation for info - forwards to inner
    fn layered_info(&self) -> Arc<GeneratorInfo> {
        self.inner().info()
    }

    /// Default implementation for generate - forwards to inner
    async fn layered_generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
        self.inner().generate(req).await
    }
}
