//! Logging layer for generation calls.

use async_trait::async_trait;
use llmfilter_core::error::GenerationError;
use llmfilter_core::generator::Generator;
use llmfilter_core::layer::{Layer, LayeredGenerator};
use llmfilter_core::types::*;
use std::sync::Arc;

/// Logging layer that logs generation calls.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[llmfilter]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Generator> Layer<G> for LoggingLayer {
    type LayeredGenerator = LoggingGenerator<G>;

    fn layer(&self, inner: G) -> Self::LayeredGenerator {
        LoggingGenerator {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Generator wrapped with logging
#[derive(Debug)]
pub struct LoggingGenerator<G> {
    inner: G,
    prefix: String,
}

#[async_trait]
impl<G: Generator> LayeredGenerator for LoggingGenerator<G> {
    type Inner = G;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
        let request_id = req.request_id.clone();
        let info = self.inner.info();

        tracing::debug!(
            "{} generate request: id={}, generator={}, model={}, context_len={}",
            self.prefix,
            request_id,
            info.id,
            info.model,
            req.context.len()
        );

        let start = std::time::Instant::now();
        let result = self.inner.generate(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::debug!(
                    "{} generate success: id={}, output_len={}, elapsed={:?}",
                    self.prefix,
                    request_id,
                    text.len(),
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} generate error: id={}, error={}, elapsed={:?}",
                    self.prefix,
                    request_id,
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

#[async_trait]
impl<G: Generator> Generator for LoggingGenerator<G> {
    fn info(&self) -> Arc<GeneratorInfo> {
        LayeredGenerator::layered_info(self)
    }

    async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
        LayeredGenerator::layered_generate(self, req).await
    }
}
