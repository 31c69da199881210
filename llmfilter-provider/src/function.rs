//! Closure-backed generators.
//!
//! Useful for embedding a custom backend without writing a trait impl, and
//! for scripting backend behavior in tests.

use async_trait::async_trait;
use futures::future::BoxFuture;
use llmfilter_core::error::GenerationError;
use llmfilter_core::generator::Generator;
use llmfilter_core::types::*;
use std::future::Future;
use std::sync::Arc;

type AsyncFn =
    dyn Fn(GenerationRequest) -> BoxFuture<'static, Result<String, GenerationError>> + Send + Sync;

type BlockingFn = dyn Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync;

/// Generator backed by an async closure
pub struct FunctionGenerator {
    info: Arc<GeneratorInfo>,
    func: Arc<AsyncFn>,
}

impl FunctionGenerator {
    /// Create a new function generator
    pub fn new<F, Fut>(id: impl Into<String>, func: F) -> Self
    where
        F: Fn(GenerationRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, GenerationError>> + Send + 'static,
    {
        let id = id.into();
        Self {
            info: Arc::new(GeneratorInfo::local(id.clone(), id)),
            func: Arc::new(
                move |req: GenerationRequest| -> BoxFuture<'static, Result<String, GenerationError>> {
                    Box::pin(func(req))
                },
            ),
        }
    }
}

impl std::fmt::Debug for FunctionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionGenerator")
            .field("info", &self.info)
            .finish()
    }
}

#[async_trait]
impl Generator for FunctionGenerator {
    fn info(&self) -> Arc<GeneratorInfo> {
        self.info.clone()
    }

    async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
        (self.func)(req).await
    }
}

/// Generator backed by a synchronous, possibly blocking closure.
///
/// Each call runs on tokio's blocking pool. A call that outlives its
/// deadline keeps its thread until the closure returns.
pub struct BlockingGenerator {
    info: Arc<GeneratorInfo>,
    func: Arc<BlockingFn>,
}

impl BlockingGenerator {
    /// Create a new blocking generator
    pub fn new<F>(id: impl Into<String>, func: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync + 'static,
    {
        let id = id.into();
        Self {
            info: Arc::new(GeneratorInfo::local(id.clone(), id)),
            func: Arc::new(func),
        }
    }
}

impl std::fmt::Debug for BlockingGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingGenerator")
            .field("info", &self.info)
            .finish()
    }
}

#[async_trait]
impl Generator for BlockingGenerator {
    fn info(&self) -> Arc<GeneratorInfo> {
        self.info.clone()
    }

    async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
        let func = Arc::clone(&self.func);
        tokio::task::spawn_blocking(move || func(&req))
            .await
            .map_err(|e| GenerationError::aborted(e.to_string()))?
    }
}
