//! Deadline-bounded generator invocation.

use crate::error::GenerationError;
use crate::generator::Generator;
use crate::types::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::AbortOnDropHandle;

/// Runs one generation call under a hard wall-clock deadline.
///
/// The call executes as its own tokio task and is raced against a timer.
/// Whatever happens (text, error, panic, hang) the caller gets exactly one
/// [`InvocationOutcome`] and never an `Err`. On timeout the task is aborted
/// and the invoker returns without waiting for it to wind down. The task is
/// also aborted if the `invoke` future itself is dropped.
#[derive(Debug, Clone)]
pub struct BoundedInvoker {
    generator: Arc<dyn Generator>,
    timeout: Duration,
}

impl BoundedInvoker {
    /// Create a new invoker
    pub fn new(generator: Arc<dyn Generator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Get the underlying generator
    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    /// Invoke the generator once. Must be called within a tokio runtime.
    pub async fn invoke(&self, req: GenerationRequest) -> InvocationOutcome {
        let request_id = req.request_id.clone();
        let generator = Arc::clone(&self.generator);
        let mut task =
            AbortOnDropHandle::new(tokio::spawn(async move { generator.generate(req).await }));

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(Ok(text))) => InvocationOutcome::Success(text),
            Ok(Ok(Err(err))) => {
                tracing::warn!(request_id = %request_id, error = %err, "generation failed");
                InvocationOutcome::DomainError(err.to_string())
            }
            Ok(Err(join_err)) => {
                let err = GenerationError::aborted(join_err.to_string());
                tracing::error!(request_id = %request_id, error = %err, "generation task died");
                InvocationOutcome::DomainError(err.to_string())
            }
            Err(_) => {
                task.abort();
                tracing::warn!(
                    request_id = %request_id,
                    timeout = ?self.timeout,
                    "generation timed out"
                );
                InvocationOutcome::Timeout
            }
        }
    }
}
