//! LlmFilter implementation.
//!
//! The filter reads one field of a record, runs the configured generator
//! on it under a deadline, and writes the lowered outcome into another
//! field. It is the only place records are touched.

use crate::config::FilterConfig;
use crate::generator::Generator;
use crate::layer::Layer;
use crate::runtime::invoker::BoundedInvoker;
use crate::types::*;
use serde_json::Value;
use std::sync::Arc;

/// Builder for composing a filter from a configuration and a generator.
///
/// Layers wrap the generator with static dispatch; `finish` erases the
/// resulting type once.
///
/// # Example
///
/// ```ignore
/// let filter = LlmFilter::builder(config, ollama_generator)
///     .layer(LoggingLayer::new())
///     .finish();
/// ```
pub struct LlmFilterBuilder<G> {
    config: FilterConfig,
    generator: G,
}

impl<G: Generator> LlmFilterBuilder<G> {
    /// Create a new builder
    pub fn new(config: FilterConfig, generator: G) -> Self {
        Self { config, generator }
    }

    /// Add a layer to wrap the generator
    pub fn layer<L>(self, layer: L) -> LlmFilterBuilder<L::LayeredGenerator>
    where
        L: Layer<G>,
    {
        LlmFilterBuilder {
            config: self.config,
            generator: layer.layer(self.generator),
        }
    }

    /// Finish building and create an LlmFilter
    pub fn finish(self) -> LlmFilter {
        let generator: Arc<dyn Generator> = Arc::new(self.generator);
        let info = generator.info();

        tracing::info!(
            generator = %info.id,
            model = %info.model,
            endpoint = %info.endpoint,
            input_field = %self.config.input_field,
            output_field = %self.config.output_field,
            timeout = ?self.config.timeout,
            "llm filter ready"
        );

        LlmFilter {
            invoker: BoundedInvoker::new(generator, self.config.timeout),
            config: self.config,
        }
    }
}

/// Record enrichment filter.
///
/// Holds the configuration and the generator for its whole lifetime. Both
/// are read-only, so one filter can serve concurrent callers through a
/// shared reference.
#[derive(Debug, Clone)]
pub struct LlmFilter {
    config: FilterConfig,
    invoker: BoundedInvoker,
}

impl LlmFilter {
    /// Create a new builder
    pub fn builder<G: Generator>(config: FilterConfig, generator: G) -> LlmFilterBuilder<G> {
        LlmFilterBuilder::new(config, generator)
    }

    /// Get the configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Get generator information
    pub fn info(&self) -> Arc<GeneratorInfo> {
        self.invoker.generator().info()
    }

    /// Enrich one record in place.
    ///
    /// If the input field is absent (or `null`) the record is left exactly as
    /// it was. Otherwise the output field is set to the generated text or to
    /// an `"Error: "` marker. Never fails.
    pub async fn filter(&self, record: &mut Record) -> FilterStatus {
        let Some(context) = record.get(&self.config.input_field).and_then(context_text) else {
            tracing::trace!(field = %self.config.input_field, "input field absent, passing through");
            return FilterStatus::Unmodified;
        };

        let req = GenerationRequest::new(
            Arc::clone(&self.config.prompt),
            context,
            Arc::clone(&self.config.options),
        );
        let outcome = self.invoker.invoke(req).await;
        let kind = outcome.kind();

        record.insert(
            self.config.output_field.clone(),
            Value::String(outcome.into_output()),
        );

        FilterStatus::Modified(kind)
    }

    /// Enrich the record of an event, passing tag and timestamp through.
    pub async fn filter_event(&self, mut event: Event) -> (FilterStatus, Event) {
        let status = self.filter(&mut event.record).await;
        (status, event)
    }
}

/// Textual form of an input value. Strings are taken verbatim, other
/// values as compact JSON. `null` counts as absent.
fn context_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::layer::LayeredGenerator;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Echoes prompt and context back, or fails when the context says so.
    #[derive(Debug, Default)]
    struct Echo {
        seen: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl Generator for Echo {
        fn info(&self) -> Arc<GeneratorInfo> {
            Arc::new(GeneratorInfo::local("echo", "Echo"))
        }

        async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(req.clone());
            match req.context.as_str() {
                "fail" => Err(GenerationError::other("backend said no")),
                "hang" => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(String::new())
                }
                ctx => Ok(format!("{} | {}", req.prompt, ctx)),
            }
        }
    }

    fn config() -> FilterConfig {
        FilterConfig::builder()
            .prompt("Tell me the main topic.")
            .options_json(r#"{"temperature": 0}"#)
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap()
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_missing_input_passes_through() {
        let filter = LlmFilter::builder(config(), Echo::default()).finish();
        let original = record(json!({"other_field": "x", "n": 1}));
        let mut rec = original.clone();

        let status = filter.filter(&mut rec).await;

        assert_eq!(status, FilterStatus::Unmodified);
        assert_eq!(rec, original);
    }

    #[tokio::test]
    async fn test_null_input_passes_through() {
        let filter = LlmFilter::builder(config(), Echo::default()).finish();
        let original = record(json!({"message": null}));
        let mut rec = original.clone();

        assert_eq!(filter.filter(&mut rec).await, FilterStatus::Unmodified);
        assert_eq!(rec, original);
    }

    #[tokio::test]
    async fn test_success_writes_output_only() {
        let filter = LlmFilter::builder(config(), Echo::default()).finish();
        let mut rec = record(json!({"message": "disk full", "host": "web-1"}));

        let status = filter.filter(&mut rec).await;

        assert_eq!(status, FilterStatus::Modified(OutcomeKind::Success));
        assert_eq!(rec["message"], "disk full");
        assert_eq!(rec["host"], "web-1");
        assert_eq!(rec["llm_output"], "Tell me the main topic. | disk full");
        assert_eq!(rec.len(), 3);
    }

    #[tokio::test]
    async fn test_request_carries_config() {
        let echo = Arc::new(Echo::default());
        let filter = LlmFilter::builder(config(), Shared(echo.clone())).finish();
        let mut rec = record(json!({"message": "hello"}));

        filter.filter(&mut rec).await;

        let seen = echo.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(&*seen[0].prompt, "Tell me the main topic.");
        assert_eq!(seen[0].context, "hello");
        assert_eq!(seen[0].options["temperature"], 0);
    }

    #[tokio::test]
    async fn test_non_string_input_is_coerced() {
        let echo = Arc::new(Echo::default());
        let filter = LlmFilter::builder(config(), Shared(echo.clone())).finish();
        let mut rec = record(json!({"message": {"code": 42, "ok": false}}));

        filter.filter(&mut rec).await;

        assert_eq!(echo.seen.lock().unwrap()[0].context, r#"{"code":42,"ok":false}"#);
    }

    #[tokio::test]
    async fn test_domain_error_marker() {
        let filter = LlmFilter::builder(config(), Echo::default()).finish();
        let mut rec = record(json!({"message": "fail"}));

        let status = filter.filter(&mut rec).await;

        assert_eq!(status, FilterStatus::Modified(OutcomeKind::DomainError));
        assert_eq!(rec["llm_output"], "Error: backend said no");
        assert_eq!(rec["message"], "fail");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_marker() {
        let filter = LlmFilter::builder(config(), Echo::default()).finish();
        let mut rec = record(json!({"message": "hang"}));

        let status = filter.filter(&mut rec).await;

        assert_eq!(status, FilterStatus::Modified(OutcomeKind::Timeout));
        assert_eq!(rec["llm_output"], "Error: LLM processing timed out");
    }

    #[tokio::test]
    async fn test_existing_output_is_overwritten() {
        let filter = LlmFilter::builder(config(), Echo::default()).finish();
        let mut rec = record(json!({"message": "m", "llm_output": "stale"}));

        filter.filter(&mut rec).await;

        assert_eq!(rec["llm_output"], "Tell me the main topic. | m");
        assert_eq!(rec.len(), 2);
    }

    #[tokio::test]
    async fn test_event_metadata_passes_through() {
        let filter = LlmFilter::builder(config(), Echo::default()).finish();
        let event = Event::new("app.log", json!(1700000000.25), record(json!({"message": "m"})));

        let (status, out) = filter.filter_event(event).await;

        assert!(status.is_modified());
        assert_eq!(out.tag, "app.log");
        assert_eq!(out.timestamp, json!(1700000000.25));
        assert!(out.record.contains_key("llm_output"));
    }

    #[tokio::test]
    async fn test_layer_wraps_generator() {
        let filter = LlmFilter::builder(config(), Echo::default())
            .layer(Suffix("!"))
            .finish();
        let mut rec = record(json!({"message": "m"}));

        filter.filter(&mut rec).await;

        assert_eq!(rec["llm_output"], "Tell me the main topic. | m!");
        assert_eq!(filter.info().id, "echo");
    }

    /// Lets a test keep a handle on the generator it hands to the filter.
    #[derive(Debug)]
    struct Shared(Arc<Echo>);

    #[async_trait]
    impl Generator for Shared {
        fn info(&self) -> Arc<GeneratorInfo> {
            self.0.info()
        }

        async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
            self.0.generate(req).await
        }
    }

    struct Suffix(&'static str);

    #[derive(Debug)]
    struct SuffixGenerator<G> {
        inner: G,
        suffix: &'static str,
    }

    impl<G: Generator> Layer<G> for Suffix {
        type LayeredGenerator = SuffixGenerator<G>;

        fn layer(&self, inner: G) -> Self::LayeredGenerator {
            SuffixGenerator {
                inner,
                suffix: self.0,
            }
        }
    }

    #[async_trait]
    impl<G: Generator> LayeredGenerator for SuffixGenerator<G> {
        type Inner = G;

        fn inner(&self) -> &G {
            &self.inner
        }

        async fn layered_generate(
            &self,
            req: GenerationRequest,
        ) -> Result<String, GenerationError> {
            let text = self.inner.generate(req).await?;
            Ok(format!("{}{}", text, self.suffix))
        }
    }

    #[async_trait]
    impl<G: Generator> Generator for SuffixGenerator<G> {
        fn info(&self) -> Arc<GeneratorInfo> {
            LayeredGenerator::layered_info(self)
        }

        async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
            LayeredGenerator::layered_generate(self, req).await
        }
    }
}
