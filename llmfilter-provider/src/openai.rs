//! OpenAI-compatible generator using the async-openai crate.
//!
//! Each request becomes a two-message chat completion: the configured prompt
//! as the system message and the record text as the user message.

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use llmfilter_core::config::{DEFAULT_MODEL_NAME, DEFAULT_OPENAI_URL};
use llmfilter_core::error::GenerationError;
use llmfilter_core::generator::Generator;
use llmfilter_core::types::*;
use serde_json::Value;
use std::sync::Arc;

/// Option keys mapped onto chat completion parameters.
pub const SUPPORTED_OPTIONS: &[&str] = &[
    "temperature",
    "top_p",
    "max_tokens",
    "presence_penalty",
    "frequency_penalty",
    "seed",
    "stop",
];

/// OpenAI-compatible generator
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    info: Arc<GeneratorInfo>,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("info", &self.info)
            .finish()
    }
}

impl OpenAiGenerator {
    /// Create a builder
    pub fn builder() -> OpenAiBuilder {
        OpenAiBuilder::default()
    }

    /// Check that the backend knows the configured model.
    pub async fn verify_model(&self) -> Result<(), GenerationError> {
        self.client
            .models()
            .retrieve(&self.model)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                OpenAIError::ApiError(api) if api.code.as_deref() == Some("model_not_found") => {
                    GenerationError::model_not_found(format!("{} ({})", self.model, api.message))
                }
                OpenAIError::Reqwest(e) => {
                    GenerationError::other(format!("failed to reach {}: {}", self.info.endpoint, e))
                }
                e => GenerationError::other(format!("failed to verify model {}: {}", self.model, e)),
            })
    }

    /// Build CreateChatCompletionRequest from a generation request
    fn build_request(
        &self,
        req: &GenerationRequest,
    ) -> Result<CreateChatCompletionRequest, GenerationError> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(req.prompt.to_string())
            .build()
            .map_err(|e| GenerationError::other(format!("Failed to build system message: {}", e)))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(req.context.clone())
            .build()
            .map_err(|e| GenerationError::other(format!("Failed to build user message: {}", e)))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(vec![
            ChatCompletionRequestMessage::System(system),
            ChatCompletionRequestMessage::User(user),
        ]);

        let options = &req.options;
        if let Some(temperature) = option_f32(options, "temperature") {
            builder.temperature(temperature);
        }
        if let Some(top_p) = option_f32(options, "top_p") {
            builder.top_p(top_p);
        }
        if let Some(max_tokens) = options.get("max_tokens").and_then(Value::as_u64) {
            builder.max_completion_tokens(max_tokens.min(u32::MAX as u64) as u32);
        }
        if let Some(presence_penalty) = option_f32(options, "presence_penalty") {
            builder.presence_penalty(presence_penalty);
        }
        if let Some(frequency_penalty) = option_f32(options, "frequency_penalty") {
            builder.frequency_penalty(frequency_penalty);
        }
        if let Some(seed) = options.get("seed").and_then(Value::as_i64) {
            builder.seed(seed);
        }
        if let Some(stop) = option_stop(options) {
            builder.stop(stop);
        }

        builder
            .build()
            .map_err(|e| GenerationError::other(format!("Failed to build request: {}", e)))
    }
}

fn option_f32(options: &GenerationOptions, key: &str) -> Option<f32> {
    options.get(key).and_then(Value::as_f64).map(|v| v as f32)
}

fn option_stop(options: &GenerationOptions) -> Option<Vec<String>> {
    match options.get("stop")? {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

/// Option keys this backend ignores.
pub fn unsupported_options(options: &GenerationOptions) -> Vec<&str> {
    options
        .keys()
        .map(String::as_str)
        .filter(|k| !SUPPORTED_OPTIONS.contains(k))
        .collect()
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn info(&self) -> Arc<GeneratorInfo> {
        self.info.clone()
    }

    async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
        let openai_req = self.build_request(&req)?;

        let response = self
            .client
            .chat()
            .create(openai_req)
            .await
            .map_err(|e| GenerationError::other(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::invalid_response("no content in response"))
    }
}

/// Builder for OpenAI-compatible generators
#[derive(Default)]
pub struct OpenAiBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    model: Option<String>,
}

impl OpenAiBuilder {
    /// Set API key. Without one, `OPENAI_API_KEY` is read from the environment.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set API base URL (for OpenAI-compatible servers)
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build the generator without touching the network
    pub fn build(self) -> OpenAiGenerator {
        let api_base = self
            .api_base
            .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

        let mut config = OpenAIConfig::new().with_api_base(&api_base);
        if let Some(api_key) = self.api_key {
            config = config.with_api_key(api_key);
        }

        OpenAiGenerator {
            client: Client::with_config(config),
            info: Arc::new(GeneratorInfo {
                id: "openai".to_string(),
                name: "OpenAI".to_string(),
                model: model.clone(),
                endpoint: api_base,
            }),
            model,
        }
    }

    /// Build the generator and verify the model against the backend
    pub async fn connect(self) -> Result<OpenAiGenerator, GenerationError> {
        let generator = self.build();
        generator.verify_model().await?;
        Ok(generator)
    }
}
