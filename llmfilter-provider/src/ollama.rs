//! Ollama generator.
//!
//! Talks to the Ollama HTTP API: `POST /api/show` to check the model once at
//! construction time and `POST /api/generate` for every request. The
//! configured prompt goes out as the system instruction and the record text
//! as the user prompt; generation options are forwarded verbatim.

use async_trait::async_trait;
use llmfilter_core::config::{DEFAULT_MODEL_NAME, DEFAULT_OLLAMA_URL};
use llmfilter_core::error::GenerationError;
use llmfilter_core::generator::Generator;
use llmfilter_core::types::*;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "no_options")]
    options: &'a GenerationOptions,
}

fn no_options(options: &&GenerationOptions) -> bool {
    options.is_empty()
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Ollama generator
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    info: Arc<GeneratorInfo>,
}

impl OllamaGenerator {
    /// Create a builder
    pub fn builder() -> OllamaBuilder {
        OllamaBuilder::default()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check that the backend knows the configured model.
    pub async fn verify_model(&self) -> Result<(), GenerationError> {
        let resp = self
            .client
            .post(self.url("api/show"))
            .timeout(VERIFY_TIMEOUT)
            .json(&ShowRequest { model: &self.model })
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(GenerationError::model_not_found(&self.model)),
            status => Err(error_from_body(status, resp.text().await?)),
        }
    }

    /// Build the JSON body for one request
    fn build_request<'a>(&'a self, req: &'a GenerationRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt: &req.context,
            system: &req.prompt,
            stream: false,
            options: &req.options,
        }
    }
}

fn error_from_body(status: StatusCode, body: String) -> GenerationError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    GenerationError::backend(status.as_u16(), message)
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn info(&self) -> Arc<GeneratorInfo> {
        self.info.clone()
    }

    async fn generate(&self, req: GenerationRequest) -> Result<String, GenerationError> {
        let resp = self
            .client
            .post(self.url("api/generate"))
            .json(&self.build_request(&req))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GenerationError::model_not_found(&self.model));
        }
        if !status.is_success() {
            return Err(error_from_body(status, resp.text().await?));
        }

        let body: GenerateResponse = serde_json::from_slice(&resp.bytes().await?)?;
        if let Some(count) = body.eval_count {
            tracing::trace!(request_id = %req.request_id, eval_count = count, "ollama generation done");
        }

        body.response
            .ok_or_else(|| GenerationError::invalid_response("missing 'response' field"))
    }
}

/// Builder for the Ollama generator
#[derive(Debug, Default)]
pub struct OllamaBuilder {
    base_url: Option<String>,
    model: Option<String>,
}

impl OllamaBuilder {
    /// Set base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build the generator without touching the network
    pub fn build(self) -> Result<OllamaGenerator, GenerationError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;

        Ok(OllamaGenerator {
            client,
            info: Arc::new(GeneratorInfo {
                id: "ollama".to_string(),
                name: "Ollama".to_string(),
                model: model.clone(),
                endpoint: base_url.clone(),
            }),
            base_url,
            model,
        })
    }

    /// Build the generator and verify the model against the backend
    pub async fn connect(self) -> Result<OllamaGenerator, GenerationError> {
        let generator = self.build()?;
        generator.verify_model().await?;
        Ok(generator)
    }
}
