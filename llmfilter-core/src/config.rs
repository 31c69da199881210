//! Filter configuration.
//!
//! Settings arrive as a flat bag of string keys and string values, the way
//! stream hosts hand plugin properties over. [`FilterConfig::from_settings`]
//! resolves that bag once at startup; everything it rejects is fatal.

use crate::error::ConfigError;
use crate::types::GenerationOptions;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Model used when `model_name` is not set.
pub const DEFAULT_MODEL_NAME: &str = "llama3.2";

/// Ollama endpoint used when `api_url` is not set.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// OpenAI-compatible endpoint used when `api_url` is not set.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Field read from each record when `input_field` is not set.
pub const DEFAULT_INPUT_FIELD: &str = "message";

/// Field written into each record when `output_field` is not set.
pub const DEFAULT_OUTPUT_FIELD: &str = "llm_output";

/// Deadline applied to each generation call when `timeout` is not set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Recognized setting names.
pub const SETTING_KEYS: &[&str] = &[
    "backend",
    "model_name",
    "api_url",
    "api_key",
    "prompt",
    "input_field",
    "output_field",
    "options_json",
    "timeout",
];

/// Text-generation backend kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Ollama HTTP API
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API
    OpenAi,
}

impl Backend {
    /// Endpoint used when none is configured
    pub fn default_api_url(&self) -> &'static str {
        match self {
            Backend::Ollama => DEFAULT_OLLAMA_URL,
            Backend::OpenAi => DEFAULT_OPENAI_URL,
        }
    }

    /// Setting value naming this backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Ollama => "ollama",
            Backend::OpenAi => "openai",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Backend::Ollama),
            "openai" => Ok(Backend::OpenAi),
            other => Err(ConfigError::invalid(
                "backend",
                format!("expected 'ollama' or 'openai', got '{other}'"),
            )),
        }
    }
}

/// Validated filter configuration.
///
/// Immutable once built. `prompt` and `options` are reference-counted so
/// every request can share them.
#[derive(Clone)]
pub struct FilterConfig {
    pub backend: Backend,
    pub model_name: String,
    pub api_url: String,
    pub api_key: Option<String>,
    pub prompt: Arc<str>,
    pub input_field: String,
    pub output_field: String,
    pub options: Arc<GenerationOptions>,
    pub timeout: Duration,
}

impl fmt::Debug for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterConfig")
            .field("backend", &self.backend)
            .field("model_name", &self.model_name)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("prompt", &self.prompt)
            .field("input_field", &self.input_field)
            .field("output_field", &self.output_field)
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FilterConfig {
    /// Create a builder
    pub fn builder() -> FilterConfigBuilder {
        FilterConfigBuilder::default()
    }

    /// Resolve a flat settings bag.
    ///
    /// Keys are matched case-insensitively. Unknown keys are rejected.
    pub fn from_settings<I, K, V>(settings: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = FilterConfig::builder();

        for (key, value) in settings {
            let key = key.as_ref().trim().to_ascii_lowercase();
            let value = value.as_ref();
            builder = match key.as_str() {
                "backend" => builder.backend(value.parse()?),
                "model_name" => builder.model_name(value),
                "api_url" => builder.api_url(value),
                "api_key" => builder.api_key(value),
                "prompt" => builder.prompt(value),
                "input_field" => builder.input_field(value),
                "output_field" => builder.output_field(value),
                "options_json" => builder.options_json(value),
                "timeout" => builder.timeout(parse_timeout(value)?),
                _ => return Err(ConfigError::UnknownSetting(key)),
            };
        }

        builder.build()
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid("timeout", format!("'{value}' is not a number")))?;
    duration_from_secs(secs)
}

fn duration_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::invalid(
            "timeout",
            format!("must be a positive number of seconds, got {secs}"),
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::invalid("timeout", e.to_string()))
}

fn parse_options(raw: &str) -> Result<GenerationOptions, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(GenerationOptions::new());
    }

    match serde_json::from_str(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(ConfigError::invalid_options(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Builder for [`FilterConfig`]
#[derive(Debug, Default)]
pub struct FilterConfigBuilder {
    backend: Option<Backend>,
    model_name: Option<String>,
    api_url: Option<String>,
    api_key: Option<String>,
    prompt: Option<String>,
    input_field: Option<String>,
    output_field: Option<String>,
    options_json: Option<String>,
    options: Option<GenerationOptions>,
    timeout: Option<Duration>,
    timeout_secs: Option<f64>,
}

impl FilterConfigBuilder {
    /// Set backend kind
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set model identifier
    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Set backend URL
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Set API key (OpenAI-compatible backends only)
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the instruction sent with every record
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the record field to read
    pub fn input_field(mut self, field: impl Into<String>) -> Self {
        self.input_field = Some(field.into());
        self
    }

    /// Set the record field to write
    pub fn output_field(mut self, field: impl Into<String>) -> Self {
        self.output_field = Some(field.into());
        self
    }

    /// Set generation options from serialized JSON, parsed in `build()`
    pub fn options_json(mut self, raw: impl Into<String>) -> Self {
        self.options_json = Some(raw.into());
        self.options = None;
        self
    }

    /// Set generation options directly
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = Some(options);
        self.options_json = None;
        self
    }

    /// Set the per-call deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self.timeout_secs = None;
        self
    }

    /// Set the per-call deadline in (possibly fractional) seconds
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs = Some(secs);
        self.timeout = None;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<FilterConfig, ConfigError> {
        let prompt = self
            .prompt
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingPrompt)?;

        let backend = self.backend.unwrap_or_default();
        let model_name = non_empty("model_name", self.model_name, DEFAULT_MODEL_NAME)?;
        let api_url = non_empty("api_url", self.api_url, backend.default_api_url())?;
        let input_field = non_empty("input_field", self.input_field, DEFAULT_INPUT_FIELD)?;
        let output_field = non_empty("output_field", self.output_field, DEFAULT_OUTPUT_FIELD)?;

        if input_field == output_field {
            return Err(ConfigError::invalid(
                "output_field",
                format!("must differ from input_field '{input_field}'"),
            ));
        }

        let options = match (self.options, self.options_json) {
            (Some(options), _) => options,
            (None, Some(raw)) => parse_options(&raw)?,
            (None, None) => GenerationOptions::new(),
        };

        let timeout = match (self.timeout, self.timeout_secs) {
            (Some(timeout), _) if timeout.is_zero() => {
                return Err(ConfigError::invalid("timeout", "must be greater than zero"))
            }
            (Some(timeout), _) => timeout,
            (None, Some(secs)) => duration_from_secs(secs)?,
            (None, None) => DEFAULT_TIMEOUT,
        };

        Ok(FilterConfig {
            backend,
            model_name,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: self.api_key.filter(|k| !k.is_empty()),
            prompt: Arc::from(prompt),
            input_field,
            output_field,
            options: Arc::new(options),
            timeout,
        })
    }
}

fn non_empty(key: &str, value: Option<String>, default: &str) -> Result<String, ConfigError> {
    match value {
        None => Ok(default.to_string()),
        Some(v) if v.trim().is_empty() => Err(ConfigError::invalid(key, "must not be empty")),
        Some(v) => Ok(v.trim().to_string()),
    }
}
