use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use steward_core::{LlmConfig, StewardError};
use tracing::{debug, info};

use crate::prompt;
use crate::resolver::ProjectInference;

/// Generation parameters sent with every prompt.
///
/// # Examples
///
/// ```
/// use steward_health::llm::GenerationOptions;
///
/// let options = GenerationOptions::short(150);
/// assert_eq!(options.max_tokens, 150);
/// assert_eq!(options.temperature, 0.0);
/// assert_eq!(options.stop, vec!["\n".to_string()]);
/// assert!(!options.stream);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature; zero for deterministic output.
    pub temperature: f32,
    /// Sequences that end generation.
    pub stop: Vec<String>,
    /// Whether to stream the response. Always off in this crate.
    pub stream: bool,
}

impl GenerationOptions {
    /// Deterministic, non-streaming, single-line generation capped at `max_tokens`.
    pub fn short(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: 0.0,
            stop: vec!["\n".to_string()],
            stream: false,
        }
    }
}

/// A text-generation endpoint: prompt in, text out.
///
/// Implementations make exactly one request per call and surface failures
/// as [`StewardError::Llm`].
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, StewardError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions<'a>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions<'a> {
    num_predict: u32,
    temperature: f32,
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for an Ollama-compatible `/api/generate` endpoint.
///
/// # Examples
///
/// ```
/// use steward_core::LlmConfig;
/// use steward_health::llm::OllamaClient;
///
/// let client = OllamaClient::new(&LlmConfig::default()).unwrap();
/// assert_eq!(client.model(), "llama3");
/// ```
pub struct OllamaClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OllamaClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StewardError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, StewardError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StewardError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl InferenceService for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, StewardError> {
        let url = self.endpoint();
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: options.stream,
            options: GenerateOptions {
                num_predict: options.max_tokens,
                temperature: options.temperature,
                stop: &options.stop,
            },
        };
        debug!(%url, prompt_chars = prompt.len(), max_tokens = options.max_tokens, "sending generate request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StewardError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(StewardError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| StewardError::Llm(format!("failed to parse response: {e}")))?;

        Ok(parsed.response.trim().to_string())
    }
}

/// Asks the model for a project name when title and body heuristics fail.
///
/// Blank answers and answers of `unknown` count as no answer.
pub struct LlmProjectInference<'a> {
    llm: &'a dyn InferenceService,
}

impl<'a> LlmProjectInference<'a> {
    pub fn new(llm: &'a dyn InferenceService) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl<'a> ProjectInference for LlmProjectInference<'a> {
    async fn infer_project(&self, title: &str, body: &str) -> Result<Option<String>, StewardError> {
        let prompt = prompt::build_project_name_prompt(title, body);
        let answer = self
            .llm
            .generate(&prompt, &GenerationOptions::short(prompt::PROJECT_NAME_MAX_TOKENS))
            .await?;
        let name = prompt::clean_project_name_answer(&answer);
        match &name {
            Some(n) => info!(project = %n, "model inferred project name"),
            None => info!("model could not infer a project name"),
        }
        Ok(name)
    }
}
