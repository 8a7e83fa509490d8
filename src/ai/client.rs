//! LLM (`OpenAI`) API client.
//!
//! Encapsulates the chat-completion calls used for summarization and for
//! extracting text from images. Every call is a single attempt with a
//! bounded timeout; there is no retry layer.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::core::config::AppConfig;
use crate::errors::RelayError;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const OCR_SYSTEM_PROMPT: &str =
    "Transcribe all readable text from the image exactly as written. \
     Reply with the transcription only; reply with an empty message if \
     the image contains no text.";

/// Tuning knobs for a summarization exchange.
#[derive(Debug, Clone)]
pub struct SummarizeOptions {
    /// Identifier of the language model to invoke.
    pub model: String,
    /// Upper bound on response length.
    pub max_output_tokens: u32,
    /// Sampling randomness in [0, 1].
    pub temperature: f32,
    /// Instruction text prepended to guide summarization style.
    pub system_prompt: String,
}

impl SummarizeOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.openai_model.clone(),
            max_output_tokens: config.openai_max_tokens,
            temperature: config.openai_temperature,
            system_prompt: config.summary_system_prompt.clone(),
        }
    }
}

/// LLM API client for generating summaries and OCR transcriptions.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
    options: SummarizeOptions,
}

impl LlmClient {
    pub fn new(api_key: String, options: SummarizeOptions) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::HttpError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            options,
        })
    }

    /// Summarize `text`, returning the trimmed response.
    ///
    /// Never fails: any transport or API error is converted into a sentinel
    /// failure string embedding the error detail, so the pipeline can still
    /// notify the user of the failure instead of dropping the request.
    pub async fn summarize(&self, text: &str) -> String {
        match self.request_summary(text).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summarization failed: {}", e);
                format!("Summary failed: {e}")
            }
        }
    }

    async fn request_summary(&self, text: &str) -> Result<String, RelayError> {
        #[cfg(feature = "debug-logs")]
        info!("Summarizing content:\n{}", text);

        #[cfg(not(feature = "debug-logs"))]
        info!("Summarizing {} chars of content", text.chars().count());

        let request_body = json!({
            "model": self.options.model,
            "messages": [
                { "role": "system", "content": self.options.system_prompt },
                { "role": "user", "content": text }
            ],
            "max_tokens": self.options.max_output_tokens,
            "temperature": self.options.temperature
        });

        self.send_completion(request_body).await
    }

    /// Extract readable text from an image via a vision request.
    ///
    /// The image travels inline as a base64 data URL. Returns whatever text
    /// the model transcribed, trimmed; callers decide how to treat an empty
    /// transcription.
    pub async fn extract_image_text(
        &self,
        image: &[u8],
        mime: &str,
    ) -> Result<String, RelayError> {
        info!(
            "Extracting text from {} byte image ({})",
            image.len(),
            mime
        );

        let data_url = format!("data:{mime};base64,{}", BASE64.encode(image));
        let request_body = json!({
            "model": self.options.model,
            "messages": [
                { "role": "system", "content": OCR_SYSTEM_PROMPT },
                { "role": "user", "content": [
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]}
            ],
            "max_tokens": self.options.max_output_tokens,
            "temperature": 0.0
        });

        self.send_completion(request_body).await
    }

    async fn send_completion(&self, request_body: Value) -> Result<String, RelayError> {
        let response = self
            .http
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| RelayError::HttpError(format!("OpenAI API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(RelayError::OpenAIError(format!(
                "OpenAI API error (status {status}): {error_text}"
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| RelayError::OpenAIError(format!("Failed to parse OpenAI response: {e}")))?;

        extract_completion_text(&response_json)
    }
}

#[async_trait::async_trait]
impl crate::relay::Summarizer for LlmClient {
    async fn summarize(&self, text: &str) -> String {
        LlmClient::summarize(self, text).await
    }

    async fn extract_image_text(&self, image: &[u8], mime: &str) -> Result<String, RelayError> {
        LlmClient::extract_image_text(self, image, mime).await
    }
}

/// Pull the assistant message out of a chat-completion response body.
fn extract_completion_text(response: &Value) -> Result<String, RelayError> {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| RelayError::OpenAIError("No text in response".to_string()))
}
