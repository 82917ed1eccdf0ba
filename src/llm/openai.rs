//! OpenAI-compatible chat completions client.

use super::{CompletionRequest, SummarizeError, Summarizer};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

/// Calls `POST {api_base}/chat/completions` with bearer authentication.
///
/// Retries are not handled here; the batch analyzer owns the retry policy.
pub struct OpenAiSummarizer {
    client: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(api_base: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Same endpoint and credential, different model.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            client: self.client.clone(),
            api_base: self.api_base.clone(),
            api_key: self.api_key.clone(),
            model: model.to_string(),
        }
    }

    fn request_body(&self, request: &CompletionRequest<'_>) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.prompt},
            ],
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }
}

impl Summarizer for OpenAiSummarizer {
    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SummarizeError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(request))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SummarizeError::Api { status: status.as_u16(), body });
        }

        let json: Value = response.json()?;
        parse_completion(&json)
    }
}

/// Extract the first choice's message content.
fn parse_completion(json: &Value) -> Result<String, SummarizeError> {
    let choices = json
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| SummarizeError::MalformedResponse("missing choices array".to_string()))?;

    let content = choices
        .first()
        .and_then(|choice| choice.pointer("/message/content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    if content.is_empty() {
        return Err(SummarizeError::EmptyResponse);
    }
    Ok(content.to_string())
}
