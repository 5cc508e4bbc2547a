//! Client for the hosted text-generation service.

use crate::cache::ERROR_MARKER;
use crate::config::AnswerSettings;
use crate::error::{Result, SvarError};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
}

/// Calls `POST {endpoint}/models/{model}` with a bearer token.
pub struct TextGenerator {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    token: Option<String>,
    max_new_tokens: u32,
    temperature: f32,
}

impl TextGenerator {
    pub fn new(settings: &AnswerSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            token: settings.api_token.clone().filter(|t| !t.is_empty()),
            max_new_tokens: settings.max_new_tokens,
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    /// Generate a completion for `prompt` with any echoed prompt removed.
    ///
    /// Missing credentials, transport failures and non-success statuses are
    /// `AnswerServiceUnavailable`. An unrecognized body is returned as raw text.
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let token = self.token.as_ref().ok_or_else(|| {
            SvarError::AnswerServiceUnavailable("HF_TOKEN is not set".to_string())
        })?;

        let url = format!("{}/models/{}", self.endpoint, self.model);
        debug!("Requesting completion from {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&GenerationRequest {
                inputs: prompt,
                parameters: GenerationParameters {
                    max_new_tokens: self.max_new_tokens,
                    temperature: self.temperature,
                },
            })
            .send()
            .await
            .map_err(|e| SvarError::AnswerServiceUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SvarError::AnswerServiceUnavailable(format!("reading response failed: {}", e)))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %truncate(body.trim(), 500), "Answer service error");
            return Err(SvarError::AnswerServiceUnavailable(format!(
                "API error: {}",
                status.as_u16()
            )));
        }

        let text = match serde_json::from_str::<Value>(&body) {
            Ok(value) => extract_generated_text(&value).unwrap_or_else(|| {
                warn!("{}", SvarError::MalformedServiceResponse(truncate(&body, 200)));
                value.to_string()
            }),
            Err(_) => {
                warn!("{}", SvarError::MalformedServiceResponse(truncate(&body, 200)));
                body
            }
        };

        Ok(strip_prompt_echo(&text, prompt))
    }
}

/// Pull generated text out of the known response shapes, in order:
/// a list of objects with `generated_text`, an object with `generated_text`,
/// a list of objects with `text`, an object with `text`.
pub fn extract_generated_text(value: &Value) -> Option<String> {
    let first = value.as_array().and_then(|items| items.first());

    for key in ["generated_text", "text"] {
        if let Some(text) = first.and_then(|item| item.get(key)).and_then(Value::as_str) {
            return Some(text.to_string());
        }
        if let Some(text) = value.get(key).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }
    None
}

/// Remove the prompt if the model echoed it at the start of its output.
pub fn strip_prompt_echo(output: &str, prompt: &str) -> String {
    let output = output.trim_start();
    output
        .strip_prefix(prompt)
        .unwrap_or(output)
        .trim()
        .to_string()
}

/// User-facing error string for a failed answer.
pub fn error_answer(err: &SvarError) -> String {
    format!("{} {}", ERROR_MARKER, err)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
