//! Google Gemini answer generator.
//!
//! Sends a single prompt to the `generateContent` endpoint and returns the
//! reply text.
//!
//! # Endpoint pattern
//! `POST https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent`
//!
//! # Auth
//! API key via the `x-goog-api-key` header.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::ModelConfig;

/// Why an answer could not be produced. Callers treat every variant as a
/// terminal failure for that request.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    #[error("Gemini request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gemini error {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("could not decode Gemini response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Gemini returned no text")]
    EmptyReply,
}

/// Produces a raw text answer for a prompt.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Name shown in logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl From<&ModelConfig> for GeminiSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model: config.name.clone(),
            api_key: config.resolve_api_key(),
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
        }
    }
}

pub struct GeminiClient {
    settings: GeminiSettings,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }
}

#[async_trait]
impl AnswerGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let key = self
            .settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GenerateError::MissingApiKey)?;

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        debug!(model = %self.settings.model, prompt_len = prompt.len(), "sending Gemini request");

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(GenerateError::Provider {
                status: status.as_u16(),
                body: text,
            });
        }

        let reply = parse_reply(&text)?;
        debug!(model = %self.settings.model, reply_len = reply.len(), "received Gemini reply");
        Ok(reply)
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenate the text parts of the first candidate.
fn parse_reply(body: &str) -> Result<String, GenerateError> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GenerateError::EmptyReply);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>) -> GeminiSettings {
        GeminiSettings {
            model: "gemini-2.0-flash".to_string(),
            api_key: api_key.map(str::to_string),
            base_url: "https://example.invalid/".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn endpoint_joins_base_url_and_model() {
        let client = GeminiClient::new(settings(Some("k"))).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.invalid/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        for key in [None, Some(""), Some("   ")] {
            let client = GeminiClient::new(settings(key)).unwrap();
            let err = client.generate("hello").await.unwrap_err();
            assert!(matches!(err, GenerateError::MissingApiKey));
        }
    }

    #[test]
    fn parse_reply_joins_parts() {
        let body = r##"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "# Hi\n"}, {"text": "there"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 3}
        }"##;
        assert_eq!(parse_reply(body).unwrap(), "# Hi\nthere");
    }

    #[test]
    fn parse_reply_without_text_is_empty() {
        assert!(matches!(
            parse_reply(r#"{"candidates": []}"#),
            Err(GenerateError::EmptyReply)
        ));
        assert!(matches!(
            parse_reply(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#),
            Err(GenerateError::EmptyReply)
        ));
        assert!(matches!(parse_reply("not json"), Err(GenerateError::Decode(_))));
    }
}
