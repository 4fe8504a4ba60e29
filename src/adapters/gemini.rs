//! Gemini adapter for comment generation.
//!
//! Calls the Generative Language API `generateContent` endpoint over HTTP.
//! HTTP 429 and 5xx responses and transport timeouts are transient; other
//! non-success responses and safety blocks are permanent.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationError, LanguageModel};
use crate::config::AiSettings;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for the Gemini API
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    /// Build a client from resolved AI settings
    pub fn new(settings: &AiSettings) -> Result<Self, GenerationError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| GenerationError::Permanent("no API key configured".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| GenerationError::Permanent(format!("failed to build client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        })
    }

}

// Manual impl keeps the API key out of debug output.
impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        debug!(model = %self.model, "requesting completion");

        let response = self.http.post(&url).json(&body).send().await.map_err(|e| {
            // Timeouts and connection failures are worth retrying.
            GenerationError::Transient(format!("request failed: {}", e))
        })?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(GenerationError::Transient(format!(
                "service returned {}",
                status
            )));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationError::Permanent(format!(
                "service returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Permanent(format!("unparseable response: {}", e)))?;

        if let Some(feedback) = &parsed.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(GenerationError::Permanent(format!(
                    "prompt blocked: {}",
                    reason
                )));
            }
        }

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Permanent(
                "model returned no text".to_string(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiSettings;

    fn settings(key: Option<&str>) -> AiSettings {
        AiSettings {
            api_key: key.map(String::from),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 256,
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn test_missing_api_key_is_permanent() {
        let err = GeminiClient::new(&settings(None)).unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_client_builds_with_key() {
        let client = GeminiClient::new(&settings(Some("k"))).unwrap();
        assert_eq!(client.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_debug_output_redacts_api_key() {
        let client = GeminiClient::new(&settings(Some("super-secret-key"))).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_response_parsing_extracts_candidate_text() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Nice "}, {"text": "work!"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "Nice work!");
    }

    #[test]
    fn test_blocked_prompt_feedback_parses() {
        let raw = r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }
}
