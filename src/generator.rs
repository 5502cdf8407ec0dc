//! Answer generation through a text model.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fetch::http_client;
use crate::schema::AnswerValue;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Source of raw answer text for a prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Send `prompt` to the model and return its text reply.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiGenerator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
        proxy: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout, proxy)?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        })
    }

    /// Point the client at a different API host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnswerGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting answers");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Error::GeneratorError(format!("request to model '{}' failed: {e}", self.model))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::GeneratorError(format!(
                "model '{}' returned {status}: {}",
                self.model,
                detail.chars().take(300).collect::<String>()
            )));
        }

        let text = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::GeneratorError(format!("unreadable model response: {e}")))?
            .into_text();
        if text.trim().is_empty() {
            return Err(Error::GeneratorError(
                "no text returned from model response".into(),
            ));
        }
        Ok(text)
    }
}

/// Remove a surrounding Markdown code fence (```json or ```), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a model reply into an ordered answer list.
pub fn parse_answers(text: &str) -> Result<Vec<Option<AnswerValue>>> {
    serde_json::from_str(strip_code_fences(text))
        .map_err(|e| Error::GeneratorError(format!("reply is not a JSON answer array: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```json\n[\"a\"]\n```"), "[\"a\"]");
        assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fences("  [1, 2] "), "[1, 2]");
    }

    #[test]
    fn parses_fenced_answers() {
        let answers = parse_answers("```json\n[\"42\", 7, [\"A\", \"B\"]]\n```").unwrap();
        assert_eq!(
            answers,
            vec![
                Some(AnswerValue::text("42")),
                Some(AnswerValue::text("7")),
                Some(AnswerValue::Many(vec!["A".into(), "B".into()])),
            ]
        );
    }

    #[test]
    fn non_array_reply_is_a_generator_error() {
        assert!(matches!(
            parse_answers("Sure! Here are your answers."),
            Err(Error::GeneratorError(_))
        ));
        assert!(matches!(
            parse_answers("{\"answers\": []}"),
            Err(Error::GeneratorError(_))
        ));
    }

    #[test]
    fn request_body_matches_api_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: GenerationConfig { temperature: 1.5 },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "contents": [{"parts": [{"text": "hi"}]}],
                "generationConfig": {"temperature": 1.5}
            })
        );
    }

    #[test]
    fn response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "[\"a\","}, {"text": "\"b\"]"}]}}]
        }))
        .unwrap();
        assert_eq!(response.into_text(), "[\"a\",\"b\"]");

        let empty: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(empty.into_text(), "");
    }

    #[test]
    fn proxy_applies_to_generator_client() {
        let timeout = Duration::from_secs(5);
        assert!(GeminiGenerator::new("k", "m", 1.0, timeout, Some("http://127.0.0.1:8080")).is_ok());
        assert!(matches!(
            GeminiGenerator::new("k", "m", 1.0, timeout, Some("http://[::1")),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn url_includes_model() {
        let generator = GeminiGenerator::new("k", "gemini-test", 1.0, Duration::from_secs(5), None)
            .unwrap()
            .with_endpoint("http://localhost:9999/");
        assert_eq!(
            generator.url(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
    }
}
