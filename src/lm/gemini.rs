//! Gemini `generateContent` REST client.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::TextGenerator;
use crate::config::{GEMINI_KEY_ENV, GEMINI_KEY_FALLBACK_ENV};

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Model ids accepted as per-request overrides.
pub const KNOWN_MODELS: [&str; 8] = [
    "gemini-3-flash-preview",
    "gemini-3-pro-preview",
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-2.0-flash-lite",
    "gemini-1.5-flash-latest",
    "gemini-1.5-pro-latest",
    "gemini-1.0-pro-latest",
];

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Pick the model: a known requested id, else the configured one, else the default.
pub fn resolve_model(requested: Option<&str>, configured: Option<&str>) -> String {
    requested
        .filter(|model| KNOWN_MODELS.contains(model))
        .or(configured)
        .unwrap_or(DEFAULT_MODEL)
        .to_string()
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .unwrap_or_default()
    }
}

impl GeminiClient {
    fn request_body<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

impl TextGenerator for GeminiClient {
    fn generate_text(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            anyhow!("{GEMINI_KEY_ENV} is not set (or set {GEMINI_KEY_FALLBACK_ENV} as fallback)")
        })?;
        let url = format!("{GEMINI_BASE}/{}:generateContent", self.model);
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();

        let start = Instant::now();
        let mut response = agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .send_json(self.request_body(prompt))
            .with_context(|| format!("send Gemini request to model {}", self.model))?;
        let status = response.status();
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            status = status.as_u16(),
            model = %self.model,
            prompt_bytes = prompt.len(),
            "gemini invoke complete"
        );

        if !status.is_success() {
            let detail = response.body_mut().read_to_string().unwrap_or_default();
            return Err(anyhow!("Gemini API error: {} {}", status.as_u16(), detail.trim()));
        }
        let data: GenerateResponse = response
            .body_mut()
            .read_json()
            .context("parse Gemini response JSON")?;
        Ok(data.first_text().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_requested_model_falls_back() {
        assert_eq!(resolve_model(Some("gemini-2.5-pro"), None), "gemini-2.5-pro");
        assert_eq!(resolve_model(Some("gpt-4"), Some("gemini-2.0-flash-lite")), "gemini-2.0-flash-lite");
        assert_eq!(resolve_model(None, None), DEFAULT_MODEL);
    }

    #[test]
    fn missing_key_is_a_descriptive_error() {
        let client = GeminiClient {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_output_tokens: 2048,
        };
        let err = client.generate_text("hi").unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY is not set"));
    }

    #[test]
    fn request_body_matches_generate_content_shape() {
        let client = GeminiClient {
            api_key: Some("k".to_string()),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            max_output_tokens: 100,
        };
        let body = serde_json::to_value(client.request_body("ping")).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"parts": [{"text": "ping"}]}],
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 100}
            })
        );
    }

    #[test]
    fn first_text_tolerates_missing_candidates() {
        let empty: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_text(), "");
        let full: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": " answer "}]}}]
        }))
        .unwrap();
        assert_eq!(full.first_text(), " answer ");
    }
}
