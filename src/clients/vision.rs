//! Hosted vision/language model (Gemini generateContent)

use super::{build_http_client, check_status};
use crate::config::GeminiConfig;
use crate::error::{NarratorError, Result};
use crate::storage::EncodedImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One piece of a multimodal prompt
#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    Image(EncodedImage),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }
}

/// A model that turns text and images into text
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, parts: &[Part]) -> Result<String>;
}

/// Gemini REST client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(config.timeout_secs))?,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, parts: &[Part]) -> Result<String> {
        // Checked per call so key-free operations still work without it
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| NarratorError::Config("GEMINI_API_KEY is not set".into()))?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: parts.iter().map(RequestPart::from).collect(),
            }],
        };

        debug!("Sending {} part(s) to {}", parts.len(), self.model);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let response: GenerateResponse = check_status("gemini", response).await?.json().await?;
        response.text()
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    Inline { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

impl From<&Part> for RequestPart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => RequestPart::Text { text: text.clone() },
            Part::Image(image) => RequestPart::Inline {
                inline_data: InlineData {
                    mime_type: image.mime_type.to_string(),
                    data: image.data.clone(),
                },
            },
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Result<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| NarratorError::NoData("model returned no candidates".into()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(NarratorError::NoData(format!(
                "model returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text.trim().to_string())
    }
}
