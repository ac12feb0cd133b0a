use std::time::Duration;

use broadcast_logging::{broadcast_debug, broadcast_warn};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENHANCE_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ENHANCE_MODEL: &str = "gemini-3-flash-preview";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct EnhanceSettings {
    pub endpoint: String,
    pub model: String,
    /// Without a key every request degrades to pass-through.
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub request_timeout: Duration,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENHANCE_ENDPOINT.to_string(),
            model: DEFAULT_ENHANCE_MODEL.to_string(),
            api_key: None,
            temperature: 0.7,
            top_p: 0.95,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnhanceError {
    #[error("no API credential configured")]
    MissingCredential,
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response contained no text")]
    EmptyResponse,
}

#[async_trait::async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(&self, text: &str) -> Result<String, EnhanceError>;
}

/// Rewrites `text`, falling back to the input on any failure.
pub async fn enhance_or_original(enhancer: &dyn Enhancer, text: &str) -> String {
    match enhancer.enhance(text).await {
        Ok(enhanced) => enhanced,
        Err(err) => {
            broadcast_warn!("Message enhancement failed, keeping original: {}", err);
            text.to_string()
        }
    }
}

pub fn build_prompt(text: &str) -> String {
    format!(
        "Improve the following chat marketing message so it is clearer and more engaging. \
         Keep the tone friendly but professional and reply with the rewritten message only. \
         Message: \"{text}\""
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
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
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
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

/// Generate-content HTTP client.
#[derive(Debug, Clone)]
pub struct GeminiEnhancer {
    settings: EnhanceSettings,
}

impl GeminiEnhancer {
    pub fn new(settings: EnhanceSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, EnhanceError> {
        reqwest::Client::builder()
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| EnhanceError::Network(err.to_string()))
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }
}

#[async_trait::async_trait]
impl Enhancer for GeminiEnhancer {
    async fn enhance(&self, text: &str) -> Result<String, EnhanceError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(EnhanceError::MissingCredential)?;

        let prompt = build_prompt(text);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                top_p: self.settings.top_p,
            },
        };
        let body = serde_json::to_vec(&request)
            .map_err(|err| EnhanceError::MalformedResponse(err.to_string()))?;

        let client = self.build_client()?;
        let response = client
            .post(self.request_url())
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key)
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnhanceError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: GenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|err| EnhanceError::MalformedResponse(err.to_string()))?;

        let enhanced: String = parsed
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
        let enhanced = enhanced.trim();
        if enhanced.is_empty() {
            return Err(EnhanceError::EmptyResponse);
        }

        broadcast_debug!(
            "Enhanced message from {} to {} chars",
            text.chars().count(),
            enhanced.chars().count()
        );
        Ok(enhanced.to_string())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> EnhanceError {
    if err.is_timeout() {
        return EnhanceError::Timeout;
    }
    EnhanceError::Network(err.to_string())
}
