use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::backend::{BackendError, Candidate, ConnectionFactory, ModelOutput, ScoringConnection};

const GENERATE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Builds HTTP connections against the Gemini generateContent API.
pub struct GeminiFactory {
    request_timeout: Duration,
}

impl GeminiFactory {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl ConnectionFactory for GeminiFactory {
    type Connection = GeminiConnection;

    fn connect(&self, api_key: &str) -> Result<GeminiConnection, BackendError> {
        let http = Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|error| BackendError::Transport(error.to_string()))?;

        Ok(GeminiConnection {
            http,
            api_key: api_key.to_string(),
        })
    }
}

/// One HTTP client bound to a single API key.
pub struct GeminiConnection {
    http: Client,
    api_key: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl ScoringConnection for GeminiConnection {
    async fn generate(&self, model: &str, prompt: &str) -> Result<ModelOutput, BackendError> {
        let url = format!("{GENERATE_BASE_URL}/{model}:generateContent?key={}", self.api_key);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|error| BackendError::Transport(error.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Rejected(format!(
                "status {}",
                response.status()
            )));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|error| BackendError::Transport(error.to_string()))?;

        let candidates = payload
            .candidates
            .into_iter()
            .map(|candidate| Candidate {
                parts: candidate
                    .content
                    .map(|content| content.parts.into_iter().map(|part| part.text).collect())
                    .unwrap_or_default(),
            })
            .collect();

        Ok(ModelOutput::Candidates(candidates))
    }
}
