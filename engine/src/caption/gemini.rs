use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CaptionError, CaptionFuture, CaptionModel, Provider, caption_instruction};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl Gemini {
    pub fn new(api_key: String, model: String, client: Client) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.into(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl CaptionModel for Gemini {
    fn get_caption<'a>(&'a self, topic: &'a str) -> CaptionFuture<'a> {
        Box::pin(async move {
            let body = GenerateRequest::from_prompt(caption_instruction(topic));
            debug!("Gemini request to {}: {body:?}", self.endpoint());

            let res = self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                return Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
                    Ok(ErrorEnvelope { error }) => {
                        CaptionError::from_status(status, error.status.as_deref(), error.message)
                    }
                    Err(_) => CaptionError::from_status(status, None, text),
                });
            }

            let response: GenerateResponse =
                serde_json::from_str(&text).map_err(|e| CaptionError::Unexpected {
                    message: format!("could not parse Gemini answer: {e}"),
                })?;
            response.text().ok_or(CaptionError::EmptyResponse)
        })
    }

    fn provider(&self) -> Provider {
        Provider::Gemini
    }
}

//
// ===== Gemini wire types =====
//

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}
