use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CaptionError, CaptionFuture, CaptionModel, Provider, caption_instruction};

pub const DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct OpenAIChat {
    client: Client,
    api_key: String,
    url: String,
    model: String,
}

impl OpenAIChat {
    pub fn new(api_key: String, url: impl Into<String>, model: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            api_key,
            url: url.into(),
            model: model.into(),
        }
    }
}

impl CaptionModel for OpenAIChat {
    fn get_caption<'a>(&'a self, topic: &'a str) -> CaptionFuture<'a> {
        Box::pin(async move {
            let body = OpenAIChatRequest {
                model: &self.model,
                messages: vec![OpenAIMessage {
                    role: "user",
                    content: caption_instruction(topic),
                }],
            };

            let res = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                return Err(match serde_json::from_str::<OpenAIErrorEnvelope>(&text) {
                    Ok(OpenAIErrorEnvelope { error }) => {
                        let api_status = match error.code.as_deref() {
                            Some("model_not_found") => Some("NOT_FOUND"),
                            Some("insufficient_quota") => Some("RESOURCE_EXHAUSTED"),
                            _ => None,
                        };
                        CaptionError::from_status(status, api_status, error.message)
                    }
                    Err(_) => CaptionError::from_status(status, None, text),
                });
            }

            debug!("OpenAI response:\n{text}");
            let completion: OpenAIChatResponse =
                serde_json::from_str(&text).map_err(|e| CaptionError::Unexpected {
                    message: format!("could not parse chat completion: {e}"),
                })?;

            completion
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|c| !c.trim().is_empty())
                .ok_or(CaptionError::EmptyResponse)
        })
    }

    fn provider(&self) -> Provider {
        Provider::OpenAI
    }
}

//
// ===== OpenAI wire types =====
//

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize, Debug)]
struct OpenAIChoice {
    message: OpenAIAnswer,
}

#[derive(Deserialize, Debug)]
struct OpenAIAnswer {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorEnvelope {
    error: OpenAIError,
}

#[derive(Deserialize)]
struct OpenAIError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}
