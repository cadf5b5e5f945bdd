//! HTTP client for the v0 chat-completions endpoint.

use genforge::collaborators::{CollaboratorError, GenerationClient};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_URL: &str = "https://api.v0.dev/v1/chat/completions";
const DEFAULT_MODEL: &str = "v0-1.5-lg";
const MAX_TOKENS: u32 = 16384;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

pub struct V0Client {
    http: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl V0Client {
    /// Reads `V0_API_KEY`, and optionally `V0_MODEL` and `V0_API_URL`.
    pub fn from_env() -> Result<Self, CollaboratorError> {
        let api_key = env::var("V0_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CollaboratorError::MissingCredential("V0_API_KEY".to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| failed(e.to_string()))?;

        Ok(Self {
            http,
            url: env::var("V0_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            model: env::var("V0_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl GenerationClient for V0Client {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
        };

        debug!(url = %self.url, model = %self.model, "sending generation request");
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("HTTP {}: {}", status, body.trim())));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("unexpected response body: {}", e)))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| failed("response contained no choices".to_string()))
    }
}

fn failed(message: String) -> CollaboratorError {
    CollaboratorError::Failed {
        tool: "v0".to_string(),
        message,
    }
}
