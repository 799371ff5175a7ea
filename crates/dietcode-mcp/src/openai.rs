//! OpenAI-compatible chat completion client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use dietcode_core::collaborators::{CompletionOptions, CompletionService};
use dietcode_core::{DietCodeError, Result};

const SERVICE: &str = "openai";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// [`CompletionService`] speaking the `/chat/completions` protocol.
#[derive(Clone)]
pub struct OpenAiCompletion {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiCompletion {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dietcode/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DietCodeError::transport(SERVICE, e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system_prompt.as_deref() {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
        };

        let mut builder = self.http.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        debug!(model = %options.model, "sending chat completion request");
        let response = builder
            .send()
            .await
            .map_err(|e| DietCodeError::transport(SERVICE, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DietCodeError::transport(SERVICE, e.to_string()))?;

        if !status.is_success() {
            return Err(DietCodeError::transport(
                SERVICE,
                format!("API error {status}: {}", truncate(&body, 200)),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            DietCodeError::transport(SERVICE, format!("undecodable response body: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DietCodeError::transport(SERVICE, "response has no message content"))
    }
}
