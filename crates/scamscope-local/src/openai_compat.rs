//! OpenAI-compatible chat completions backend (vLLM, llama.cpp server, LM Studio, OpenRouter).

use scamscope_core::{Error, ModelBackend, Result};
use serde::{Deserialize, Serialize};

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn openai_compat_base_url_from_env() -> Option<String> {
    env("SCAMSCOPE_OPENAI_COMPAT_BASE_URL")
}

fn openai_compat_api_key_from_env() -> Option<String> {
    env("SCAMSCOPE_OPENAI_COMPAT_API_KEY")
}

fn openai_compat_model_from_env() -> Option<String> {
    env("SCAMSCOPE_OPENAI_COMPAT_MODEL")
}

fn openai_compat_timeout_ms_from_env() -> u64 {
    env("SCAMSCOPE_OPENAI_COMPAT_TIMEOUT_MS")
        .and_then(|s| s.parse::<u64>().ok())
        .map_or(60_000, crate::clamp_request_timeout_ms)
}

#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_ms: u64,
}

impl OpenAiCompatClient {
    pub fn from_env(client: reqwest::Client, model_override: Option<String>) -> Result<Self> {
        let base_url = openai_compat_base_url_from_env().ok_or_else(|| {
            Error::NotConfigured("missing SCAMSCOPE_OPENAI_COMPAT_BASE_URL".to_string())
        })?;
        let api_key = openai_compat_api_key_from_env();

        let model = model_override
            .or_else(openai_compat_model_from_env)
            .ok_or_else(|| {
                Error::NotConfigured(
                    "missing model for openai_compat (pass --model or set SCAMSCOPE_OPENAI_COMPAT_MODEL)"
                        .to_string(),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
            timeout_ms: openai_compat_timeout_ms_from_env(),
        })
    }

    /// Override the request deadline; clamped like `SCAMSCOPE_OPENAI_COMPAT_TIMEOUT_MS`.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = crate::clamp_request_timeout_ms(timeout_ms);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_chat_completions(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl ModelBackend for OpenAiCompatClient {
    fn name(&self) -> &'static str {
        "openai_compat"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        // The analysis prompt is self-contained, so it goes out as a single user turn.
        let req = ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: None,
            stream: Some(false),
        };

        let mut rb = self
            .client
            .post(self.endpoint_chat_completions())
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(k) = &self.api_key {
            rb = rb.header(reqwest::header::AUTHORIZATION, format!("Bearer {k}"));
        }

        let resp = rb
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Llm(format!(
                "openai_compat chat.completions HTTP {status}"
            )));
        }

        let parsed: ChatCompletionsResponse =
            resp.json().await.map_err(|e| Error::Llm(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(Error::Llm(
                "openai_compat returned an empty response".to_string(),
            ));
        }
        Ok(content)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
