//! Gemini (Generative Language API) backend.
//!
//! Text generation is the default analysis backend. With the `vision-gemini` feature the same
//! client can also read text out of an image, used when local OCR is unavailable.
//!
//! Notes:
//! - This runs over HTTP (reqwest) and is async. Do not call it from synchronous extraction
//!   helpers.
//! - The API key travels in the query string like most samples; never log the URL.

use scamscope_core::{Error, ModelBackend, Result};
use serde::Serialize;

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn gemini_api_key_from_env() -> Option<String> {
    env("SCAMSCOPE_GEMINI_API_KEY")
        .or_else(|| env("GEMINI_API_KEY"))
        .or_else(|| env("GOOGLE_API_KEY"))
}

pub fn gemini_model_from_env() -> String {
    env("SCAMSCOPE_GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string())
}

pub fn gemini_timeout_ms_from_env() -> u64 {
    env("SCAMSCOPE_GEMINI_TIMEOUT_MS")
        .and_then(|s| s.parse::<u64>().ok())
        .map_or(60_000, crate::clamp_request_timeout_ms)
}

fn gemini_base_url_from_env() -> String {
    env("SCAMSCOPE_GEMINI_BASE_URL")
        .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string())
}

#[derive(Debug, Serialize)]
struct ReqPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct ReqContent {
    parts: Vec<ReqPart>,
}

#[derive(Debug, Serialize)]
struct GenCfg {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GeminiReq {
    contents: Vec<ReqContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenCfg>,
}

/// Concatenate `candidates[0].content.parts[*].text`.
fn candidate_text(v: &serde_json::Value) -> String {
    let mut out = String::new();
    let parts = v
        .get("candidates")
        .and_then(|x| x.as_array())
        .and_then(|c| c.first())
        .and_then(|c0| c0.get("content"))
        .and_then(|x| x.get("parts"))
        .and_then(|x| x.as_array());
    for p in parts.into_iter().flatten() {
        if let Some(t) = p.get("text").and_then(|x| x.as_str()) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(t);
        }
    }
    out
}

fn api_error_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_ms: u64,
}

impl GeminiClient {
    pub fn from_env(client: reqwest::Client, model_override: Option<String>) -> Result<Self> {
        let api_key = gemini_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured(
                "missing SCAMSCOPE_GEMINI_API_KEY (or GEMINI_API_KEY / GOOGLE_API_KEY)".to_string(),
            )
        })?;
        Ok(Self {
            client,
            api_key,
            model: model_override.unwrap_or_else(gemini_model_from_env),
            base_url: gemini_base_url_from_env(),
            timeout_ms: gemini_timeout_ms_from_env(),
        })
    }

    /// Override the request deadline; clamped like `SCAMSCOPE_GEMINI_TIMEOUT_MS`.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = crate::clamp_request_timeout_ms(timeout_ms);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_generate(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate_content(&self, req: &GeminiReq) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint_generate())
            .query(&[("key", self.api_key.as_str())])
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .json(req)
            .send()
            .await
            // Strip the URL: it carries the API key.
            .map_err(|e| Error::Llm(format!("gemini request failed: {}", e.without_url())))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Llm(match api_error_message(&body) {
                Some(msg) => format!("gemini generateContent HTTP {status}: {msg}"),
                None => format!("gemini generateContent HTTP {status}"),
            }));
        }

        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::Llm(format!("gemini bad json: {}", e.without_url())))?;
        if let Some(reason) = v
            .get("promptFeedback")
            .and_then(|x| x.get("blockReason"))
            .and_then(|x| x.as_str())
        {
            return Err(Error::Llm(format!("gemini blocked the prompt: {reason}")));
        }
        let out = candidate_text(&v);
        if out.chars().any(|c| !c.is_whitespace()) {
            Ok(out)
        } else {
            Err(Error::Llm("gemini returned an empty response".to_string()))
        }
    }

    /// Read the text out of an image (vision fallback for OCR).
    #[cfg(feature = "vision-gemini")]
    pub async fn image_to_text(&self, bytes: &[u8], mime_type: &str) -> Result<String> {
        use base64::Engine;

        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        let req = GeminiReq {
            contents: vec![ReqContent {
                parts: vec![
                    ReqPart {
                        text: Some(
                            "Extract the readable text from this image. Return only the text."
                                .to_string(),
                        ),
                        inline_data: None,
                    },
                    ReqPart {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: mime_type.to_string(),
                            data,
                        }),
                    },
                ],
            }],
            generation_config: Some(GenCfg {
                temperature: Some(0.0),
                max_output_tokens: Some(2048),
            }),
        };
        self.generate_content(&req).await
    }
}

#[async_trait::async_trait]
impl ModelBackend for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let req = GeminiReq {
            contents: vec![ReqContent {
                parts: vec![ReqPart {
                    text: Some(prompt.to_string()),
                    inline_data: None,
                }],
            }],
            generation_config: None,
        };
        self.generate_content(&req).await
    }
}
