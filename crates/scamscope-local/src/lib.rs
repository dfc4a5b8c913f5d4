use scamscope_core::{Error, ModelBackend, Result};

pub mod analyze;
pub mod annotate;
pub mod catalog;
pub mod extract;
pub mod gemini;
pub mod openai_compat;
pub mod present;
pub mod prompt;
pub mod quiz;
pub mod report;
pub mod shellout;

/// Which remote model answers analysis prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAiCompat,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAiCompat => "openai_compat",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai_compat" | "openai" => Ok(Provider::OpenAiCompat),
            _ => Err(Error::InvalidInput(format!(
                "unknown provider {:?} (allowed: gemini, openai-compat)",
                s.trim()
            ))),
        }
    }

    /// `SCAMSCOPE_PROVIDER`, defaulting to Gemini.
    pub fn from_env() -> Result<Self> {
        match std::env::var("SCAMSCOPE_PROVIDER")
            .ok()
            .filter(|s| !s.trim().is_empty())
        {
            Some(s) => Self::parse(&s),
            None => Ok(Provider::Gemini),
        }
    }
}

/// Per-request deadline bounds for model calls, in milliseconds.
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 200;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;

pub(crate) fn clamp_request_timeout_ms(ms: u64) -> u64 {
    ms.clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS)
}

/// Shared HTTP client for model backends.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("scamscope/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::NotConfigured(format!("http client: {e}")))
}

/// Build the configured backend. `timeout_ms` overrides the per-provider env default.
pub fn backend_for(
    provider: Provider,
    client: reqwest::Client,
    model_override: Option<String>,
    timeout_ms: Option<u64>,
) -> Result<Box<dyn ModelBackend>> {
    let backend: Box<dyn ModelBackend> = match provider {
        Provider::Gemini => {
            let mut c = gemini::GeminiClient::from_env(client, model_override)?;
            if let Some(ms) = timeout_ms {
                c = c.with_timeout_ms(ms);
            }
            Box::new(c)
        }
        Provider::OpenAiCompat => {
            let mut c = openai_compat::OpenAiCompatClient::from_env(client, model_override)?;
            if let Some(ms) = timeout_ms {
                c = c.with_timeout_ms(ms);
            }
            Box::new(c)
        }
    };
    tracing::debug!(
        provider = backend.name(),
        model = %backend.model(),
        "model backend ready"
    );
    Ok(backend)
}
