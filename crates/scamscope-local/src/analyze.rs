//! Prompt/response orchestration.
//!
//! One call = one prompt = one parse. No retries and no caching: each analysis is independent,
//! and every failure comes back as an `AnalysisOutcome::Failure` instead of an `Err`.

use crate::prompt::build_analysis_prompt;
use scamscope_core::{AnalysisOutcome, AnalysisReport, ModelBackend};
use std::time::Instant;

pub const PARSE_ERROR: &str = "Failed to parse AI response";

/// Strip markdown code fences a model sometimes wraps JSON in.
///
/// Removes a leading ```` ```json ```` or ```` ``` ```` marker and a trailing ```` ``` ````
/// marker, trimming whitespace around each step.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Parse a raw model reply into an outcome. Parse failures keep the stripped text for
/// diagnostics.
pub fn parse_analysis(raw: &str) -> AnalysisOutcome {
    let stripped = strip_code_fences(raw);
    match serde_json::from_str::<AnalysisReport>(stripped) {
        Ok(report) => AnalysisOutcome::Success(report),
        Err(e) => {
            tracing::warn!(error = %e, reply_chars = stripped.chars().count(), "model reply did not parse");
            AnalysisOutcome::Failure {
                error: PARSE_ERROR.to_string(),
                raw_response: Some(stripped.to_string()),
            }
        }
    }
}

/// Score `text` for scam/misinformation/manipulation risk using `backend`.
pub async fn analyze_text(backend: &dyn ModelBackend, text: &str) -> AnalysisOutcome {
    if text.trim().is_empty() {
        return AnalysisOutcome::failure("no text to analyze");
    }

    let prompt = build_analysis_prompt(text);
    let t0 = Instant::now();
    tracing::debug!(
        provider = backend.name(),
        model = %backend.model(),
        prompt_length = prompt.len(),
        "requesting analysis"
    );

    let reply = match backend.generate(&prompt).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(
                provider = backend.name(),
                model = %backend.model(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                error = %e,
                "model call failed"
            );
            return AnalysisOutcome::failure(e.to_string());
        }
    };

    let outcome = parse_analysis(&reply);
    tracing::info!(
        provider = backend.name(),
        model = %backend.model(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        success = outcome.is_success(),
        "analysis finished"
    );
    outcome
}
