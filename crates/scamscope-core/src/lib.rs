use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("llm failed: {0}")]
    Llm(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("extraction failed: {0}")]
    Extract(String),
    #[error("quiz: {0}")]
    Quiz(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Remote model boundary: one prompt in, one text reply out.
///
/// Implementations must surface transport/auth/quota failures as `Error::Llm` (or
/// `Error::NotConfigured`) rather than panicking; the orchestrator turns them into a
/// failure outcome.
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn model(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// The five fixed risk dimensions scored by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Phishing,
    FinancialScam,
    Misinformation,
    EmotionalManipulation,
    UrgencyTactics,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Phishing,
        Category::FinancialScam,
        Category::Misinformation,
        Category::EmotionalManipulation,
        Category::UrgencyTactics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Phishing => "phishing",
            Category::FinancialScam => "financial_scam",
            Category::Misinformation => "misinformation",
            Category::EmotionalManipulation => "emotional_manipulation",
            Category::UrgencyTactics => "urgency_tactics",
        }
    }

    /// Human label ("financial_scam" -> "Financial Scam").
    pub fn label(self) -> &'static str {
        match self {
            Category::Phishing => "Phishing",
            Category::FinancialScam => "Financial Scam",
            Category::Misinformation => "Misinformation",
            Category::EmotionalManipulation => "Emotional Manipulation",
            Category::UrgencyTactics => "Urgency Tactics",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScore {
    Int(i64),
    Float(f64),
}

// Models occasionally answer `72.5` instead of `72`; accept any JSON number.
fn de_score<'de, D>(d: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match RawScore::deserialize(d)? {
        RawScore::Int(n) => n,
        RawScore::Float(x) => x.round() as i64,
    })
}

/// Per-category scores. Missing keys default to 0; values are kept as returned and only
/// clamped to 0..=100 by presentation code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    #[serde(default, deserialize_with = "de_score")]
    pub phishing: i64,
    #[serde(default, deserialize_with = "de_score")]
    pub financial_scam: i64,
    #[serde(default, deserialize_with = "de_score")]
    pub misinformation: i64,
    #[serde(default, deserialize_with = "de_score")]
    pub emotional_manipulation: i64,
    #[serde(default, deserialize_with = "de_score")]
    pub urgency_tactics: i64,
}

impl CategoryScores {
    pub fn get(&self, c: Category) -> i64 {
        match c {
            Category::Phishing => self.phishing,
            Category::FinancialScam => self.financial_scam,
            Category::Misinformation => self.misinformation,
            Category::EmotionalManipulation => self.emotional_manipulation,
            Category::UrgencyTactics => self.urgency_tactics,
        }
    }

    /// Fixed display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, i64)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Red flag severity. Unknown strings are preserved rather than rejected so a sloppy model
/// reply still renders (with a neutral marker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Other(String),
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            _ => Severity::Other(s),
        }
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        s.as_str().to_string()
    }
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlag {
    pub flag: String,
    pub severity: Severity,
    #[serde(default)]
    pub explanation: String,
}

/// A literal span of the analysed text flagged by the model.
///
/// `phrase` is expected (not guaranteed) to occur in the source text, matched
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspiciousPhrase {
    pub phrase: String,
    #[serde(default)]
    pub reason: String,
}

impl SuspiciousPhrase {
    pub fn new(phrase: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            reason: reason.into(),
        }
    }
}

/// Structured payload of a successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(deserialize_with = "de_score")]
    pub overall_confidence_score: i64,
    #[serde(default)]
    pub overall_assessment: String,
    #[serde(default)]
    pub category_scores: CategoryScores,
    #[serde(default)]
    pub red_flags: Vec<RedFlag>,
    #[serde(default)]
    pub suspicious_phrases: Vec<SuspiciousPhrase>,
    #[serde(default)]
    pub recommendation: String,
    pub is_safe: bool,
}

impl AnalysisReport {
    /// Overall score clamped to 0..=100.
    pub fn score(&self) -> u8 {
        clamp_score(self.overall_confidence_score)
    }
}

pub fn clamp_score(n: i64) -> u8 {
    n.clamp(0, 100) as u8
}

/// Per-request analysis result. Serializes as
/// `{"success": true, "data": {...}}` or `{"success": false, "error": "...", "raw_response": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "OutcomeWire", try_from = "OutcomeWire")]
pub enum AnalysisOutcome {
    Success(AnalysisReport),
    Failure {
        error: String,
        raw_response: Option<String>,
    },
}

impl AnalysisOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        AnalysisOutcome::Failure {
            error: error.into(),
            raw_response: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            AnalysisOutcome::Success(r) => Some(r),
            AnalysisOutcome::Failure { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OutcomeWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<AnalysisReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw_response: Option<String>,
}

impl From<AnalysisOutcome> for OutcomeWire {
    fn from(o: AnalysisOutcome) -> Self {
        match o {
            AnalysisOutcome::Success(r) => OutcomeWire {
                success: true,
                data: Some(r),
                error: None,
                raw_response: None,
            },
            AnalysisOutcome::Failure {
                error,
                raw_response,
            } => OutcomeWire {
                success: false,
                data: None,
                error: Some(error),
                raw_response,
            },
        }
    }
}

impl TryFrom<OutcomeWire> for AnalysisOutcome {
    type Error = String;

    fn try_from(w: OutcomeWire) -> std::result::Result<Self, Self::Error> {
        if w.success {
            w.data
                .map(AnalysisOutcome::Success)
                .ok_or_else(|| "success outcome without data".to_string())
        } else {
            Ok(AnalysisOutcome::Failure {
                error: w.error.unwrap_or_default(),
                raw_response: w.raw_response,
            })
        }
    }
}

/// Expected answer inside a static quiz example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpectedPhrase {
    pub phrase: &'static str,
    pub reason: &'static str,
}

impl From<&ExpectedPhrase> for SuspiciousPhrase {
    fn from(p: &ExpectedPhrase) -> Self {
        SuspiciousPhrase::new(p.phrase, p.reason)
    }
}

/// Static reference message for the phrase-spotting quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizExample {
    pub id: u32,
    pub text: &'static str,
    pub suspicious_phrases: &'static [ExpectedPhrase],
    pub category: &'static str,
    pub risk_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub point: &'static str,
    pub suspicious_detail: &'static str,
    pub legitimate_detail: &'static str,
}

/// A suspicious message next to its legitimate counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComparisonExample {
    pub id: u32,
    pub category: &'static str,
    pub suspicious: &'static str,
    pub legitimate: &'static str,
    pub differences: &'static [Difference],
}
