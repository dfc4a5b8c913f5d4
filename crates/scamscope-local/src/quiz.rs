//! Phrase-spotting quiz.
//!
//! A `QuizSession` is owned by whoever drives the interaction (the CLI loop, a test); there is no
//! shared state between sessions.

use scamscope_core::{Error, QuizExample, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Excellent,
    Good,
    KeepLearning,
}

impl Verdict {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 80.0 {
            Verdict::Excellent
        } else if percent >= 50.0 {
            Verdict::Good
        } else {
            Verdict::KeepLearning
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Verdict::Excellent => "🌟 Excellent!",
            Verdict::Good => "👍 Good job!",
            Verdict::KeepLearning => "📚 Keep learning!",
        }
    }
}

/// Marker for an example's stated risk (🔴 ≥80, 🟡 ≥50, 🟢 otherwise).
pub fn quiz_risk_marker(risk_score: u8) -> &'static str {
    if risk_score >= 80 {
        "🔴"
    } else if risk_score >= 50 {
        "🟡"
    } else {
        "🟢"
    }
}

/// Case-insensitive "one contains the other".
fn overlaps(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseResult {
    pub phrase: &'static str,
    pub reason: &'static str,
    pub was_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub percent: f64,
    pub verdict: Verdict,
    pub phrases: Vec<PhraseResult>,
}

/// Score `selections` against an example's expected phrases.
///
/// A selection is correct when it and some expected phrase contain one another. Each selection
/// counts once, so selecting both halves of one phrase counts twice; the percent is not capped.
pub fn score_selections(example: &QuizExample, selections: &[String]) -> QuizScore {
    let expected = example.suspicious_phrases;
    let correct = selections
        .iter()
        .filter(|sel| expected.iter().any(|e| overlaps(sel, e.phrase)))
        .count();
    let total = expected.len();
    let percent = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };
    let phrases = expected
        .iter()
        .map(|e| PhraseResult {
            phrase: e.phrase,
            reason: e.reason,
            was_selected: selections.iter().any(|sel| overlaps(e.phrase, sel)),
        })
        .collect();
    QuizScore {
        correct,
        total,
        percent,
        verdict: Verdict::from_percent(percent),
        phrases,
    }
}

#[derive(Debug, Default)]
pub struct QuizSession {
    active: Option<&'static QuizExample>,
    selections: Vec<String>,
    revealed: bool,
    cumulative_percent: f64,
    quizzes_taken: u32,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, example: &'static QuizExample) {
        self.active = Some(example);
        self.selections.clear();
        self.revealed = false;
    }

    /// Move on to another example; counters are kept.
    pub fn next(&mut self, example: &'static QuizExample) {
        self.start(example);
    }

    /// Leave quiz mode; counters are kept.
    pub fn exit(&mut self) {
        self.active = None;
        self.selections.clear();
        self.revealed = false;
    }

    pub fn active(&self) -> Option<&'static QuizExample> {
        self.active
    }

    pub fn selections(&self) -> &[String] {
        &self.selections
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn quizzes_taken(&self) -> u32 {
        self.quizzes_taken
    }

    fn require_active(&self) -> Result<&'static QuizExample> {
        self.active
            .ok_or_else(|| Error::Quiz("no active quiz".to_string()))
    }

    pub fn words(&self) -> Vec<&'static str> {
        self.active
            .map(|q| q.text.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Toggle the word at `index`.
    ///
    /// If the word belongs to an expected phrase, the whole phrase is toggled; otherwise the bare
    /// word is. Returns the toggled selection and whether it is now selected.
    pub fn toggle_word(&mut self, index: usize) -> Result<(String, bool)> {
        let quiz = self.require_active()?;
        if self.revealed {
            return Err(Error::Quiz("answers already revealed".to_string()));
        }
        let words = self.words();
        let word = *words.get(index).ok_or_else(|| {
            Error::Quiz(format!(
                "word index {index} out of range (message has {} words)",
                words.len()
            ))
        })?;

        let lw = word.to_lowercase();
        let target = quiz
            .suspicious_phrases
            .iter()
            .find(|sp| sp.phrase.to_lowercase().contains(&lw))
            .map(|sp| sp.phrase)
            .unwrap_or(word)
            .to_string();

        if let Some(pos) = self.selections.iter().position(|s| *s == target) {
            self.selections.remove(pos);
            Ok((target, false))
        } else {
            self.selections.push(target.clone());
            Ok((target, true))
        }
    }

    /// Score the current selections and fold the result into the running average.
    pub fn reveal(&mut self) -> Result<QuizScore> {
        let quiz = self.require_active()?;
        if self.revealed {
            return Err(Error::Quiz("answers already revealed".to_string()));
        }
        let score = score_selections(quiz, &self.selections);
        self.revealed = true;
        self.cumulative_percent += score.percent;
        self.quizzes_taken += 1;
        Ok(score)
    }

    /// Mean percent across revealed quizzes.
    pub fn average_percent(&self) -> Option<f64> {
        (self.quizzes_taken > 0).then(|| self.cumulative_percent / self.quizzes_taken as f64)
    }
}
