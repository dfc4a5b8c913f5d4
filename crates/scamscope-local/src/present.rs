//! Presentation helpers shared by the terminal and HTML renderers.

use scamscope_core::{clamp_score, AnalysisOutcome, AnalysisReport, Category, Severity};
use serde::Serialize;

/// Overall scores at or above this are presented as suspicious.
pub const SUSPICIOUS_THRESHOLD: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=20 => RiskBand::Safe,
            21..=40 => RiskBand::Low,
            41..=60 => RiskBand::Medium,
            61..=80 => RiskBand::High,
            _ => RiskBand::Critical,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Safe => "Safe",
            RiskBand::Low => "Low Risk",
            RiskBand::Medium => "Medium Risk",
            RiskBand::High => "High Risk",
            RiskBand::Critical => "Critical Risk",
        }
    }
}

pub fn score_marker(score: u8) -> &'static str {
    match score {
        0..=20 => "🟢",
        21..=40 => "🟡",
        41..=60 => "🟠",
        _ => "🔴",
    }
}

pub fn severity_marker(severity: &Severity) -> &'static str {
    match severity {
        Severity::Low => "🟢",
        Severity::Medium => "🟡",
        Severity::High => "🔴",
        Severity::Other(_) => "⚪",
    }
}

pub fn category_icon(c: Category) -> &'static str {
    match c {
        Category::Phishing => "🎣",
        Category::FinancialScam => "💰",
        Category::Misinformation => "🗞️",
        Category::EmotionalManipulation => "🧠",
        Category::UrgencyTactics => "⚠️",
    }
}

pub fn is_suspicious(report: &AnalysisReport) -> bool {
    report.score() >= SUSPICIOUS_THRESHOLD
}

fn bar(score: u8, width: usize) -> String {
    let filled = (score as usize * width + 50) / 100;
    let mut s = "█".repeat(filled);
    s.push_str(&"░".repeat(width - filled));
    s
}

/// Plain-text rendering of an analysis outcome for the terminal.
pub fn render_outcome_text(outcome: &AnalysisOutcome) -> String {
    let report = match outcome {
        AnalysisOutcome::Success(r) => r,
        AnalysisOutcome::Failure {
            error,
            raw_response,
        } => {
            let mut out = format!("❌ Analysis failed: {error}\n");
            if let Some(raw) = raw_response {
                out.push_str("\nRaw model response:\n");
                out.push_str(raw);
                out.push('\n');
            }
            return out;
        }
    };

    let score = report.score();
    let suspicious = is_suspicious(report);
    let mut out = String::new();
    out.push_str(&format!(
        "{} Overall Risk Score: {score}/100 ({})\n",
        score_marker(score),
        RiskBand::from_score(score).label()
    ));
    out.push_str(&format!("   {}\n\n", bar(score, 30)));
    let mark = if report.is_safe { "✅" } else { "⚠️" };
    out.push_str(&format!("{mark} {}\n", report.overall_assessment));
    out.push_str(&format!("💡 Recommendation: {}\n\n", report.recommendation));

    out.push_str("Category breakdown\n");
    for (c, raw) in report.category_scores.iter() {
        let s = clamp_score(raw);
        out.push_str(&format!(
            "  {} {:<24} {} {:>3}/100 {}\n",
            category_icon(c),
            c.label(),
            score_marker(s),
            s,
            bar(s, 20)
        ));
    }
    out.push('\n');

    if report.red_flags.is_empty() {
        out.push_str("✅ No major warning signs detected in this message.\n");
    } else {
        out.push_str(if suspicious {
            "🚩 Warning Signs Detected\n"
        } else {
            "✅ Safety Indicators (caution flags on an otherwise safe message)\n"
        });
        for f in &report.red_flags {
            out.push_str(&format!(
                "  {} {} ({})\n",
                severity_marker(&f.severity),
                f.flag,
                f.severity.as_str().to_uppercase()
            ));
            if !f.explanation.is_empty() {
                out.push_str(&format!("      {}\n", f.explanation));
            }
        }
    }
    out.push('\n');

    if report.suspicious_phrases.is_empty() {
        out.push_str("ℹ️ No specific suspicious phrases were detected.\n");
    } else {
        out.push_str("🔍 Phrase Analysis\n");
        for (i, p) in report.suspicious_phrases.iter().enumerate() {
            out.push_str(&format!("  ⚠️ Phrase {}: \"{}\"\n", i + 1, p.phrase));
            if !p.reason.is_empty() {
                out.push_str(&format!("      {}\n", p.reason));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scamscope_core::{CategoryScores, RedFlag, SuspiciousPhrase};

    fn report(score: i64) -> AnalysisReport {
        AnalysisReport {
            overall_confidence_score: score,
            overall_assessment: "Looks like a lottery scam.".to_string(),
            category_scores: CategoryScores {
                financial_scam: 98,
                urgency_tactics: 95,
                ..Default::default()
            },
            red_flags: vec![RedFlag {
                flag: "Upfront fee".to_string(),
                severity: Severity::High,
                explanation: "Prizes never cost money.".to_string(),
            }],
            suspicious_phrases: vec![SuspiciousPhrase::new("Send $500", "money request")],
            recommendation: "Delete it.".to_string(),
            is_safe: false,
        }
    }

    #[test]
    fn band_and_marker_boundaries() {
        assert_eq!(RiskBand::from_score(20), RiskBand::Safe);
        assert_eq!(RiskBand::from_score(21), RiskBand::Low);
        assert_eq!(RiskBand::from_score(60), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(80), RiskBand::High);
        assert_eq!(RiskBand::from_score(81), RiskBand::Critical);
        assert_eq!(score_marker(20), "🟢");
        assert_eq!(score_marker(40), "🟡");
        assert_eq!(score_marker(41), "🟠");
        assert_eq!(score_marker(61), "🔴");
        assert_eq!(severity_marker(&Severity::Other("weird".into())), "⚪");
    }

    #[test]
    fn suspicious_threshold_is_fifty() {
        assert!(is_suspicious(&report(50)));
        assert!(!is_suspicious(&report(49)));
    }

    #[test]
    fn bar_is_fixed_width() {
        for s in [0u8, 1, 49, 50, 99, 100] {
            assert_eq!(bar(s, 20).chars().count(), 20);
        }
        assert_eq!(bar(100, 10), "█".repeat(10));
    }

    #[test]
    fn text_rendering_covers_every_section() {
        let t = render_outcome_text(&AnalysisOutcome::Success(report(95)));
        assert!(t.contains("🔴 Overall Risk Score: 95/100 (Critical Risk)"));
        assert!(t.contains("Warning Signs Detected"));
        assert!(t.contains("Upfront fee (HIGH)"));
        assert!(t.contains("Phrase 1: \"Send $500\""));
        assert!(t.contains("Financial Scam"));

        let safe = render_outcome_text(&AnalysisOutcome::Success(report(10)));
        assert!(safe.contains("Safety Indicators"));
    }

    #[test]
    fn failure_rendering_includes_raw_response() {
        let t = render_outcome_text(&AnalysisOutcome::Failure {
            error: "Failed to parse AI response".to_string(),
            raw_response: Some("not json".to_string()),
        });
        assert!(t.starts_with("❌ Analysis failed: Failed to parse AI response"));
        assert!(t.contains("not json"));
    }
}
