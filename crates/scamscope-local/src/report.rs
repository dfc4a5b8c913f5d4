//! Standalone HTML report for one analysis.
//!
//! Every model-supplied string goes through [`escape_html`]; the analysed text is embedded via
//! [`render_annotated`], which escapes it too.

use crate::annotate::{escape_html, render_annotated};
use crate::present::{
    category_icon, is_suspicious, score_marker, severity_marker, RiskBand,
};
use scamscope_core::{clamp_score, AnalysisOutcome, AnalysisReport};
use std::fmt::Write as _;

const PAGE_STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:880px;margin:2rem auto;padding:0 1rem;background:#111;color:#eee}\
h1,h2{font-weight:600}\
.meter{background:#333;border-radius:6px;height:12px;overflow:hidden}\
.meter>div{background:#ff4444;height:12px}\
.safe{color:#5fd068}.warn{color:#ffb347}.fail{color:#ff6b6b}\
.cats{display:grid;grid-template-columns:repeat(auto-fit,minmax(150px,1fr));gap:12px}\
.cat{background:#1e1e1e;border:1px solid #444;border-radius:8px;padding:10px}\
details{background:#1e1e1e;border:1px solid #444;border-radius:8px;padding:8px 12px;margin:6px 0}\
pre{white-space:pre-wrap;background:#1e1e1e;padding:12px;border-radius:8px}";

fn meter(score: u8) -> String {
    format!("<div class='meter'><div style='width: {score}%'></div></div>")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang='en'>\n<head>\n<meta charset='utf-8'>\n<title>{}</title>\n<style>{PAGE_STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape_html(title)
    )
}

fn success_body(report: &AnalysisReport, text: &str) -> String {
    let score = report.score();
    let suspicious = is_suspicious(report);
    let mut b = String::new();

    let _ = writeln!(
        b,
        "<h1>{} Overall Risk Score: {score}/100 <small>({})</small></h1>",
        score_marker(score),
        RiskBand::from_score(score).label()
    );
    b.push_str(&meter(score));
    let (cls, mark) = if report.is_safe {
        ("safe", "✅")
    } else {
        ("warn", "⚠️")
    };
    let _ = writeln!(
        b,
        "\n<p class='{cls}'>{mark} {}</p>",
        escape_html(&report.overall_assessment)
    );
    let _ = writeln!(
        b,
        "<p>💡 <strong>Recommendation:</strong> {}</p>",
        escape_html(&report.recommendation)
    );

    b.push_str("<h2>📊 Category Breakdown</h2>\n<div class='cats'>\n");
    for (c, raw) in report.category_scores.iter() {
        let s = clamp_score(raw);
        let _ = writeln!(
            b,
            "<div class='cat'><div>{} {}</div><div>{} {s}/100</div>{}</div>",
            category_icon(c),
            c.label(),
            score_marker(s),
            meter(s)
        );
    }
    b.push_str("</div>\n");

    b.push_str("<h2>📝 Annotated Text</h2>\n");
    b.push_str(&render_annotated(text, &report.suspicious_phrases));
    if report.suspicious_phrases.is_empty() {
        b.push_str("\n<p class='safe'>✅ No specific suspicious phrases detected in this text.</p>");
    }
    b.push('\n');

    if report.red_flags.is_empty() {
        b.push_str("<h2>✅ Safety Indicators</h2>\n<p class='safe'>No major warning signs detected in this message.</p>\n");
    } else {
        b.push_str(if suspicious {
            "<h2>🚩 Warning Signs Detected</h2>\n"
        } else {
            "<h2>✅ Why This Message Appears Legitimate</h2>\n<p>While some caution flags were detected, the overall message appears relatively safe.</p>\n"
        });
        let prefix = if suspicious { "" } else { "Caution: " };
        for f in &report.red_flags {
            let _ = writeln!(
                b,
                "<details><summary>{} {} ({prefix}{})</summary><p>{}</p></details>",
                severity_marker(&f.severity),
                escape_html(&f.flag),
                escape_html(&f.severity.as_str().to_uppercase()),
                escape_html(&f.explanation)
            );
        }
    }

    if report.suspicious_phrases.is_empty() {
        b.push_str("<h2>ℹ️ Analysis Summary</h2>\n<p>No specific suspicious phrases were detected.</p>\n");
    } else {
        b.push_str("<h2>🔍 Phrase Analysis</h2>\n");
        for (i, p) in report.suspicious_phrases.iter().enumerate() {
            let _ = writeln!(
                b,
                "<details><summary>⚠️ Phrase {}: &quot;{}&quot;</summary><p>{}</p></details>",
                i + 1,
                escape_html(&p.phrase),
                escape_html(&p.reason)
            );
        }
    }
    b
}

fn failure_body(error: &str, raw_response: Option<&str>) -> String {
    let mut b = format!(
        "<h1 class='fail'>❌ Analysis failed</h1>\n<p>{}</p>\n",
        escape_html(error)
    );
    if let Some(raw) = raw_response {
        let _ = writeln!(
            b,
            "<h2>Raw model response</h2>\n<pre>{}</pre>",
            escape_html(raw)
        );
    }
    b
}

/// Render `outcome` for `text` as a complete HTML document.
pub fn render_report_html(outcome: &AnalysisOutcome, text: &str) -> String {
    match outcome {
        AnalysisOutcome::Success(r) => page("scamscope report", &success_body(r, text)),
        AnalysisOutcome::Failure {
            error,
            raw_response,
        } => page(
            "scamscope report (failed)",
            &failure_body(error, raw_response.as_deref()),
        ),
    }
}
