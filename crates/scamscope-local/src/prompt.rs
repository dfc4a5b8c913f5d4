//! The fixed analysis prompt.
//!
//! The rubric, JSON schema and calibration examples are constant; only the analysed text is
//! substituted. Keep the JSON keys in sync with `scamscope_core::AnalysisReport`.

const PREAMBLE: &str = r#"You are a digital literacy expert. Analyze the following text for potential scams, misinformation, and manipulation tactics.

IMPORTANT SCORING GUIDELINES:
- Be realistic and context-aware. Not all urgency or emotional language is malicious.
- Legitimate marketing uses urgency, discounts, and emotional appeals - this is NORMAL.
- Only flag phrases that are genuinely deceptive or manipulative, not standard business communication.
- Consider the CONTEXT and SOURCE when scoring:
  * Known legitimate brands (Nike, Amazon, banks) using official domains = LOW RISK
  * Unknown senders requesting money/personal info = HIGH RISK
  * Unrealistic promises from unknown sources = HIGH RISK

SCORING SCALE (be strict about these thresholds):
- 0-20: Safe - Normal communication, standard marketing, legitimate business
- 21-40: Low Risk - Some caution needed, verify sender but likely legitimate
- 41-60: Medium Risk - Multiple red flags, proceed with caution, verify carefully
- 61-80: High Risk - Strong scam indicators, likely fraudulent
- 81-100: Critical Risk - Definite scam, do not engage

PHRASE FLAGGING RULES:
- Only flag phrases that are ACTUALLY suspicious in context
- Don't flag normal business language like "limited time", "sale", "discount" from legitimate sources
- DO flag: unrealistic promises, requests for money from strangers, suspicious URLs, authority impersonation
- Consider the SEVERITY: not everything is a red flag, some things are just "be aware"

TEXT TO ANALYZE:
"#;

const SCHEMA_AND_CALIBRATION: &str = r#"

Provide a detailed analysis in the following JSON format:

{
    "overall_confidence_score": <number 0-100, be realistic - most legitimate marketing should score 10-25>,
    "overall_assessment": "<brief summary of the text's trustworthiness>",
    "category_scores": {
        "phishing": <0-100, only high if suspicious URLs or credential requests>,
        "financial_scam": <0-100, only high if unrealistic money promises or requests from strangers>,
        "misinformation": <0-100, only high if verifiable false claims>,
        "emotional_manipulation": <0-100, standard marketing emotion is LOW, extreme manipulation is HIGH>,
        "urgency_tactics": <0-100, normal business deadlines are LOW (20-30), extreme pressure is HIGH>
    },
    "red_flags": [
        {
            "flag": "<red flag description>",
            "severity": "<low/medium/high - be accurate, not everything is HIGH>",
            "explanation": "<why this is concerning, consider context>"
        }
    ],
    "suspicious_phrases": [
        {
            "phrase": "<exact phrase from text - ONLY include genuinely suspicious phrases>",
            "reason": "<why it's suspicious IN THIS CONTEXT>"
        }
    ],
    "recommendation": "<what the user should do>",
    "is_safe": <true/false>
}

EXAMPLES FOR CALIBRATION:

Example 1 (LEGITIMATE MARKETING - should score ~15):
Text: "LIMITED TIME SALE! 50% off all shoes - Today Only! Shop now: www.nike.com"
- Score: 15 (low risk, normal marketing)
- Urgency_tactics: 30 (normal business urgency)
- Emotional_manipulation: 25 (standard marketing)
- Suspicious phrases: NONE or maybe just note "verify URL matches nike.com"

Example 2 (ACTUAL SCAM - should score ~95):
Text: "URGENT! You won $50,000! Send $500 via Western Union to claim your prize!"
- Score: 95 (critical risk)
- Urgency_tactics: 95
- Financial_scam: 98
- Suspicious phrases: "You won $50,000", "Send $500", "Western Union"

Example 3 (ROMANCE SCAM - should score ~70-85):
Text: "I love you. I need $800 for plane ticket via Western Union. I'll pay you back."
- Score: 75-85 (high risk, not 98)
- Financial_scam: 90
- Emotional_manipulation: 70
- Flag "I need $800" and "Western Union" as HIGH severity
- Flag "I love you" as MEDIUM severity (context matters - fast relationship + money request)
- DON'T flag normal conversational phrases like "I have wonderful news"

Be thorough and accurate. If the text seems safe, reflect that in low scores. Don't over-flag legitimate communication.
"#;

pub fn build_analysis_prompt(text: &str) -> String {
    let mut out = String::with_capacity(PREAMBLE.len() + text.len() + SCHEMA_AND_CALIBRATION.len());
    out.push_str(PREAMBLE);
    out.push_str(text);
    out.push_str(SCHEMA_AND_CALIBRATION);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_between_rubric_and_schema() {
        let p = build_analysis_prompt("Send $500 now");
        let text_at = p.find("TEXT TO ANALYZE:\nSend $500 now\n").expect("text section");
        let schema_at = p.find("\"overall_confidence_score\"").expect("schema");
        assert!(text_at < schema_at);
    }

    #[test]
    fn prompt_is_deterministic_and_names_every_category() {
        assert_eq!(build_analysis_prompt("x"), build_analysis_prompt("x"));
        let p = build_analysis_prompt("x");
        for c in scamscope_core::Category::ALL {
            assert!(p.contains(&format!("\"{}\"", c.as_str())), "missing {c}");
        }
        assert!(p.contains("EXAMPLES FOR CALIBRATION"));
    }
}
