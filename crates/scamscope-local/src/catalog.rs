//! Static learning content: quiz examples, side-by-side comparisons and the red-flags guide.

use scamscope_core::{ComparisonExample, Difference, ExpectedPhrase, QuizExample};

const fn p(phrase: &'static str, reason: &'static str) -> ExpectedPhrase {
    ExpectedPhrase { phrase, reason }
}

const fn d(
    point: &'static str,
    suspicious_detail: &'static str,
    legitimate_detail: &'static str,
) -> Difference {
    Difference {
        point,
        suspicious_detail,
        legitimate_detail,
    }
}

pub static QUIZ_EXAMPLES: &[QuizExample] = &[
    QuizExample {
        id: 1,
        text: "CONGRATULATIONS! You've been selected to receive $5,000 cash prize! Click here NOW to claim within 24 hours or forfeit your winnings forever!",
        suspicious_phrases: &[
            p("CONGRATULATIONS!", "Excessive enthusiasm with ALL CAPS to grab attention - common in scam messages"),
            p("$5,000 cash prize", "Unsolicited prize claim - you didn't enter any contest"),
            p("Click here NOW", "Urgent call to action pressuring immediate response"),
            p("within 24 hours", "Artificial deadline to prevent verification and create FOMO"),
            p("forfeit your winnings forever", "Fear-based pressure tactic threatening loss"),
        ],
        category: "Lottery Scam",
        risk_score: 95,
    },
    QuizExample {
        id: 2,
        text: "Your Amazon account has been compromised. Verify your identity immediately at amazon-security-check.com or your account will be permanently suspended.",
        suspicious_phrases: &[
            p("has been compromised", "Creates fear and urgency without providing specific details"),
            p("immediately", "Pressures instant action to prevent careful thinking"),
            p("amazon-security-check.com", "Suspicious domain - real Amazon uses amazon.com, not third-party domains"),
            p("permanently suspended", "Threat of severe consequences to induce panic"),
        ],
        category: "Phishing Attack",
        risk_score: 90,
    },
    QuizExample {
        id: 3,
        text: "Investment opportunity! Make $10,000 per week working from home. No experience needed. Limited spots available - join now!",
        suspicious_phrases: &[
            p("$10,000 per week", "Unrealistic income promise - too good to be true"),
            p("No experience needed", "High pay with no requirements is a major red flag"),
            p("Limited spots available", "Artificial scarcity to pressure quick decisions"),
            p("join now", "Urgent call to action without providing real details"),
        ],
        category: "Financial Scam",
        risk_score: 85,
    },
    QuizExample {
        id: 4,
        text: "IRS NOTICE: You owe $3,247 in back taxes. Pay immediately via gift cards to avoid arrest. Call 1-800-FAKE-IRS.",
        suspicious_phrases: &[
            p("IRS NOTICE:", "Government impersonation - IRS doesn't contact via random messages"),
            p("Pay immediately", "Urgent payment demand without proper documentation"),
            p("via gift cards", "MAJOR RED FLAG - legitimate organizations NEVER request gift card payments"),
            p("avoid arrest", "Threatening consequences to create fear and panic"),
        ],
        category: "Government Impersonation",
        risk_score: 98,
    },
    QuizExample {
        id: 5,
        text: "Hi! I'm a Nigerian prince with $10 million. I need your help transferring funds. You'll receive 20% commission. Send your bank details for verification.",
        suspicious_phrases: &[
            p("Nigerian prince", "Classic internet scam trope - notorious advance-fee fraud"),
            p("$10 million", "Absurdly large amount offered to strangers"),
            p("20% commission", "Unrealistic reward for doing nothing"),
            p("Send your bank details", "Request for sensitive financial information - NEVER share this"),
        ],
        category: "Advance-Fee Fraud",
        risk_score: 92,
    },
];

pub static COMPARISON_EXAMPLES: &[ComparisonExample] = &[
    ComparisonExample {
        id: 1,
        category: "Banking Security Alert",
        suspicious: "URGENT!!! Your bank account will be LOCKED in 2 hours! Click this link immediately to verify: bit.ly/bank123",
        legitimate: "We noticed unusual activity on your account ending in 4567. For your security, please log into your account at www.yourbank.com or call us at 1-800-123-4567. - YourBank Security Team",
        differences: &[
            d("Tone", "ALL CAPS, excessive punctuation (!!!)", "Professional, calm tone"),
            d("Urgency", "Extreme urgency (2 hours), threatens account lockout", "Informational, provides options without pressure"),
            d("Links", "Shortened link (bit.ly) - hides real destination", "Full official website URL (www.yourbank.com)"),
            d("Contact Method", "Forces you to click suspicious link", "Provides official phone number and website"),
            d("Identification", "Generic 'your bank account'", "Specific account number (last 4 digits)"),
        ],
    },
    ComparisonExample {
        id: 2,
        category: "Prize/Lottery Notification",
        suspicious: "WINNER ALERT! You've won $50,000! Claim now before midnight or lose forever! No purchase necessary! Click here!",
        legitimate: "Thank you for participating in our Annual Customer Appreciation Sweepstakes. You have been selected as a finalist. To verify your entry and eligibility, please contact our customer service at 1-800-555-0199 within 30 days. Please reference your confirmation number: #ABC123456. - CompanyName Promotions Department",
        differences: &[
            d("Notification Style", "Declares you a winner without any context", "References specific contest you entered"),
            d("Deadline Pressure", "Extreme urgency (midnight), threatens loss", "Reasonable timeframe (30 days) for response"),
            d("Call to Action", "Suspicious 'click here' link", "Official phone number to call"),
            d("Verification", "No way to verify legitimacy", "Provides confirmation number and company name"),
            d("Language", "Excessive excitement, multiple exclamation points", "Professional, formal communication"),
        ],
    },
    ComparisonExample {
        id: 3,
        category: "Job Opportunity",
        suspicious: "Make $5000/week from home! No experience! No interview! Just send $99 for training materials and start today!",
        legitimate: "We're hiring for a Remote Customer Service position. Starting salary: $45,000-$55,000/year. Requirements: 2+ years customer service experience, reliable internet. Apply at www.company.com/careers or email careers@company.com with your resume. - HR Department, Company Name",
        differences: &[
            d("Compensation", "Unrealistic pay ($5000/week = $260k/year)", "Realistic salary range for the role"),
            d("Requirements", "'No experience needed' for high-paying job", "Clear qualifications and experience required"),
            d("Upfront Payment", "Asks for $99 for 'training materials' - RED FLAG", "No payment required - legitimate employers never charge fees"),
            d("Hiring Process", "No interview, start immediately", "Standard application process mentioned"),
            d("Company Info", "No company name or verifiable contact", "Company name, official email, and website provided"),
        ],
    },
];

pub const COMPARISON_TAKEAWAY: &str = "Legitimate organizations communicate professionally, give you time to verify, provide official contact methods, and never pressure you into immediate action. If you're unsure, always contact the organization directly using contact information from their official website.";

pub fn quiz_by_id(id: u32) -> Option<&'static QuizExample> {
    QUIZ_EXAMPLES.iter().find(|q| q.id == id)
}

pub fn comparison_by_id(id: u32) -> Option<&'static ComparisonExample> {
    COMPARISON_EXAMPLES.iter().find(|c| c.id == id)
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct GuideSection {
    pub icon: &'static str,
    pub title: &'static str,
    pub points: &'static [&'static str],
}

pub static RED_FLAG_GUIDE: &[GuideSection] = &[
    GuideSection {
        icon: "⚠️",
        title: "Urgency Tactics",
        points: &[
            "\"Act now or lose this opportunity!\"",
            "\"Your account will be suspended immediately!\"",
            "Creates panic to make you act without thinking",
        ],
    },
    GuideSection {
        icon: "💰",
        title: "Too Good to Be True",
        points: &[
            "\"Make $10,000 in one week!\"",
            "\"You've won a prize you didn't enter!\"",
            "If it sounds impossible, it probably is",
        ],
    },
    GuideSection {
        icon: "🎣",
        title: "Requests for Personal Info",
        points: &[
            "Asking for passwords, PIN codes, SSN",
            "Legitimate companies never ask via email/text",
        ],
    },
    GuideSection {
        icon: "🔗",
        title: "Suspicious Links",
        points: &[
            "Misspelled URLs (g00gle.com vs google.com)",
            "Shortened links hiding destination",
            "Always hover before clicking!",
        ],
    },
    GuideSection {
        icon: "😱",
        title: "Emotional Manipulation",
        points: &[
            "Fear: \"Your loved one is in danger!\"",
            "Greed: \"Limited time offer!\"",
            "Trust: \"I'm from your bank...\"",
        ],
    },
    GuideSection {
        icon: "🏛️",
        title: "Authority Impersonation",
        points: &[
            "Claims to be from government/bank",
            "Uses official-looking logos",
            "Check sender email carefully",
        ],
    },
];

pub static SAFETY_STEPS: &[(&str, &str)] = &[
    ("Verify before you trust", "Check sources independently"),
    ("Don't click suspicious links", "Type URLs directly"),
    ("Enable 2FA", "Two-factor authentication adds security"),
    ("Trust your instincts", "If something feels off, it probably is"),
    ("Analyze before responding", "Run suspicious messages through `scamscope analyze` first"),
];

pub static REPORTING_LINKS: &[(&str, &str)] = &[
    ("FTC", "https://reportfraud.ftc.gov"),
    ("FBI IC3", "https://www.ic3.gov"),
    ("Your email provider", "Mark as spam/phishing"),
];

/// The guide as plain text, ready for a terminal.
pub fn guide_text() -> String {
    let mut out = String::new();
    out.push_str("Common red flags to watch for\n\n");
    for s in RED_FLAG_GUIDE {
        out.push_str(&format!("{} {}\n", s.icon, s.title));
        for pt in s.points {
            out.push_str(&format!("  - {pt}\n"));
        }
        out.push('\n');
    }
    out.push_str("How to stay safe\n\n");
    for (i, (head, body)) in SAFETY_STEPS.iter().enumerate() {
        out.push_str(&format!("  {}. {head}: {body}\n", i + 1));
    }
    out.push_str("\nReport scams\n\n");
    for (who, where_) in REPORTING_LINKS {
        out.push_str(&format!("  - {who}: {where_}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_expected_phrase_occurs_in_its_example_text() {
        for q in QUIZ_EXAMPLES {
            assert!(!q.suspicious_phrases.is_empty(), "quiz {} has no phrases", q.id);
            for sp in q.suspicious_phrases {
                assert!(q.text.contains(sp.phrase), "quiz {}: {:?}", q.id, sp.phrase);
            }
        }
    }

    #[test]
    fn ids_are_unique_and_lookup_works() {
        let mut ids: Vec<u32> = QUIZ_EXAMPLES.iter().map(|q| q.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), QUIZ_EXAMPLES.len());
        assert_eq!(quiz_by_id(4).map(|q| q.category), Some("Government Impersonation"));
        assert!(quiz_by_id(99).is_none());
        assert_eq!(comparison_by_id(3).map(|c| c.differences.len()), Some(5));
    }

    #[test]
    fn guide_text_lists_sections_and_reporting_links() {
        let g = guide_text();
        for s in RED_FLAG_GUIDE {
            assert!(g.contains(s.title));
        }
        assert!(g.contains("https://reportfraud.ftc.gov"));
        assert!(g.contains("1. Verify before you trust"));
    }
}
