//! HTML annotation of suspicious phrases.
//!
//! Highlights are computed as byte intervals over the *original* text, then the output is built
//! by interleaving escaped literal spans with escaped highlight elements. Every byte of user
//! text goes through [`escape_html`] exactly once, whether or not any phrase matched.
//!
//! Overlap policy: non-overlapping, greedy by first occurrence. Intervals are ordered by start
//! (longer first on ties, then input order) and an interval is kept only if it starts at or
//! after the end of the previously kept one.

use scamscope_core::SuspiciousPhrase;
use serde::Serialize;

pub const CONTAINER_STYLE: &str = "background-color: #1e1e1e; padding: 20px; border-radius: 10px; border: 2px solid #444; font-size: 16px; line-height: 1.8; color: #ffffff;";

pub const HIGHLIGHT_STYLE: &str = "background-color: #ff4444; color: white; padding: 2px 6px; border-radius: 4px; font-weight: bold; cursor: help;";

/// One kept highlight: `text[start..end]` is the exact-cased match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSpan<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
    pub reason: &'a str,
    /// Position of the phrase record in the input sequence.
    pub phrase_index: usize,
}

pub fn push_escaped(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
}

/// Escape text for element content and single- or double-quoted attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    push_escaped(&mut out, s);
    out
}

/// Lowercased copy of `s` plus, for every byte of the copy that starts a char's lowercase
/// expansion, the byte offset of that char in `s`. The final slot maps `lower.len()` to
/// `s.len()`.
fn lower_with_offsets(s: &str) -> (String, Vec<Option<usize>>) {
    let mut lower = String::with_capacity(s.len());
    let mut map = Vec::with_capacity(s.len() + 1);
    for (i, ch) in s.char_indices() {
        let at = lower.len();
        for lc in ch.to_lowercase() {
            lower.push(lc);
        }
        map.push(Some(i));
        map.resize(map.len() + (lower.len() - at - 1), None);
    }
    map.push(Some(s.len()));
    (lower, map)
}

/// First case-insensitive occurrence of `needle` in `haystack`, as a byte range of `haystack`.
///
/// A match must begin and end on whole original characters; a hit that starts or stops
/// inside a multi-char lowercase expansion is skipped and the search continues.
pub fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    let (lower, map) = lower_with_offsets(haystack);
    // Per-char lowering on both sides; `str::to_lowercase` special-cases final sigma.
    let needle_lc: String = needle.chars().flat_map(char::to_lowercase).collect();
    let mut from = 0usize;
    while let Some(rel) = lower[from..].find(&needle_lc) {
        let s = from + rel;
        let e = s + needle_lc.len();
        if let (Some(Some(a)), Some(Some(b))) = (map.get(s), map.get(e)) {
            return Some((*a, *b));
        }
        // Advance one char in the lowercased copy.
        from = s + lower[s..].chars().next().map(char::len_utf8).unwrap_or(1);
    }
    None
}

/// Kept highlight intervals for `phrases` over `text`, sorted by start.
///
/// Blank phrases and phrases that do not occur are skipped silently.
pub fn annotate_spans<'a>(text: &'a str, phrases: &'a [SuspiciousPhrase]) -> Vec<HighlightSpan<'a>> {
    let mut cands: Vec<HighlightSpan<'a>> = phrases
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.phrase.trim().is_empty())
        .filter_map(|(idx, p)| {
            let (start, end) = find_case_insensitive(text, &p.phrase)?;
            Some(HighlightSpan {
                start,
                end,
                text: &text[start..end],
                reason: p.reason.as_str(),
                phrase_index: idx,
            })
        })
        .collect();

    cands.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.end.cmp(&a.end))
            .then_with(|| a.phrase_index.cmp(&b.phrase_index))
    });

    let mut kept: Vec<HighlightSpan<'a>> = Vec::with_capacity(cands.len());
    for c in cands {
        if kept.last().map_or(true, |k| c.start >= k.end) {
            kept.push(c);
        }
    }
    kept
}

/// Render `text` as an HTML fragment with each matched suspicious phrase wrapped in a
/// tooltip-bearing highlight.
pub fn render_annotated(text: &str, phrases: &[SuspiciousPhrase]) -> String {
    let spans = annotate_spans(text, phrases);

    let mut body = String::with_capacity(text.len() + spans.len() * (HIGHLIGHT_STYLE.len() + 64));
    let mut pos = 0usize;
    for s in &spans {
        push_escaped(&mut body, &text[pos..s.start]);
        body.push_str("<span style='");
        body.push_str(HIGHLIGHT_STYLE);
        body.push_str("' title='");
        push_escaped(&mut body, s.reason);
        body.push_str("'>");
        push_escaped(&mut body, s.text);
        body.push_str("</span>");
        pos = s.end;
    }
    push_escaped(&mut body, &text[pos..]);

    format!("<div style='{CONTAINER_STYLE}'>{body}</div>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(phrase: &str, reason: &str) -> SuspiciousPhrase {
        SuspiciousPhrase::new(phrase, reason)
    }

    #[test]
    fn money_request_is_wrapped_with_reason_tooltip() {
        let out = render_annotated("Send $500 now", &[p("$500", "money request")]);
        assert!(out.contains("title='money request'>$500</span>"), "{out}");
        assert!(out.starts_with(&format!("<div style='{CONTAINER_STYLE}'>Send <span style='")));
        assert!(out.ends_with("</span> now</div>"));
    }

    #[test]
    fn empty_phrases_keep_text_inside_container() {
        let out = render_annotated("Hello there, friend", &[]);
        assert_eq!(
            out,
            format!("<div style='{CONTAINER_STYLE}'>Hello there, friend</div>")
        );
    }

    #[test]
    fn empty_phrases_still_escape_markup() {
        // The unhighlighted path used to embed raw user text; it must be escaped too.
        let out = render_annotated("<script>alert(1)</script> & co", &[]);
        assert!(!out.contains("<script>"));
        assert!(out.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; co"));
    }

    #[test]
    fn match_is_case_insensitive_and_keeps_original_casing() {
        let out = render_annotated(
            "URGENT! You WON $50,000 today",
            &[p("you won $50,000", "unsolicited prize")],
        );
        assert!(out.contains(">You WON $50,000</span>"), "{out}");
    }

    #[test]
    fn absent_phrase_is_skipped_without_error() {
        let text = "Meeting moved to 3pm";
        assert_eq!(
            render_annotated(text, &[p("wire transfer", "money")]),
            render_annotated(text, &[])
        );
    }

    #[test]
    fn special_chars_are_escaped_inside_and_around_highlights() {
        let out = render_annotated(
            "Click <a href=x> & win",
            &[p("<a href=x>", "hidden \"link\" isn't safe")],
        );
        assert!(out.contains("Click <span"));
        assert!(out.contains(">&lt;a href=x&gt;</span> &amp; win"));
        assert!(out.contains("title='hidden &quot;link&quot; isn&#x27;t safe'"));
        assert!(!out.contains("<a href"));
    }

    #[test]
    fn highlights_the_occurrence_that_was_found_not_an_escaped_lookalike() {
        // "&" appears escaped earlier; the highlight must land on the real match position.
        let text = "Tom & Jerry. Pay via gift cards & more";
        let phrases = [p("cards & more", "gift card payment")];
        let spans = annotate_spans(text, &phrases);
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].start..spans[0].end], "cards & more");
        let out = render_annotated(text, &phrases);
        assert!(out.contains("Tom &amp; Jerry. Pay via gift <span"));
    }

    #[test]
    fn overlapping_phrases_keep_first_occurrence_greedily() {
        let text = "Act now or lose your account forever";
        let phrases = [
            p("lose your account", "threat"),
            p("Act now or lose", "urgency"),
            p("account forever", "threat"),
        ];
        let kept: Vec<&str> = annotate_spans(text, &phrases)
            .iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(kept, vec!["Act now or lose", "account forever"]);

        let out = render_annotated(text, &phrases);
        assert_eq!(out.matches("<span").count(), 2);
        assert!(!out.contains("title='threat'>lose your account"));
    }

    #[test]
    fn nested_phrase_loses_to_enclosing_one_at_same_start() {
        let text = "Send your bank details today";
        let phrases = [p("Send", "request"), p("Send your bank details", "credentials")];
        let spans = annotate_spans(text, &phrases);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Send your bank details");
        assert_eq!(spans[0].phrase_index, 1);
    }

    #[test]
    fn duplicate_phrases_highlight_once() {
        let out = render_annotated(
            "Pay now. Pay now.",
            &[p("pay now", "urgency"), p("PAY NOW", "urgency again")],
        );
        assert_eq!(out.matches("<span").count(), 1);
    }

    #[test]
    fn blank_phrase_is_ignored() {
        let out = render_annotated("abc", &[p("", "nothing"), p("   ", "spaces")]);
        assert!(!out.contains("<span"));
    }

    #[test]
    fn unicode_case_folding_maps_back_to_original_offsets() {
        // 'İ' lowercases to two chars; offsets must still point into the original.
        let text = "İstanbul PRİZE claim";
        let (s, e) = find_case_insensitive(text, "claim").expect("found");
        assert_eq!(&text[s..e], "claim");
        let (s, e) = find_case_insensitive("ÄRGER Über", "über").expect("found");
        assert_eq!(&"ÄRGER Über"[s..e], "Über");
    }

    proptest! {
        #[test]
        fn output_never_contains_raw_markup_from_user_text(
            text in "[a-zA-Z <>&'\"]{0,60}",
            phrase in "[a-zA-Z <>&]{0,8}",
            reason in "[a-zA-Z <>&'\"]{0,20}",
        ) {
            let out = render_annotated(&text, &[p(&phrase, &reason)]);
            let prefix = format!("<div style='{CONTAINER_STYLE}'>");
            prop_assert!(out.starts_with(&prefix));
            prop_assert!(out.ends_with("</div>"));
            let inner = &out[prefix.len()..out.len() - "</div>".len()];
            // Strip our own highlight markup; whatever remains came from user text.
            let mut stripped = inner.replace("</span>", "");
            while let Some(i) = stripped.find("<span style='") {
                let j = stripped[i..].find("'>").map(|j| i + j + 2).unwrap_or(stripped.len());
                stripped.replace_range(i..j, "");
            }
            prop_assert!(!stripped.contains('<'));
            prop_assert!(!stripped.contains('>'));
        }

        #[test]
        fn rendering_is_deterministic(text in any::<String>(), phrase in any::<String>()) {
            let phrases = [p(&phrase, "r")];
            prop_assert_eq!(render_annotated(&text, &phrases), render_annotated(&text, &phrases));
        }

        #[test]
        fn spans_are_sorted_disjoint_and_on_char_boundaries(
            text in any::<String>(),
            phrases in prop::collection::vec(any::<String>(), 0..6),
        ) {
            let phrases: Vec<SuspiciousPhrase> = phrases.iter().map(|s| p(s, "r")).collect();
            let spans = annotate_spans(&text, &phrases);
            let mut last_end = 0usize;
            for s in &spans {
                prop_assert!(s.start >= last_end);
                prop_assert!(s.start < s.end);
                prop_assert!(text.is_char_boundary(s.start));
                prop_assert!(text.is_char_boundary(s.end));
                last_end = s.end;
            }
        }

        #[test]
        fn substring_of_text_is_always_found(text in "[a-zA-Z ]{1,40}", a in 0usize..40, len in 1usize..10) {
            let a = a.min(text.len() - 1);
            let b = (a + len).min(text.len());
            let needle = text[a..b].to_uppercase();
            prop_assume!(!needle.trim().is_empty());
            prop_assert!(find_case_insensitive(&text, &needle).is_some());
        }
    }
}
