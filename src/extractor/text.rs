//! Text normalization and noise classification.
//!
//! Devanagari combining sequences can be miscounted or mismatched unless the
//! text is in canonical composed form, so every fragment is NFC-normalized
//! before any length or pattern test.

use scraper::ElementRef;
use unicode_normalization::UnicodeNormalization;

use super::patterns::{CLEANUP_PATTERNS, DATELINE_RE, NAV_PATTERNS};

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// NFC-normalize and whitespace-collapse a raw string.
pub fn clean_str(text: &str) -> String {
    normalize_whitespace(&text.nfc().collect::<String>())
}

/// Extract the visible text of an element, NFC-normalized with whitespace
/// collapsed.
pub fn clean_element_text(element: ElementRef<'_>) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    clean_str(&joined)
}

/// Number of characters in the Devanagari block (U+0900-U+097F).
pub fn devanagari_count(text: &str) -> usize {
    text.chars()
        .filter(|c| ('\u{0900}'..='\u{097F}').contains(c))
        .count()
}

/// True iff `text` contains at least one Devanagari character.
pub fn has_devanagari(text: &str) -> bool {
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

/// Substantial-Nepali-content test: at least 20 characters overall and more
/// than 5 characters from the Devanagari block.
pub fn has_substantial_nepali_content(text: &str) -> bool {
    if text.chars().count() < 20 {
        return false;
    }
    devanagari_count(text) > 5
}

/// True if the fragment matches a known navigation-menu phrase.
pub fn is_navigation_content(text: &str) -> bool {
    let lower = text.to_lowercase();
    NAV_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

/// Final cleanup applied to the winning candidate: strips boilerplate
/// phrases from both ends, removes one leading dateline (`काठमाडौं :`),
/// and normalizes whitespace.
pub fn clean_article_content(text: &str) -> String {
    let mut cleaned = text.trim().to_string();

    for pattern in CLEANUP_PATTERNS {
        let lower = cleaned.to_lowercase();
        let pattern_lower = pattern.to_lowercase();
        if lower.starts_with(&pattern_lower) {
            cleaned = cleaned[pattern.len()..].trim().to_string();
        }
        let lower = cleaned.to_lowercase();
        if lower.ends_with(&pattern_lower) {
            cleaned = cleaned[..cleaned.len() - pattern.len()].trim().to_string();
        }
    }

    cleaned = DATELINE_RE.replace(&cleaned, "").trim().to_string();

    normalize_whitespace(&cleaned)
}

/// Truncate to `max_length` characters, appending "..." iff the input was
/// longer. The result is therefore at most `max_length + 3` characters.
pub fn truncate_body(text: &str, max_length: usize) -> String {
    if text.chars().count() > max_length {
        let mut cut: String = text.chars().take(max_length).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace_is_idempotent() {
        let inputs = [
            "a  b\t\nc",
            "  काठमाडौं   समाचार  ",
            "",
            "single",
            "\u{00a0}non\u{00a0}breaking", // NBSP is not split by split_whitespace
        ];
        for input in inputs {
            let once = normalize_whitespace(input);
            let twice = normalize_whitespace(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_nfc_is_a_fixed_point() {
        // decomposed ka + vowel sign recomposes, and stays put afterwards
        let decomposed = "क\u{093E}ठमाड\u{094C}\u{0902}";
        let once = clean_str(decomposed);
        let twice = clean_str(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_devanagari_count() {
        assert_eq!(devanagari_count("abc"), 0);
        assert_eq!(devanagari_count("काठमाडौं"), 8);
        assert!(has_devanagari("x का y"));
        assert!(!has_devanagari("plain latin"));
    }

    #[test]
    fn test_substantial_nepali_content() {
        // too short
        assert!(!has_substantial_nepali_content("काठमाडौं"));
        // long enough but latin
        assert!(!has_substantial_nepali_content(
            "a long enough string of plain latin text"
        ));
        assert!(has_substantial_nepali_content(
            "काठमाडौंमा आज शेयर बजार उल्लेख्य रूपमा बढेको छ"
        ));
    }

    #[test]
    fn test_navigation_detection_is_case_insensitive() {
        assert!(is_navigation_content("home news latest news stock market"));
        assert!(is_navigation_content(
            "prefix Home News Latest News Stock Market suffix"
        ));
        assert!(!is_navigation_content("काठमाडौंमा आज बजार बढ्यो"));
    }

    #[test]
    fn test_dateline_is_stripped_once() {
        let cleaned = clean_article_content("काठमाडौं : आज बजार बढ्यो");
        assert_eq!(cleaned, "आज बजार बढ्यो");
        // a colon after the second token is not a dateline
        let cleaned = clean_article_content("बजारको अवस्था : राम्रो छ");
        assert_eq!(cleaned, "बजारको अवस्था : राम्रो छ");
    }

    #[test]
    fn test_boilerplate_stripping() {
        let cleaned = clean_article_content("Related News काठमाडौंमा आज बजार बढ्यो Advertisement");
        assert!(!cleaned.contains("Related News"));
        assert!(!cleaned.contains("Advertisement"));
        assert!(cleaned.contains("बजार"));
    }

    #[test]
    fn test_truncate_body_bound() {
        let long = "क".repeat(120);
        let truncated = truncate_body(&long, 100);
        assert_eq!(truncated.chars().count(), 103);
        assert!(truncated.ends_with("..."));

        let short = "क".repeat(50);
        assert_eq!(truncate_body(&short, 100), short);
        // exact boundary: no marker
        let exact = "क".repeat(100);
        assert!(!truncate_body(&exact, 100).ends_with("..."));
    }
}
