//! Generic article-body extraction: a tiered cascade of strategies from
//! precise (known article-container selectors) to desperate (the page
//! title). Each tier produces candidates; the first tier that yields any
//! usable candidate wins, and navigation-menu fragments are rejected at
//! every tier.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

use super::patterns::ARTICLE_SELECTORS;
use super::text::{
    clean_article_content, clean_element_text, clean_str, has_substantial_nepali_content,
    is_navigation_content,
};

static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static TEXT_BLOCK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div, span, section, article, p").unwrap());
static PAGE_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// One extraction candidate with enough context to pick a winner and log
/// where it came from.
#[derive(Debug, Clone)]
pub struct ContentCandidate {
    pub text: String,
    pub length: usize,
    pub source: &'static str,
}

impl ContentCandidate {
    fn new(text: String, source: &'static str) -> Self {
        let length = text.chars().count();
        Self {
            text,
            length,
            source,
        }
    }
}

/// Run the cascade and return the cleaned article body, or `None` when no
/// tier produced anything usable.
pub fn extract_generic(document: &Html) -> Option<String> {
    let tiers: [fn(&Html) -> Vec<ContentCandidate>; 5] = [
        article_container_candidates,
        paragraph_candidates,
        text_block_candidates,
        raw_text_candidates,
        page_title_candidates,
    ];

    for tier in tiers {
        let candidates = tier(document);
        if let Some(best) = select_best_candidate(candidates) {
            debug!(
                source = best.source,
                length = best.length,
                "Selected content candidate"
            );
            let cleaned = clean_article_content(&best.text);
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

/// Prefer candidates with substantial Nepali content; within the preferred
/// set the longest wins.
pub fn select_best_candidate(candidates: Vec<ContentCandidate>) -> Option<ContentCandidate> {
    let (nepali, other): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| has_substantial_nepali_content(&c.text));
    let pool = if nepali.is_empty() { other } else { nepali };
    pool.into_iter().max_by_key(|c| c.length)
}

/// Tier 1: known article-container selectors, longest-first per selector.
fn article_container_candidates(document: &Html) -> Vec<ContentCandidate> {
    let mut candidates = Vec::new();
    for (name, selector) in ARTICLE_SELECTORS.iter() {
        for element in document.select(selector) {
            let text = clean_element_text(element);
            if text.chars().count() > 100 && !is_navigation_content(&text) {
                candidates.push(ContentCandidate::new(text, name));
            }
        }
    }
    candidates
}

/// Tier 2: every paragraph longer than 20 characters, concatenated in
/// document order.
fn paragraph_candidates(document: &Html) -> Vec<ContentCandidate> {
    let paragraphs: Vec<String> = document
        .select(&PARAGRAPH_SELECTOR)
        .map(clean_element_text)
        .filter(|text| text.chars().count() > 20 && !is_navigation_content(text))
        .collect();
    let combined = paragraphs.join(" ");
    if combined.chars().count() <= 50 {
        return Vec::new();
    }
    vec![ContentCandidate::new(combined, "paragraphs")]
}

/// Tier 3: any block-ish element carrying substantial Nepali content.
fn text_block_candidates(document: &Html) -> Vec<ContentCandidate> {
    document
        .select(&TEXT_BLOCK_SELECTOR)
        .map(clean_element_text)
        .filter(|text| {
            text.chars().count() > 100
                && has_substantial_nepali_content(text)
                && !is_navigation_content(text)
        })
        .map(|text| ContentCandidate::new(text, "text-blocks"))
        .collect()
}

/// Tier 4: raw text nodes anywhere in the tree, skipping script, style and
/// title content. Catches pages whose markup defeats the selector tiers.
fn raw_text_candidates(document: &Html) -> Vec<ContentCandidate> {
    let mut fragments = Vec::new();
    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let parent_is_invisible = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "title"));
        if parent_is_invisible {
            continue;
        }
        let cleaned = clean_str(text);
        if cleaned.chars().count() > 30
            && has_substantial_nepali_content(&cleaned)
            && !is_navigation_content(&cleaned)
        {
            fragments.push(cleaned);
        }
    }
    let combined = fragments.join(" ");
    if combined.chars().count() <= 50 {
        return Vec::new();
    }
    vec![ContentCandidate::new(combined, "raw-text")]
}

/// Tier 5: the page `<title>`, only when it reads like Nepali prose.
fn page_title_candidates(document: &Html) -> Vec<ContentCandidate> {
    document
        .select(&PAGE_TITLE_SELECTOR)
        .map(clean_element_text)
        .filter(|text| has_substantial_nepali_content(text))
        .map(|text| ContentCandidate::new(text, "page-title"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "काठमाडौं । नेपाल स्टक एक्सचेन्जमा आज कारोबारको अन्त्यसम्म नेप्से परिसूचक उल्लेख्य अंकले बढेको छ । बैंकिङ समूहको सेयरमा चौतर्फी किनमेल देखिएपछि बजार माथि उक्लिएको हो । विश्लेषकहरूका अनुसार लगानीकर्ताको मनोबल फर्किएको संकेत हो ।";

    #[test]
    fn test_article_container_wins_over_paragraphs() {
        let html = Html::parse_document(&format!(
            r#"<html><body>
            <p>यहाँ अलि लामो अनुच्छेद छ जुन बीस अक्षरभन्दा लामो छ।</p>
            <div class="article-content">{BODY}</div>
            </body></html>"#
        ));
        let body = extract_generic(&html).unwrap();
        assert!(body.contains("नेप्से परिसूचक"));
    }

    #[test]
    fn test_paragraph_tier_used_without_known_containers() {
        let html = Html::parse_document(&format!(
            r#"<html><body><main><p>{BODY}</p><p>दोस्रो अनुच्छेदमा थप विवरण समेटिएको छ ।</p></main></body></html>"#
        ));
        let body = extract_generic(&html).unwrap();
        assert!(body.contains("दोस्रो अनुच्छेदमा"));
    }

    #[test]
    fn test_navigation_rejected_even_when_longest() {
        let nav = "Home News Latest News Stock Market ".repeat(10);
        let html = Html::parse_document(&format!(
            r#"<html><body>
            <div class="article-content">{nav}</div>
            <p>{BODY}</p>
            </body></html>"#
        ));
        let body = extract_generic(&html).unwrap();
        assert!(!body.contains("Stock Market"));
        assert!(body.contains("नेप्से"));
    }

    #[test]
    fn test_nepali_candidate_preferred_over_longer_latin() {
        let latin = "lorem ipsum dolor sit amet ".repeat(30);
        let candidates = vec![
            ContentCandidate::new(latin, "a"),
            ContentCandidate::new(BODY.to_string(), "b"),
        ];
        let best = select_best_candidate(candidates).unwrap();
        assert_eq!(best.source, "b");
    }

    #[test]
    fn test_raw_text_tier_handles_bare_markup() {
        // no p, no divs with enough text individually, just loose text
        let html = Html::parse_document(&format!(
            "<html><body>{BODY}<script>var x = 'ignore this script payload entirely';</script></body></html>"
        ));
        let body = extract_generic(&html).unwrap();
        assert!(body.contains("नेप्से"));
        assert!(!body.contains("ignore this"));
    }

    #[test]
    fn test_page_title_is_last_resort() {
        let html = Html::parse_document(
            "<html><head><title>काठमाडौंमा आज सुनको मूल्य बढ्यो भन्ने समाचार</title></head><body></body></html>",
        );
        let body = extract_generic(&html).unwrap();
        assert!(body.contains("सुनको मूल्य"));
    }

    #[test]
    fn test_empty_page_yields_none() {
        let html = Html::parse_document("<html><body><nav>Home</nav></body></html>");
        assert!(extract_generic(&html).is_none());
    }
}
