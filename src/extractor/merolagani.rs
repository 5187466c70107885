//! Body extraction for merolagani news pages.
//!
//! The news detail sits in an ASP.NET panel next to a dense sidebar of
//! market headlines, many of which end in question marks. The sidebar is
//! excluded both structurally (class/id indicators, the question-mark
//! heuristic) and textually (known headline and footer fragments).

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::patterns::{
    MEROLAGANI_END_PATTERNS, MEROLAGANI_MAIN_SELECTORS, MEROLAGANI_PARTIAL_UNWANTED,
    MEROLAGANI_SIDEBAR_PHRASES, MEROLAGANI_SKIP_WORDS, PURNA_VIRAM, SIDEBAR_INDICATORS,
};
use super::text::{
    clean_element_text, clean_str, has_devanagari, has_substantial_nepali_content,
    is_navigation_content,
};

static CONTENT_DIV_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[class*=\"content\"], .content").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static LEAF_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p, div").unwrap());

/// Extract and clean the article body from a merolagani page.
pub fn extract_merolagani(document: &Html) -> Option<String> {
    let main = main_article_text(document);
    if main.chars().count() > 100 {
        debug!(length = main.chars().count(), "Using merolagani main container");
        return non_empty(clean_merolagani_content(&main));
    }

    if let Some(container) = document.select(&CONTENT_DIV_SELECTOR).next() {
        let extracted = leaf_fragments(container);
        if extracted.chars().count() > 100 {
            debug!("Using merolagani content-div fallback");
            return non_empty(clean_merolagani_content(&extracted));
        }
    }

    let parts: Vec<String> = document
        .select(&PARAGRAPH_SELECTOR)
        .filter(|p| !is_sidebar_element(*p))
        .map(clean_element_text)
        .filter(|text| {
            text.chars().count() > 30
                && has_substantial_nepali_content(text)
                && !is_navigation_content(text)
                && !is_article_end(text)
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    non_empty(clean_merolagani_content(&parts.join(" ")))
}

/// Main-container pass, filtering text line by line so interleaved sidebar
/// headlines drop out.
fn main_article_text(document: &Html) -> String {
    for (name, selector) in MEROLAGANI_MAIN_SELECTORS.iter() {
        for container in document.select(selector) {
            if is_sidebar_element(container) {
                continue;
            }
            let text = clean_element_text(container);
            if text.chars().count() <= 200 {
                continue;
            }
            let lines: Vec<String> = element_lines(container)
                .into_iter()
                .filter(|line| {
                    line.chars().count() > 30
                        && !is_article_end(line)
                        && !is_sidebar_text(line)
                        && has_devanagari(line)
                })
                .collect();
            if !lines.is_empty() {
                debug!(selector = name, "Found merolagani main article");
                return lines.join(" ");
            }
        }
    }
    String::new()
}

/// Text nodes of an element as individual cleaned lines.
fn element_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(clean_str)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Walk leaf p/div elements of a content container, skipping share buttons
/// and account chrome.
fn leaf_fragments(container: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for element in container.select(&LEAF_SELECTOR) {
        if element.children().any(|c| c.value().is_element()) {
            continue;
        }
        let text = clean_element_text(element);
        if text.chars().count() > 30 && has_devanagari(&text) && !contains_skip_word(&text) {
            parts.push(text);
        }
    }
    if parts.is_empty() {
        parts = element_lines(container)
            .into_iter()
            .filter(|line| {
                line.chars().count() > 30 && has_devanagari(line) && !contains_skip_word(line)
            })
            .collect();
    }
    parts.join(" ")
}

/// Sidebar test: class/id indicators, or a short block carrying several
/// question marks, the shape of the stacked headline widget.
pub fn is_sidebar_element(element: ElementRef<'_>) -> bool {
    let html = element.html().to_lowercase();
    if SIDEBAR_INDICATORS
        .iter()
        .any(|indicator| html.contains(indicator))
    {
        return true;
    }
    let text = clean_element_text(element);
    let question_marks = text.matches('?').count();
    question_marks > 2 && text.chars().count() < 500
}

fn is_sidebar_text(text: &str) -> bool {
    MEROLAGANI_SIDEBAR_PHRASES
        .iter()
        .any(|phrase| text.contains(phrase))
}

fn is_article_end(text: &str) -> bool {
    MEROLAGANI_END_PATTERNS
        .iter()
        .any(|pattern| text.contains(pattern))
}

fn contains_skip_word(text: &str) -> bool {
    let lower = text.to_lowercase();
    MEROLAGANI_SKIP_WORDS.iter().any(|word| lower.contains(word))
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Sentence-level cleanup: drop neighbouring headlines and the publisher
/// footer block.
pub fn clean_merolagani_content(text: &str) -> String {
    let sentences: Vec<&str> = text
        .split(PURNA_VIRAM)
        .map(str::trim)
        .filter(|sentence| {
            !sentence.is_empty()
                && !is_article_end(sentence)
                && !MEROLAGANI_PARTIAL_UNWANTED
                    .iter()
                    .any(|token| sentence.contains(token))
        })
        .collect();
    sentences.join(&PURNA_VIRAM.to_string()).trim().to_string()
}
