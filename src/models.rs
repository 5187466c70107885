//! Data models for discovered links, extracted articles, and summaries.
//!
//! This module defines the core data structures flowing through the pipeline:
//! - [`ArticleLink`]: An article URL discovered by the link scraper
//! - [`ExtractedArticle`]: The validated output of content extraction
//! - [`ParserStatus`] / [`ParserMethod`]: Extraction outcome classification
//! - [`SummarizedArticle`]: An extracted article with its LLM summary attached
//!
//! An [`ExtractedArticle`] is constructed once per fetch attempt and never
//! mutated afterwards; each browser-fallback attempt produces a fresh record.

use serde::{Deserialize, Serialize};

/// An article link discovered on a source's homepage, listing page, or sitemap.
///
/// Produced by the `scrapers` module; `url` is the uniqueness key.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArticleLink {
    /// Absolute article URL.
    pub url: String,
    /// Best-effort title from the link element, or a URL-derived fallback.
    pub title: String,
    /// Publication date if the listing exposed one (rarely the case).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// Source key, e.g. `"nepalipaisa"`.
    pub source: String,
    /// Human-readable source name, e.g. `"Nepali Paisa"`.
    pub source_name: String,
}

/// Outcome classification for a single extraction attempt.
///
/// `Success` holds iff the cleaned body text exceeds 200 characters and
/// contains at least one Devanagari-range character. The `Fallback*`
/// variants describe the browser-rendering path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserStatus {
    /// Body text passed validation.
    Success,
    /// Standard parse produced no valid body text.
    Failed,
    /// Browser rendering also produced no valid body text.
    FallbackFailed,
    /// Browser rendering itself errored (launch, navigation, crash).
    FallbackError,
    /// No browser-rendering capability is available.
    FallbackUnavailable,
    /// The pipeline hit an unexpected error outside the extractor.
    Error,
}

/// Which fetch path produced the final record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserMethod {
    /// Plain HTTP GET plus HTML parsing.
    Standard,
    /// Headless-browser rendered DOM plus HTML parsing.
    BrowserFallback,
}

/// A fully extracted article, the core output of this crate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractedArticle {
    /// The article URL (identity key).
    pub url: String,
    /// Extracted title; never empty, falls back to URL-derived text.
    pub title: String,
    /// Extracted author, if any selector matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Best-effort ISO-8601 publication date. May be approximate for
    /// Nepali-calendar dates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// NFC-normalized, length-capped body text. Empty on failure.
    pub body_text: String,
    /// Extraction outcome.
    pub parser_status: ParserStatus,
    /// Which fetch path produced this record.
    pub parser_method: ParserMethod,
    /// Error message when `parser_status` is `fallback_error` or `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser_error: Option<String>,
    /// Source key carried over from the discovered link.
    #[serde(default)]
    pub source: String,
    /// Display name carried over from the discovered link.
    #[serde(default)]
    pub source_name: String,
}

impl ExtractedArticle {
    /// True iff this record passed body-text validation.
    pub fn is_success(&self) -> bool {
        self.parser_status == ParserStatus::Success
    }

    /// Attach the source identity from the link that produced this article.
    pub fn with_source(mut self, link: &ArticleLink) -> Self {
        self.source = link.source.clone();
        self.source_name = link.source_name.clone();
        self
    }
}

/// Outcome of one summarization call, successful or not.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SummaryOutcome {
    /// The generated summary; empty on failure.
    pub summary: String,
    /// Whether the API call succeeded and yielded non-empty content.
    pub success: bool,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Call metadata (model, lengths, token usage).
    pub metadata: SummaryMetadata,
}

/// Metadata attached to every summarization outcome.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SummaryMetadata {
    /// Language code the prompt requested ("ne" or "en").
    pub language: String,
    /// Character length of the input body text.
    pub text_length: usize,
    /// Character length of the generated summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_length: Option<usize>,
    /// Model that served the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Total tokens reported by the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

/// An extracted article paired with its summarization outcome.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizedArticle {
    #[serde(flatten)]
    pub article: ExtractedArticle,
    /// The generated summary; empty on failure.
    pub summary: String,
    /// "success" or "error".
    pub summary_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_error: Option<String>,
    pub summary_metadata: SummaryMetadata,
    /// ISO-8601 timestamp of when summarization ran.
    pub summarized_at: String,
}

impl SummarizedArticle {
    pub fn is_success(&self) -> bool {
        self.summary_status == "success" && !self.summary.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article(status: ParserStatus) -> ExtractedArticle {
        ExtractedArticle {
            url: "https://www.nepalipaisa.com/news-detail/87090".to_string(),
            title: "Test".to_string(),
            author: None,
            published: None,
            body_text: String::new(),
            parser_status: status,
            parser_method: ParserMethod::Standard,
            parser_error: None,
            source: "nepalipaisa".to_string(),
            source_name: "Nepali Paisa".to_string(),
        }
    }

    #[test]
    fn test_parser_status_serializes_snake_case() {
        let json = serde_json::to_string(&ParserStatus::FallbackUnavailable).unwrap();
        assert_eq!(json, "\"fallback_unavailable\"");
        let json = serde_json::to_string(&ParserMethod::BrowserFallback).unwrap();
        assert_eq!(json, "\"browser_fallback\"");
    }

    #[test]
    fn test_parser_status_roundtrip() {
        for status in [
            ParserStatus::Success,
            ParserStatus::Failed,
            ParserStatus::FallbackFailed,
            ParserStatus::FallbackError,
            ParserStatus::FallbackUnavailable,
            ParserStatus::Error,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: ParserStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_article_link_deserialization() {
        let json = r#"{
            "url": "https://www.bikashnews.com/story/12345",
            "title": "परीक्षण समाचार",
            "source": "bikashnews",
            "source_name": "Bikash News"
        }"#;
        let link: ArticleLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.source, "bikashnews");
        assert!(link.published.is_none());
    }

    #[test]
    fn test_with_source_copies_identity() {
        let link = ArticleLink {
            url: "https://merolagani.com/NewsDetail.aspx?newsID=1".to_string(),
            title: "t".to_string(),
            published: None,
            source: "merolagani".to_string(),
            source_name: "Mero Lagani".to_string(),
        };
        let article = sample_article(ParserStatus::Failed).with_source(&link);
        assert_eq!(article.source, "merolagani");
        assert_eq!(article.source_name, "Mero Lagani");
    }

    #[test]
    fn test_is_success() {
        assert!(sample_article(ParserStatus::Success).is_success());
        assert!(!sample_article(ParserStatus::FallbackFailed).is_success());
    }

    #[test]
    fn test_none_fields_are_omitted() {
        let json = serde_json::to_string(&sample_article(ParserStatus::Failed)).unwrap();
        assert!(!json.contains("parser_error"));
        assert!(!json.contains("author"));
        assert!(json.contains("\"parser_status\":\"failed\""));
    }
}
