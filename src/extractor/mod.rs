//! Article content extraction.
//!
//! The flow per URL is: pick a parsing strategy from the host, fetch HTML
//! over plain HTTP, parse and validate; when that fails (or the domain is
//! known to populate its articles client-side), render the page in a
//! headless browser and parse the rendered DOM instead. The browser path is
//! attempted at most once per URL, and no per-URL failure ever escapes as an
//! error: every outcome is an [`ExtractedArticle`] with a status.

pub mod bikashnews;
pub mod browser;
pub mod fetch;
pub mod generic;
pub mod merolagani;
pub mod metadata;
pub mod patterns;
pub mod text;

use scraper::Html;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::ExtractorSettings;
use crate::models::{ExtractedArticle, ParserMethod, ParserStatus};
use crate::utils::host_of;
use browser::{PageRenderer, RenderOptions};
use fetch::Fetcher;
use text::{clean_article_content, has_devanagari, truncate_body};

/// Body-extraction strategy, chosen per host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Tiered selector cascade for unknown or well-behaved sites.
    Generic,
    /// bikashnews: PDF-viewer chrome and sidebar filtering.
    Bikashnews,
    /// merolagani: ASP.NET panel with headline-sidebar filtering.
    Merolagani,
}

/// Pick the parsing strategy for a URL.
pub fn strategy_for_url(url: &str) -> Strategy {
    let host = host_of(url);
    if host.contains("bikashnews.com") {
        Strategy::Bikashnews
    } else if host.contains("merolagani.com") {
        Strategy::Merolagani
    } else {
        Strategy::Generic
    }
}

/// Extract the article body using the URL's strategy, cleaned and truncated.
/// Returns an empty string when nothing usable was found.
///
/// The source-specific strategies get the shared boilerplate/dateline
/// cleanup applied here; the generic cascade already runs it per tier.
pub fn extract_body_text(document: &Html, url: &str, max_length: usize) -> String {
    let body = match strategy_for_url(url) {
        Strategy::Bikashnews => bikashnews::extract_bikashnews(document)
            .map(|text| clean_article_content(&text)),
        Strategy::Merolagani => merolagani::extract_merolagani(document)
            .map(|text| clean_article_content(&text)),
        Strategy::Generic => generic::extract_generic(document),
    };
    truncate_body(&body.unwrap_or_default(), max_length)
}

/// Parse a fetched HTML document into an article record.
///
/// Validation: the record is `success` iff the trimmed body exceeds 200
/// characters and contains at least one Devanagari character.
pub fn parse_article_html(
    html: &str,
    url: &str,
    max_body_length: usize,
    method: ParserMethod,
) -> ExtractedArticle {
    let document = Html::parse_document(html);

    let title = metadata::extract_title(&document, url);
    let author = metadata::extract_author(&document);
    let published = metadata::extract_published(&document, url);
    let body_text = extract_body_text(&document, url, max_body_length);

    let is_substantial = body_text.trim().chars().count() > 200;
    let parser_status = if is_substantial && has_devanagari(&body_text) {
        ParserStatus::Success
    } else {
        ParserStatus::Failed
    };

    info!(
        %url,
        status = ?parser_status,
        body_chars = body_text.chars().count(),
        "Parsed article HTML"
    );

    ExtractedArticle {
        url: url.to_string(),
        title,
        author,
        published,
        body_text,
        parser_status,
        parser_method: method,
        parser_error: None,
        source: String::new(),
        source_name: String::new(),
    }
}

/// Per-URL extraction orchestrator: standard fetch first, browser rendering
/// as the one-shot fallback. Both capabilities are injected so tests run
/// against canned HTML.
pub struct ContentExtractor<F, R> {
    fetcher: F,
    renderer: Option<R>,
    max_body_length: usize,
    render_timeout: Duration,
    js_heavy_domains: Vec<String>,
    screenshot_dir: Option<PathBuf>,
}

impl<F: Fetcher, R: PageRenderer> ContentExtractor<F, R> {
    pub fn new(fetcher: F, renderer: Option<R>, settings: &ExtractorSettings) -> Self {
        Self {
            fetcher,
            renderer,
            max_body_length: settings.max_body_length,
            render_timeout: Duration::from_secs(settings.render_timeout_secs),
            js_heavy_domains: settings.js_heavy_domains.clone(),
            screenshot_dir: settings.screenshot_dir.as_ref().map(PathBuf::from),
        }
    }

    fn is_js_heavy(&self, url: &str) -> bool {
        let host = host_of(url);
        self.js_heavy_domains
            .iter()
            .any(|domain| host.contains(domain.as_str()))
    }

    /// Extract one article. Never returns an error: every failure mode is
    /// encoded in the record's `parser_status`.
    #[instrument(level = "info", skip(self))]
    pub async fn extract(&self, url: &str) -> ExtractedArticle {
        if self.is_js_heavy(url) {
            info!(%url, "Domain is JS-heavy; going straight to browser rendering");
            return self.extract_rendered(url, None).await;
        }

        match self.fetcher.fetch(url).await {
            Ok(html) => {
                let article =
                    parse_article_html(&html, url, self.max_body_length, ParserMethod::Standard);
                if article.is_success() {
                    return article;
                }
                warn!(%url, "Standard parse did not validate; trying browser fallback");
                self.extract_rendered(url, Some(article)).await
            }
            Err(e) => {
                warn!(%url, error = %e, "Standard fetch failed; trying browser fallback");
                self.extract_rendered(url, None).await
            }
        }
    }

    /// The browser-rendered path, attempted at most once per URL.
    /// `standard` carries the failed standard-parse record, if one exists,
    /// so its metadata survives when rendering cannot do better.
    async fn extract_rendered(
        &self,
        url: &str,
        standard: Option<ExtractedArticle>,
    ) -> ExtractedArticle {
        let Some(renderer) = self.renderer.as_ref() else {
            return degraded(url, standard, ParserStatus::FallbackUnavailable, None);
        };

        let options = RenderOptions::for_url(url, self.render_timeout, self.screenshot_dir.clone());
        match renderer.render(url, &options).await {
            Ok(html) => {
                let mut article = parse_article_html(
                    &html,
                    url,
                    self.max_body_length,
                    ParserMethod::BrowserFallback,
                );
                if !article.is_success() {
                    article.parser_status = ParserStatus::FallbackFailed;
                }
                article
            }
            Err(e) => {
                warn!(%url, error = %e, "Browser rendering failed");
                degraded(url, standard, ParserStatus::FallbackError, Some(e.to_string()))
            }
        }
    }
}

/// Failure record for the fallback path, reusing the standard-parse metadata
/// when available.
fn degraded(
    url: &str,
    standard: Option<ExtractedArticle>,
    status: ParserStatus,
    error: Option<String>,
) -> ExtractedArticle {
    let mut article = standard.unwrap_or_else(|| ExtractedArticle {
        url: url.to_string(),
        title: metadata::title_from_url(url).unwrap_or_else(|| "Unknown Title".to_string()),
        author: None,
        published: None,
        body_text: String::new(),
        parser_status: ParserStatus::Failed,
        parser_method: ParserMethod::BrowserFallback,
        parser_error: None,
        source: String::new(),
        source_name: String::new(),
    });
    article.parser_status = status;
    article.parser_method = ParserMethod::BrowserFallback;
    article.parser_error = error;
    article
}
