//! Summarization via an OpenAI-compatible chat-completions API.
//!
//! The module uses a trait-based design:
//! - [`Summarize`]: core trait defining the async summarization call
//! - [`HttpSummarizer`]: the DeepSeek-compatible HTTP client
//! - [`RetrySummarize`]: decorator adding retry logic to any `Summarize`
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//! - 429 responses honor the server's `retry-after` hint
//!
//! A sliding-window [`RateLimiter`] keeps the pipeline under the provider's
//! per-minute call budget independently of retries.

use rand::{Rng, rng};
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{error, info, instrument, warn};

use crate::config::LlmSettings;
use crate::models::{ExtractedArticle, SummarizedArticle, SummaryMetadata, SummaryOutcome};
use crate::utils::truncate_for_log;

const NEPALI_SYSTEM_PROMPT: &str = "तपाईं एक विशेषज्ञ नेपाली समाचार सारांशकर्ता हुनुहुन्छ। तपाईंको काम नेपाली समाचार लेखहरूलाई छोटो र स्पष्ट सारांशमा रूपान्तरण गर्नु हो।\n\nनिर्देशनहरू:\n- केवल १-२ वाक्यमा सारांश दिनुहोस्\n- नेपाली भाषामा मात्र जवाफ दिनुहोस्\n- मुख्य तथ्यहरू र महत्वपूर्ण जानकारी समावेश गर्नुहोस्\n- अनावश्यक विवरणहरू हटाउनुहोस्\n- स्पष्ट र सरल भाषा प्रयोग गर्नुहोस्\n- एक पटकमा एकै समाचार लेखको सारांश गर्नुहोस्";

const ENGLISH_SYSTEM_PROMPT: &str = "You are an expert Nepali news summarizer. Your job is to create concise summaries of Nepali news articles.\n\nInstructions:\n- Provide summary in exactly 1-2 sentences\n- Respond ONLY in Nepali language (देवनागरी script)\n- Include main facts and important information\n- Remove unnecessary details\n- Use clear and simple language";

fn nepali_user_prompt(title: &str, text: &str) -> String {
    format!(
        "--- समाचार लेख सुरु ---\nशीर्षक: {title}\n\nमुख्य समाचार:\n{text}\n--- समाचार लेख समाप्त ---\n\nकृपया माथिको नेपाली समाचार लेखको १-२ वाक्यमा सारांश दिनुहोस्। केवल नेपाली भाषामा जवाफ दिनुहोस्:"
    )
}

fn english_user_prompt(text: &str) -> String {
    format!(
        "Please provide a 1-2 sentence summary of this Nepali news article in Nepali language:\n\n{text}\n\nSummary (in Nepali only):"
    )
}

/// Summarization failure.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
    #[error("HTTP error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("unexpected API response format: {0}")]
    MalformedResponse(String),
}

impl SummarizeError {
    /// Whether a retry could plausibly succeed.
    fn is_retryable(&self) -> bool {
        match self {
            SummarizeError::Transport(_) | SummarizeError::RateLimited { .. } => true,
            SummarizeError::Api { status, .. } => status.is_server_error(),
            SummarizeError::MalformedResponse(_) => false,
        }
    }
}

/// A successful summarization result, before outcome packaging.
#[derive(Debug, Clone)]
pub struct Summary {
    pub content: String,
    pub model: Option<String>,
    pub tokens_used: Option<u64>,
}

/// Trait for async summarization.
///
/// Implementors send article text to an LLM and return the generated
/// summary. The abstraction allows decorators (like retry logic) and test
/// doubles.
pub trait Summarize {
    async fn summarize(&self, title: &str, text: &str) -> Result<Summary, SummarizeError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

/// DeepSeek-compatible chat-completions client.
pub struct HttpSummarizer {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    language: String,
}

impl HttpSummarizer {
    pub fn new(api_key: String, settings: &LlmSettings) -> Result<Self, SummarizeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            language: settings.language.clone(),
        })
    }

    fn request_body<'a>(&'a self, title: &str, text: &str) -> ChatRequest<'a> {
        let (system, user) = if self.language == "ne" {
            (NEPALI_SYSTEM_PROMPT, nepali_user_prompt(title, text))
        } else {
            (ENGLISH_SYSTEM_PROMPT, english_user_prompt(text))
        };
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

impl fmt::Debug for HttpSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSummarizer")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl Summarize for HttpSummarizer {
    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    async fn summarize(&self, title: &str, text: &str) -> Result<Summary, SummarizeError> {
        let response = self
            .client
            .post(&self.api_url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&self.request_body(title, text))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            warn!(retry_after, "Rate limited by API");
            return Err(SummarizeError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = truncate_for_log(&response.text().await.unwrap_or_default(), 500);
            return Err(SummarizeError::Api { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                SummarizeError::MalformedResponse("no non-empty choices in response".to_string())
            })?
            .to_string();

        info!(summary_chars = content.chars().count(), "Generated summary");
        Ok(Summary {
            content,
            model: parsed.model,
            tokens_used: parsed.usage.map(|u| u.total_tokens),
        })
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Summarize`]
/// implementation.
pub struct RetrySummarize<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T: Summarize> RetrySummarize<T> {
    pub fn new(inner: T, max_retries: usize) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetrySummarize<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrySummarize")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: Summarize> Summarize for RetrySummarize<T> {
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, title: &str, text: &str) -> Result<Summary, SummarizeError> {
        let mut attempt = 0usize;
        loop {
            match self.inner.summarize(title, text).await {
                Ok(summary) => return Ok(summary),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(attempt, max = self.max_retries, error = %e, "summarize() exhausted retries");
                        return Err(e);
                    }

                    let delay = match &e {
                        SummarizeError::RateLimited { retry_after } => {
                            Duration::from_secs((*retry_after).min(60))
                        }
                        _ => {
                            let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                            if delay > self.max_delay {
                                delay = self.max_delay;
                            }
                            delay
                        }
                    };
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(attempt, max = self.max_retries, ?delay, error = %e, "summarize() attempt failed; backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Sliding-window rate limiter: at most `calls_per_minute` acquisitions in
/// any 60-second window, waiting out the overflow.
pub struct RateLimiter {
    calls_per_minute: usize,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(calls_per_minute: usize) -> Self {
        Self {
            calls_per_minute,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// Record one call, sleeping first if the window is full.
    pub async fn acquire(&self) {
        const WINDOW: Duration = Duration::from_secs(60);
        let mut calls = self.calls.lock().await;
        let now = Instant::now();
        while let Some(front) = calls.front() {
            if now.duration_since(*front) >= WINDOW {
                calls.pop_front();
            } else {
                break;
            }
        }
        if calls.len() >= self.calls_per_minute {
            if let Some(front) = calls.front().copied() {
                let wait = WINDOW.saturating_sub(now.duration_since(front));
                if !wait.is_zero() {
                    info!(wait_secs = wait.as_secs_f64(), "Rate limit reached, waiting");
                    sleep(wait).await;
                }
                calls.pop_front();
            }
        }
        calls.push_back(Instant::now());
    }
}

/// Summarize one extracted article into a [`SummarizedArticle`] record.
/// Failures never escape: an empty body or an API error produces an
/// error-status record.
pub async fn summarize_article<S: Summarize>(
    summarizer: &S,
    limiter: &RateLimiter,
    article: &ExtractedArticle,
    language: &str,
) -> SummarizedArticle {
    let outcome = if article.body_text.trim().is_empty() {
        warn!(url = %article.url, "Empty body text; skipping API call");
        SummaryOutcome {
            summary: String::new(),
            success: false,
            error: Some("Empty body text".to_string()),
            metadata: SummaryMetadata {
                language: language.to_string(),
                text_length: 0,
                ..SummaryMetadata::default()
            },
        }
    } else {
        limiter.acquire().await;
        let text_length = article.body_text.chars().count();
        match summarizer.summarize(&article.title, &article.body_text).await {
            Ok(summary) => SummaryOutcome {
                metadata: SummaryMetadata {
                    language: language.to_string(),
                    text_length,
                    summary_length: Some(summary.content.chars().count()),
                    model: summary.model.clone(),
                    tokens_used: summary.tokens_used,
                },
                summary: summary.content,
                success: true,
                error: None,
            },
            Err(e) => SummaryOutcome {
                summary: String::new(),
                success: false,
                error: Some(e.to_string()),
                metadata: SummaryMetadata {
                    language: language.to_string(),
                    text_length,
                    ..SummaryMetadata::default()
                },
            },
        }
    };

    SummarizedArticle {
        article: article.clone(),
        summary: outcome.summary,
        summary_status: if outcome.success { "success" } else { "error" }.to_string(),
        summary_error: outcome.error,
        summary_metadata: outcome.metadata,
        summarized_at: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParserMethod, ParserStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn article(body: &str) -> ExtractedArticle {
        ExtractedArticle {
            url: "https://www.nepalipaisa.com/news-detail/1".to_string(),
            title: "शीर्षक".to_string(),
            author: None,
            published: None,
            body_text: body.to_string(),
            parser_status: ParserStatus::Success,
            parser_method: ParserMethod::Standard,
            parser_error: None,
            source: "nepalipaisa".to_string(),
            source_name: "Nepali Paisa".to_string(),
        }
    }

    struct FakeSummarizer {
        fail_first: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FakeSummarizer {
        fn failing_times(n: usize) -> Self {
            Self {
                fail_first: AtomicUsize::new(n),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Summarize for FakeSummarizer {
        async fn summarize(&self, _title: &str, _text: &str) -> Result<Summary, SummarizeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first.load(Ordering::SeqCst) > 0 {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
                return Err(SummarizeError::Api {
                    status: StatusCode::BAD_GATEWAY,
                    body: "upstream".to_string(),
                });
            }
            Ok(Summary {
                content: "काठमाडौंमा बजार बढ्यो।".to_string(),
                model: Some("deepseek-chat".to_string()),
                tokens_used: Some(42),
            })
        }
    }

    #[test]
    fn test_retryability() {
        assert!(
            SummarizeError::RateLimited { retry_after: 5 }.is_retryable()
        );
        assert!(
            SummarizeError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !SummarizeError::Api {
                status: StatusCode::UNAUTHORIZED,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!SummarizeError::MalformedResponse("x".to_string()).is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_transient_failures() {
        let inner = FakeSummarizer::failing_times(2);
        let client = RetrySummarize::new(inner, 3);
        let summary = client.summarize("t", "body").await.unwrap();
        assert_eq!(summary.tokens_used, Some(42));
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_max_attempts() {
        let inner = FakeSummarizer::failing_times(10);
        let client = RetrySummarize::new(inner, 2);
        assert!(client.summarize("t", "body").await.is_err());
        // initial attempt plus two retries
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_body_short_circuits() {
        let summarizer = FakeSummarizer::failing_times(0);
        let limiter = RateLimiter::new(20);
        let record = summarize_article(&summarizer, &limiter, &article("   "), "ne").await;
        assert_eq!(record.summary_status, "error");
        assert_eq!(record.summary_error.as_deref(), Some("Empty body text"));
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
        assert!(!record.is_success());
    }

    #[tokio::test]
    async fn test_successful_outcome_carries_metadata() {
        let summarizer = FakeSummarizer::failing_times(0);
        let limiter = RateLimiter::new(20);
        let record =
            summarize_article(&summarizer, &limiter, &article("काठमाडौं । आज बजार बढ्यो ।"), "ne")
                .await;
        assert_eq!(record.summary_status, "success");
        assert!(record.is_success());
        assert_eq!(record.summary_metadata.tokens_used, Some(42));
        assert_eq!(record.summary_metadata.language, "ne");
        assert!(record.summary_metadata.summary_length.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_rate_limiter_tracks_window() {
        // under the cap: acquisitions return immediately
        let limiter = RateLimiter::new(3);
        let start = std::time::Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
