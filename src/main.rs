//! # Samachar Digest
//!
//! A pipeline that scrapes Nepali-language news sites, extracts clean
//! article text, and summarizes it with an LLM.
//!
//! ## Features
//!
//! - Discovers article links from nepalipaisa.com, bikashnews.com, and
//!   merolagani.com (homepage, listing page, or sitemap)
//! - Extracts article bodies with per-source selector strategies, Nepali
//!   text validation, and a headless-browser fallback for JS-heavy pages
//! - Summarizes articles in Nepali through a DeepSeek-compatible API
//! - Writes links, articles, and summaries as JSON artifacts
//!
//! ## Usage
//!
//! ```sh
//! samachar_digest -o ./output --sources nepalipaisa,merolagani
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Link discovery**: Scrape latest article URLs per source
//! 2. **Extraction**: Fetch, parse, and validate article bodies
//! 3. **Summarization**: Send successful articles to the LLM (rate limited)
//! 4. **Output**: Write the three JSON artifacts and a run report

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod extractor;
mod models;
mod outputs;
mod scrapers;
mod utils;

use api::{HttpSummarizer, RateLimiter, RetrySummarize, summarize_article};
use cli::Cli;
use config::Settings;
use extractor::ContentExtractor;
use extractor::fetch::HttpFetcher;
use models::SummarizedArticle;
use outputs::{RunReport, write_articles, write_links, write_summaries};
use scrapers::{LinkScraper, resolve_sources};
use utils::ensure_writable_dir;

#[cfg(feature = "browser")]
use extractor::browser::ChromiumRenderer as Renderer;
#[cfg(not(feature = "browser"))]
use extractor::browser::NoRenderer as Renderer;

fn make_renderer(no_browser: bool) -> Option<Renderer> {
    if no_browser {
        info!("Browser fallback disabled by flag");
        return None;
    }
    #[cfg(feature = "browser")]
    {
        Some(Renderer)
    }
    #[cfg(not(feature = "browser"))]
    {
        info!("Built without browser support; fallback unavailable");
        None
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(started_at = %Local::now().format("%Y-%m-%d %H:%M:%S"), "samachar_digest starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.sources, "Parsed CLI arguments");

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(cap) = args.max_links_per_source {
        settings.scraper.max_links_per_source = cap;
    }

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    let output_dir = PathBuf::from(&args.output_dir);

    // Resolve the API key before any scraping so a bad key fails early
    // instead of after minutes of fetching. A missing or invalid key skips
    // summarization rather than aborting the run.
    let api_key = if args.no_summaries {
        info!("Summarization disabled by flag");
        None
    } else {
        match args.api_key.as_deref() {
            None => {
                warn!("No API key provided; skipping summarization");
                None
            }
            Some(key) => match Settings::validate_api_key(key) {
                Ok(()) => Some(key.to_string()),
                Err(e) => {
                    warn!(error = %e, "API key rejected; skipping summarization");
                    None
                }
            },
        }
    };

    // ---- Stage 1: link discovery ----
    let fetcher = HttpFetcher::new(
        Duration::from_secs(settings.extractor.fetch_timeout_secs),
        settings.extractor.fetch_retries,
    )?;
    let sources_scraped = resolve_sources(args.sources.as_deref()).len();
    let scraper = LinkScraper::new(fetcher.clone(), settings.scraper.clone());
    let links = scraper.scrape(args.sources.as_deref()).await;
    if links.is_empty() {
        error!("No article links discovered; nothing to do");
        return Err("no article links discovered".into());
    }
    write_links(&output_dir, &links).await?;

    // ---- Stage 2: content extraction ----
    let extractor = ContentExtractor::new(
        fetcher.clone(),
        make_renderer(args.no_browser),
        &settings.extractor,
    );
    let rate_limit = Duration::from_secs_f64(settings.scraper.rate_limit_secs);

    let mut articles = Vec::with_capacity(links.len());
    for (index, link) in links.iter().enumerate() {
        if index > 0 {
            sleep(rate_limit).await;
        }
        info!(
            url = %link.url,
            source = %link.source,
            progress = format!("{}/{}", index + 1, links.len()),
            "Extracting article"
        );
        let article = extractor.extract(&link.url).await.with_source(link);
        articles.push(article);
    }
    write_articles(&output_dir, &articles).await?;

    // ---- Stage 3: summarization ----
    let summaries_written = match api_key {
        None => None,
        Some(key) => {
            let summarizer = RetrySummarize::new(
                HttpSummarizer::new(key, &settings.llm)?,
                settings.llm.max_retries,
            );
            let limiter = RateLimiter::new(settings.llm.calls_per_minute);

            let mut summarized: Vec<SummarizedArticle> = Vec::with_capacity(articles.len());
            for article in &articles {
                summarized
                    .push(summarize_article(&summarizer, &limiter, article, &settings.llm.language).await);
            }
            let (_, kept) = write_summaries(&output_dir, &summarized).await?;
            Some(kept)
        }
    };

    // ---- Stage 4: report ----
    let report = RunReport::build(
        sources_scraped,
        &links,
        &articles,
        summaries_written,
        start_time.elapsed(),
    );
    println!("{report}");

    info!(elapsed_secs = start_time.elapsed().as_secs_f64(), "Pipeline completed");
    Ok(())
}
