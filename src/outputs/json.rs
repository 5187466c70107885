//! JSON file writing for the three pipeline stages.
//!
//! Articles are written regardless of status so failures stay inspectable;
//! summaries are filtered down to successes, with the previous summaries
//! file rotated to `.backup.json` first.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::{ArticleLink, ExtractedArticle, SummarizedArticle};

pub const LINKS_FILE: &str = "multi_source_links.json";
pub const ARTICLES_FILE: &str = "multi_source_articles.json";
pub const SUMMARIES_FILE: &str = "multi_source_summaries.json";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

async fn write_pretty<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).await?;
    Ok(())
}

/// Write discovered links to `multi_source_links.json`.
#[instrument(level = "info", skip(links))]
pub async fn write_links(output_dir: &Path, links: &[ArticleLink]) -> Result<PathBuf, OutputError> {
    let path = output_dir.join(LINKS_FILE);
    write_pretty(&path, &links).await?;
    info!(path = %path.display(), count = links.len(), "Saved discovered links");
    Ok(path)
}

/// Write every extraction attempt to `multi_source_articles.json`,
/// failures included.
#[instrument(level = "info", skip(articles))]
pub async fn write_articles(
    output_dir: &Path,
    articles: &[ExtractedArticle],
) -> Result<PathBuf, OutputError> {
    let path = output_dir.join(ARTICLES_FILE);
    write_pretty(&path, &articles).await?;
    info!(path = %path.display(), count = articles.len(), "Saved parsed articles");
    Ok(path)
}

/// Write successful summaries to `multi_source_summaries.json`, rotating any
/// existing file to `.backup.json` first. Returns the path and how many
/// records were kept after filtering.
#[instrument(level = "info", skip(summaries))]
pub async fn write_summaries(
    output_dir: &Path,
    summaries: &[SummarizedArticle],
) -> Result<(PathBuf, usize), OutputError> {
    let path = output_dir.join(SUMMARIES_FILE);

    if fs::try_exists(&path).await.unwrap_or(false) {
        let backup = path.with_extension("backup.json");
        fs::rename(&path, &backup).await?;
        info!(backup = %backup.display(), "Rotated previous summaries file");
    }

    let valid: Vec<&SummarizedArticle> = summaries.iter().filter(|s| s.is_success()).collect();
    let filtered = summaries.len() - valid.len();
    if filtered > 0 {
        info!(filtered, "Dropped failed summaries from output");
    }

    write_pretty(&path, &valid).await?;
    info!(path = %path.display(), count = valid.len(), "Saved summaries");
    Ok((path, valid.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParserMethod, ParserStatus, SummaryMetadata};

    fn summarized(url: &str, status: &str, summary: &str) -> SummarizedArticle {
        SummarizedArticle {
            article: ExtractedArticle {
                url: url.to_string(),
                title: "t".to_string(),
                author: None,
                published: None,
                body_text: "काठमाडौं".to_string(),
                parser_status: ParserStatus::Success,
                parser_method: ParserMethod::Standard,
                parser_error: None,
                source: "nepalipaisa".to_string(),
                source_name: "Nepali Paisa".to_string(),
            },
            summary: summary.to_string(),
            summary_status: status.to_string(),
            summary_error: None,
            summary_metadata: SummaryMetadata::default(),
            summarized_at: "2025-10-06T12:00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_summaries_filtered_and_rotated() {
        let dir = std::env::temp_dir().join(format!("samachar_test_{}", std::process::id()));
        fs::create_dir_all(&dir).await.unwrap();

        let records = vec![
            summarized("https://a/1", "success", "सारांश एक।"),
            summarized("https://a/2", "error", ""),
            summarized("https://a/3", "success", "   "),
        ];
        let (path, kept) = write_summaries(&dir, &records).await.unwrap();
        assert_eq!(kept, 1);

        // second run rotates the first file to .backup.json
        let (_, kept) = write_summaries(&dir, &records).await.unwrap();
        assert_eq!(kept, 1);
        assert!(
            fs::try_exists(path.with_extension("backup.json"))
                .await
                .unwrap()
        );

        let raw = fs::read_to_string(&path).await.unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["url"], "https://a/1");

        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_articles_file_keeps_failures() {
        let dir = std::env::temp_dir().join(format!("samachar_art_{}", std::process::id()));
        fs::create_dir_all(&dir).await.unwrap();

        let mut failed = summarized("https://a/9", "error", "").article;
        failed.parser_status = ParserStatus::FallbackFailed;
        let path = write_articles(&dir, &[failed]).await.unwrap();

        let raw = fs::read_to_string(&path).await.unwrap();
        assert!(raw.contains("fallback_failed"));

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
