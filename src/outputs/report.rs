//! End-of-run pipeline report.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::models::{ArticleLink, ExtractedArticle};

/// Per-source extraction statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub articles: usize,
    pub successful: usize,
    pub content_chars: usize,
}

/// Aggregated statistics for one pipeline run, rendered at the end of main.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub sources_scraped: usize,
    pub links_found: usize,
    pub articles_parsed: usize,
    pub articles_successful: usize,
    pub total_content_chars: usize,
    pub per_source: BTreeMap<String, SourceStats>,
    pub summaries_written: Option<usize>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn build(
        sources_scraped: usize,
        links: &[ArticleLink],
        articles: &[ExtractedArticle],
        summaries_written: Option<usize>,
        elapsed: Duration,
    ) -> Self {
        let mut per_source: BTreeMap<String, SourceStats> = BTreeMap::new();
        for article in articles {
            let stats = per_source
                .entry(article.source_name.clone())
                .or_insert(SourceStats {
                    articles: 0,
                    successful: 0,
                    content_chars: 0,
                });
            stats.articles += 1;
            if article.is_success() {
                stats.successful += 1;
            }
            stats.content_chars += article.body_text.chars().count();
        }

        Self {
            sources_scraped,
            links_found: links.len(),
            articles_parsed: articles.len(),
            articles_successful: articles.iter().filter(|a| a.is_success()).count(),
            total_content_chars: articles.iter().map(|a| a.body_text.chars().count()).sum(),
            per_source,
            summaries_written,
            elapsed,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(70))?;
        writeln!(f, "PIPELINE SUMMARY")?;
        writeln!(f, "{}", "=".repeat(70))?;
        writeln!(f, "Sources scraped: {}", self.sources_scraped)?;
        writeln!(f, "Articles found: {}", self.links_found)?;
        writeln!(
            f,
            "Articles parsed successfully: {}/{}",
            self.articles_successful, self.articles_parsed
        )?;
        writeln!(
            f,
            "Total content extracted: {} characters",
            self.total_content_chars
        )?;
        if let Some(count) = self.summaries_written {
            writeln!(f, "Summaries written: {count}")?;
        }
        writeln!(f)?;
        writeln!(f, "Source performance:")?;
        for (name, stats) in &self.per_source {
            writeln!(f, "  {name}:")?;
            writeln!(f, "    - Articles: {}", stats.articles)?;
            writeln!(
                f,
                "    - Successful: {}/{}",
                stats.successful, stats.articles
            )?;
            writeln!(f, "    - Content: {} characters", stats.content_chars)?;
        }
        writeln!(f)?;
        write!(f, "Completed in {:.1}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParserMethod, ParserStatus};

    fn article(source_name: &str, status: ParserStatus, body_chars: usize) -> ExtractedArticle {
        ExtractedArticle {
            url: "https://x/1".to_string(),
            title: "t".to_string(),
            author: None,
            published: None,
            body_text: "क".repeat(body_chars),
            parser_status: status,
            parser_method: ParserMethod::Standard,
            parser_error: None,
            source: source_name.to_lowercase(),
            source_name: source_name.to_string(),
        }
    }

    #[test]
    fn test_report_aggregates_per_source() {
        let articles = vec![
            article("Nepali Paisa", ParserStatus::Success, 300),
            article("Nepali Paisa", ParserStatus::Failed, 0),
            article("Bikash News", ParserStatus::Success, 500),
        ];
        let report = RunReport::build(2, &[], &articles, Some(2), Duration::from_secs(12));

        assert_eq!(report.articles_parsed, 3);
        assert_eq!(report.articles_successful, 2);
        assert_eq!(report.total_content_chars, 800);
        assert_eq!(
            report.per_source["Nepali Paisa"],
            SourceStats {
                articles: 2,
                successful: 1,
                content_chars: 300
            }
        );

        let rendered = report.to_string();
        assert!(rendered.contains("Articles parsed successfully: 2/3"));
        assert!(rendered.contains("Bikash News"));
        assert!(rendered.contains("Summaries written: 2"));
    }
}
