//! The supported news sources and their per-site scraping configuration.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

/// Static configuration for one news source.
pub struct SourceSpec {
    /// Stable key used in CLI arguments and output records.
    pub key: &'static str,
    /// Display name carried into output records.
    pub name: &'static str,
    /// Scheme and host, no trailing slash.
    pub domain: &'static str,
    /// Listing page to scrape instead of the homepage, when the site keeps
    /// its news off the front page.
    pub news_page: Option<&'static str>,
    /// Anchor selectors tried in order on the homepage or listing page.
    pub link_selectors: Vec<Selector>,
    /// A URL must match this to count as an article.
    pub article_url_re: Regex,
    /// Sitemap path used as a fallback when the homepage comes up short.
    pub sitemap_path: Option<&'static str>,
}

fn selectors(table: &[&str]) -> Vec<Selector> {
    table.iter().map(|css| Selector::parse(css).unwrap()).collect()
}

pub static NEWS_SOURCES: Lazy<Vec<SourceSpec>> = Lazy::new(|| {
    vec![
        SourceSpec {
            key: "nepalipaisa",
            name: "Nepali Paisa",
            domain: "https://www.nepalipaisa.com",
            news_page: None,
            link_selectors: selectors(&[
                "a[href*=\"/news-detail/\"]",
                "a[href*=\"news-detail\"]",
                ".news-item a",
                ".article-link",
                "a[href*=\"/news/\"]",
                "[class*=\"news\"] a",
                "[class*=\"article\"] a",
            ]),
            article_url_re: Regex::new(r"news-detail/\d+").unwrap(),
            sitemap_path: Some("/sitemap.xml"),
        },
        SourceSpec {
            key: "bikashnews",
            name: "Bikash News",
            domain: "https://www.bikashnews.com",
            news_page: None,
            link_selectors: selectors(&[
                "a[href*=\"/story/\"]",
                ".news-item a",
                ".article-link a",
                "a[href*=\"/news/\"]",
            ]),
            article_url_re: Regex::new(r"story/\d+").unwrap(),
            sitemap_path: Some("/sitemap.xml"),
        },
        SourceSpec {
            key: "merolagani",
            name: "Mero Lagani",
            domain: "https://merolagani.com",
            news_page: Some("/NewsList.aspx"),
            link_selectors: selectors(&[
                "a[href*=\"NewsDetail.aspx\"]",
                "a[href*=\"newsdetail\"]",
                ".news-title a",
                ".news-item a",
                "td a[href*=\"NewsDetail\"]",
            ]),
            article_url_re: Regex::new(r"(?i)NewsDetail\.aspx").unwrap(),
            sitemap_path: None,
        },
    ]
});

/// Look up a source by its key.
pub fn source_by_key(key: &str) -> Option<&'static SourceSpec> {
    NEWS_SOURCES.iter().find(|s| s.key == key)
}

/// Resolve a requested source list to specs, dropping unknown keys.
/// `None` means all sources.
pub fn resolve_sources(requested: Option<&[String]>) -> Vec<&'static SourceSpec> {
    match requested {
        None => NEWS_SOURCES.iter().collect(),
        Some(keys) => keys
            .iter()
            .filter_map(|key| source_by_key(key.trim()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sources_compile() {
        for source in NEWS_SOURCES.iter() {
            assert!(!source.link_selectors.is_empty(), "{}", source.key);
            assert!(source.domain.starts_with("https://"));
        }
    }

    #[test]
    fn test_article_url_patterns() {
        let np = source_by_key("nepalipaisa").unwrap();
        assert!(np.article_url_re.is_match("https://www.nepalipaisa.com/news-detail/87090"));
        assert!(!np.article_url_re.is_match("https://www.nepalipaisa.com/ipo"));

        let ml = source_by_key("merolagani").unwrap();
        assert!(ml.article_url_re.is_match("https://merolagani.com/newsdetail.aspx?newsID=1"));
    }

    #[test]
    fn test_resolve_sources() {
        assert_eq!(resolve_sources(None).len(), 3);
        let picked = resolve_sources(Some(&["merolagani".to_string(), "bogus".to_string()]));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].key, "merolagani");
    }
}
