//! Article-link discovery across the configured news sources.
//!
//! Each source is scraped from its homepage (or a dedicated listing page),
//! with the sitemap as a fallback when the homepage comes up short. Most of
//! these sites expose no machine-readable timestamps on their listings, so
//! freshness leans on "newest first" page ordering plus the per-source cap.

use chrono::{Local, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::sources::{SourceSpec, resolve_sources};
use crate::config::ScraperSettings;
use crate::extractor::fetch::Fetcher;
use crate::models::ArticleLink;

/// URL fragments that mark navigation pages rather than articles.
const EXCLUDED_URL_PATTERNS: &[&str] = &[
    "/category/",
    "/tag/",
    "/author/",
    "/page/",
    "/latest",
    "/popular",
    "/trending",
    "/search",
    "/archive",
    "/sitemap",
    "login",
    "register",
    "contact",
    "about",
];

static TITLE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(समाचार|News|Article):\s*").unwrap());
static TITLE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*-\s*(Nepali Paisa|Bikash News|Mero Lagani)$").unwrap());
static URL_EXTENSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(html|php|aspx?)$").unwrap());
static URL_LEADING_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[-_]?").unwrap());

static DATE_HINT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [".date", ".published", ".time", "[datetime]", ".post-date", ".article-date"]
        .iter()
        .map(|css| Selector::parse(css).unwrap())
        .collect()
});

/// Discovers article links across sources, politely rate limited.
pub struct LinkScraper<F> {
    fetcher: F,
    settings: ScraperSettings,
}

impl<F: Fetcher> LinkScraper<F> {
    pub fn new(fetcher: F, settings: ScraperSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Scrape the requested sources (`None` = all), newest links first,
    /// deduplicated by URL and capped per source and in total. Per-source
    /// failures are logged and skipped, never fatal.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape(&self, requested: Option<&[String]>) -> Vec<ArticleLink> {
        let specs = resolve_sources(requested);
        if specs.is_empty() {
            error!(?requested, "No valid sources requested");
            return Vec::new();
        }
        if let Some(hours) = self.settings.hours_back {
            info!(
                hours_back = hours,
                "Freshness is best effort: listings rarely carry timestamps, so the per-source cap stands in for the time window"
            );
        }

        let mut all = Vec::new();
        for (index, spec) in specs.iter().enumerate() {
            if index > 0 {
                sleep(Duration::from_secs_f64(self.settings.rate_limit_secs)).await;
            }
            let links = self.scrape_source(spec).await;
            info!(source = spec.key, count = links.len(), "Scraped source");
            all.extend(links);
        }

        let mut all: Vec<ArticleLink> = all.into_iter().unique_by(|l| l.url.clone()).collect();
        sort_by_freshness(&mut all);
        if let Some(total) = self.settings.total_max_links {
            all.truncate(total);
        }
        info!(total = all.len(), "Link discovery completed");
        all
    }

    async fn scrape_source(&self, spec: &SourceSpec) -> Vec<ArticleLink> {
        let max = self.settings.max_links_per_source;

        if let Some(page) = spec.news_page {
            let url = format!("{}{}", spec.domain, page);
            return match self.fetcher.fetch(&url).await {
                Ok(html) => collect_links(&Html::parse_document(&html), spec, max, false),
                Err(e) => {
                    error!(source = spec.key, error = %e, "Listing page fetch failed");
                    Vec::new()
                }
            };
        }

        let mut links = match self.fetcher.fetch(spec.domain).await {
            Ok(html) => collect_links(&Html::parse_document(&html), spec, max, true),
            Err(e) => {
                error!(source = spec.key, error = %e, "Homepage fetch failed");
                Vec::new()
            }
        };

        if links.len() < max {
            if let Some(path) = spec.sitemap_path {
                info!(
                    source = spec.key,
                    found = links.len(),
                    "Homepage came up short; trying sitemap"
                );
                let sitemap_url = format!("{}{}", spec.domain, path);
                match self.fetcher.fetch(&sitemap_url).await {
                    Ok(xml) => {
                        let remaining = max - links.len();
                        links.extend(sitemap_links(&xml, spec, remaining));
                    }
                    Err(e) => warn!(source = spec.key, error = %e, "Sitemap fetch failed"),
                }
            }
        }

        links.truncate(max);
        links
    }
}

/// Sweep the listing selectors over a parsed page and collect article links.
/// `filter_navigation` additionally drops category/tag/login style URLs;
/// dedicated listing pages skip that check.
pub fn collect_links(
    document: &Html,
    spec: &SourceSpec,
    max: usize,
    filter_navigation: bool,
) -> Vec<ArticleLink> {
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    'outer: for selector in &spec.link_selectors {
        for element in document.select(selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(url) = absolutize(spec.domain, href) else {
                continue;
            };
            if !spec.article_url_re.is_match(&url) {
                continue;
            }
            if filter_navigation && !is_likely_article_link(&url) {
                continue;
            }
            if !seen.insert(url.clone()) {
                continue;
            }

            let title =
                title_from_element(element).unwrap_or_else(|| title_from_url(&url));
            links.push(ArticleLink {
                url,
                title,
                published: date_from_element(element),
                source: spec.key.to_string(),
                source_name: spec.name.to_string(),
            });
            if links.len() >= max {
                break 'outer;
            }
        }
    }
    debug!(source = spec.key, count = links.len(), "Collected page links");
    links
}

/// Parse a sitemap and keep up to `max` article URLs, with `lastmod` as the
/// publication date when present.
pub fn sitemap_links(xml: &str, spec: &SourceSpec, max: usize) -> Vec<ArticleLink> {
    parse_sitemap(xml)
        .into_iter()
        .filter(|(url, _)| spec.article_url_re.is_match(url) && is_likely_article_link(url))
        .take(max)
        .map(|(url, lastmod)| ArticleLink {
            title: title_from_url(&url),
            url,
            published: lastmod,
            source: spec.key.to_string(),
            source_name: spec.name.to_string(),
        })
        .collect()
}

/// Pull `(loc, lastmod)` pairs out of sitemap XML, namespace-agnostic.
fn parse_sitemap(xml: &str) -> Vec<(String, Option<String>)> {
    #[derive(Clone, Copy)]
    enum Field {
        Loc,
        Lastmod,
    }

    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut loc: Option<String> = None;
    let mut lastmod: Option<String> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => {
                    loc = None;
                    lastmod = None;
                }
                b"loc" => field = Some(Field::Loc),
                b"lastmod" => field = Some(Field::Lastmod),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if let (Some(f), Ok(text)) = (field, t.xml_content()) {
                    let text = text.trim().to_string();
                    match f {
                        Field::Loc => loc = Some(text),
                        Field::Lastmod => lastmod = Some(text),
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"url" {
                    if let Some(url) = loc.take() {
                        entries.push((url, lastmod.take()));
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "Sitemap XML parse error");
                break;
            }
            _ => {}
        }
    }
    entries
}

fn absolutize(domain: &str, href: &str) -> Option<String> {
    if href.starts_with("http") {
        return Some(href.to_string());
    }
    Url::parse(domain).ok()?.join(href).ok().map(String::from)
}

/// Title from a link element: `title`/`alt` attributes, then text content,
/// with site-name suffixes stripped and capped at 200 characters.
fn title_from_element(element: ElementRef<'_>) -> Option<String> {
    let raw = element
        .value()
        .attr("title")
        .map(str::to_string)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            element
                .value()
                .attr("alt")
                .map(str::to_string)
                .filter(|t| !t.trim().is_empty())
        })
        .unwrap_or_else(|| element.text().collect::<Vec<_>>().join(" "));

    let mut title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    title = TITLE_PREFIX_RE.replace(&title, "").into_owned();
    title = TITLE_SUFFIX_RE.replace(&title, "").into_owned();
    let title = title.trim().chars().take(200).collect::<String>();
    if title.is_empty() { None } else { Some(title) }
}

/// Readable title from the URL's last path segment, or a domain-based
/// placeholder when the segment is all ID.
pub fn title_from_url(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|s| s.filter(|p| !p.is_empty()).next_back())
        {
            let stripped = URL_EXTENSION_RE.replace(segment, "");
            let stripped = URL_LEADING_ID_RE.replace(&stripped, "");
            let spaced = stripped.replace(['-', '_'], " ");
            let title = spaced
                .split_whitespace()
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => {
                            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                        }
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            if title.chars().count() > 5 {
                return title;
            }
        }
        let domain = parsed
            .host_str()
            .unwrap_or("unknown")
            .trim_start_matches("www.");
        return format!("Article from {domain}");
    }
    "Unknown Article".to_string()
}

/// Publication date from the link element's attributes or a nearby
/// date-ish sibling.
fn date_from_element(element: ElementRef<'_>) -> Option<String> {
    for attr in ["datetime", "data-date", "data-published"] {
        if let Some(value) = element.value().attr(attr) {
            return Some(value.to_string());
        }
    }
    let parent = element.parent().and_then(ElementRef::wrap)?;
    for selector in DATE_HINT_SELECTORS.iter() {
        if let Some(hit) = parent.select(selector).next() {
            if let Some(datetime) = hit.value().attr("datetime") {
                return Some(datetime.to_string());
            }
            let text = hit.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn is_likely_article_link(url: &str) -> bool {
    let lower = url.to_lowercase();
    !EXCLUDED_URL_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Newest first. Undated links sort last; dated-but-unparseable links are
/// treated as recent, since malformed dates mostly show up on fresh pages.
pub fn sort_by_freshness(links: &mut [ArticleLink]) {
    links.sort_by_key(|link| std::cmp::Reverse(freshness_key(link)));
}

fn freshness_key(link: &ArticleLink) -> NaiveDateTime {
    let Some(published) = link.published.as_deref() else {
        return NaiveDateTime::MIN;
    };
    let head: String = published.chars().take(19).collect();
    if let Ok(dt) = NaiveDateTime::parse_from_str(&head, "%Y-%m-%dT%H:%M:%S") {
        return dt;
    }
    if let Ok(d) = NaiveDate::parse_from_str(&head, "%Y-%m-%d") {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return dt;
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&head, "%a, %d %b %Y") {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return dt;
        }
    }
    Local::now().naive_local()
}
