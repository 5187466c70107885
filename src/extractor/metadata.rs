//! Title, author, and published-date extraction.
//!
//! Dates on these sites come in three shapes: structured `datetime`
//! attributes, relative Nepali phrases ("२ घण्टा अगाडि"), and absolute
//! Bikram Sambat dates ("२० आश्विन २०८२"). The BS-to-Gregorian conversion
//! here is a fixed-offset heuristic, not a calendrical algorithm, so the
//! resulting dates are approximate and should be treated as best-effort
//! metadata only.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};
use scraper::Html;
use tracing::debug;

use super::patterns::{
    AUTHOR_SELECTORS, BIKASHNEWS_DATE_SELECTOR, DATE_SELECTORS, MEROLAGANI_TIME_SELECTOR,
    NEPALIPAISA_META_SELECTOR, NEPALI_DATE_RE, RELATIVE_TIME_RE, TIME_SELECTORS, TITLE_SELECTORS,
    nepali_month_ordinal,
};
use super::text::{clean_element_text, clean_str};
use crate::utils::host_of;

/// Extract the article title.
///
/// Tries the selector cascade first, then derives a readable title from the
/// URL's last path segment, and finally falls back to "Unknown Title".
pub fn extract_title(document: &Html, url: &str) -> String {
    for (name, selector) in TITLE_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            let title = clean_element_text(element);
            if title.chars().count() > 5 {
                debug!(selector = name, "Found title");
                return title;
            }
        }
    }
    title_from_url(url).unwrap_or_else(|| "Unknown Title".to_string())
}

/// Human-readable title from the URL's last path segment:
/// hyphens/underscores become spaces and words are title-cased.
pub fn title_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?
        .to_string();
    let spaced = segment.replace(['-', '_'], " ");
    let title = spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() { None } else { Some(title) }
}

/// Extract the author byline; first selector match under 100 characters wins.
pub fn extract_author(document: &Html) -> Option<String> {
    for (name, selector) in AUTHOR_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            let author = clean_element_text(element);
            if !author.is_empty() && author.chars().count() < 100 {
                debug!(selector = name, %author, "Found author");
                return Some(author);
            }
        }
    }
    None
}

/// Extract the publication date as an ISO-8601 string, best effort.
///
/// Order: structured `datetime` attributes and parseable Nepali text from
/// the wide selector sweep, then the domain-specific routine for the known
/// sources, then the raw `DATE_SELECTORS` values, then a scan of the first
/// ten lines of page text.
pub fn extract_published(document: &Html, url: &str) -> Option<String> {
    let host = host_of(url);

    for (_, selector) in TIME_SELECTORS.iter() {
        for element in document.select(selector) {
            if let Some(datetime) = element.value().attr("datetime") {
                if let Some(parsed) = parse_iso_datetime(datetime) {
                    return Some(parsed);
                }
            }
            let text = clean_element_text(element);
            if let Some(parsed) = parse_nepali_datetime(&text) {
                return Some(iso(parsed));
            }
        }
    }

    let domain_hit = if host.contains("nepalipaisa.com") {
        first_parseable(document, &NEPALIPAISA_META_SELECTOR)
    } else if host.contains("bikashnews.com") {
        first_parseable(document, &BIKASHNEWS_DATE_SELECTOR)
    } else if host.contains("merolagani.com") {
        first_parseable(document, &MEROLAGANI_TIME_SELECTOR)
    } else {
        None
    };
    if let Some(parsed) = domain_hit {
        return Some(iso(parsed));
    }

    for (_, selector) in DATE_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            let value = element
                .value()
                .attr("datetime")
                .or_else(|| element.value().attr("content"));
            if let Some(value) = value {
                return Some(value.to_string());
            }
            let text = clean_element_text(element);
            if !text.is_empty() && text.chars().count() < 50 {
                return Some(text);
            }
        }
    }

    scan_text_for_date(&document.root_element().text().collect::<String>())
}

fn first_parseable(document: &Html, selector: &scraper::Selector) -> Option<NaiveDateTime> {
    document
        .select(selector)
        .find_map(|element| parse_nepali_datetime(&clean_element_text(element)))
}

/// Last-resort scan of the first ten lines of page text.
pub fn scan_text_for_date(text: &str) -> Option<String> {
    text.lines()
        .take(10)
        .find_map(|line| parse_nepali_datetime(&clean_str(line)))
        .map(iso)
}

fn iso(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn parse_iso_datetime(value: &str) -> Option<String> {
    let candidate = value.trim().replace('Z', "+00:00");
    DateTime::parse_from_rfc3339(&candidate)
        .ok()
        .map(|dt| dt.to_rfc3339())
        .or_else(|| {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .ok()
                .map(|d| d.format("%Y-%m-%d").to_string())
        })
}

/// Replace Devanagari digits with their ASCII equivalents so numeric
/// captures can be parsed.
fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '०'..='९' => char::from(b'0' + (c as u32 - '०' as u32) as u8),
            other => other,
        })
        .collect()
}

/// Parse relative ("२ घण्टा अगाडि") and absolute ("२० आश्विन २०८२") Nepali
/// datetime text.
///
/// Absolute Bikram Sambat dates are converted with fixed year/month offsets
/// (BS year − 56/57, month + 3 wrapping) and the day clamped to 28. This is
/// a deliberately rough mapping.
pub fn parse_nepali_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Some(caps) = RELATIVE_TIME_RE.captures(text) {
        let amount: i64 = ascii_digits(&caps[1]).parse().ok()?;
        let delta = match &caps[2] {
            "घण्टा" => Duration::hours(amount),
            _ => Duration::minutes(amount),
        };
        return Some((Local::now() - delta).naive_local());
    }

    if let Some(caps) = NEPALI_DATE_RE.captures(text) {
        let day: u32 = ascii_digits(&caps[1]).parse().ok()?;
        let month_name = &caps[2];
        let year: i32 = ascii_digits(&caps[3]).parse().ok()?;

        if let Some(bs_month) = nepali_month_ordinal(month_name) {
            let year = if bs_month <= 3 { year - 56 } else { year - 57 };
            let month = if bs_month <= 9 { bs_month + 3 } else { bs_month - 9 };
            return NaiveDate::from_ymd_opt(year, month, day.min(28))
                .map(|d| d.and_hms_opt(0, 0, 0))?;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_selector_cascade() {
        let html = Html::parse_document(
            r#"<html><head><title>साइट</title></head>
            <body><h1 class="entry-title">काठमाडौंमा आज बजार बढ्यो</h1></body></html>"#,
        );
        assert_eq!(
            extract_title(&html, "https://example.com/a"),
            "काठमाडौंमा आज बजार बढ्यो"
        );
    }

    #[test]
    fn test_title_falls_back_to_url() {
        let html = Html::parse_document("<html><body></body></html>");
        assert_eq!(
            extract_title(&html, "https://example.com/news/share-market-update_today"),
            "Share Market Update Today"
        );
    }

    #[test]
    fn test_title_unknown_when_nothing_usable() {
        let html = Html::parse_document("<html><body></body></html>");
        assert_eq!(extract_title(&html, "https://example.com/"), "Unknown Title");
    }

    #[test]
    fn test_author_length_gate() {
        let long = "x".repeat(150);
        let html = Html::parse_document(&format!(
            r#"<div class="author">{long}</div><div class="byline">रमेश श्रेष्ठ</div>"#
        ));
        assert_eq!(extract_author(&html), Some("रमेश श्रेष्ठ".to_string()));
    }

    #[test]
    fn test_structured_datetime_attribute_wins() {
        let html = Html::parse_document(
            r#"<time datetime="2025-10-06T12:30:00Z">२ घण्टा अगाडि</time>"#,
        );
        let published = extract_published(&html, "https://example.com/a").unwrap();
        assert!(published.starts_with("2025-10-06T12:30:00"));
    }

    #[test]
    fn test_relative_time_parses() {
        let now = Local::now().naive_local();
        let parsed = parse_nepali_datetime("२ घण्टा अगाडि").unwrap();
        let delta = now - parsed;
        assert!(delta >= Duration::hours(2) - Duration::minutes(1));
        assert!(delta <= Duration::hours(2) + Duration::minutes(1));

        let parsed = parse_nepali_datetime("३० मिनेट अगाडि").unwrap();
        let delta = now - parsed;
        assert!(delta >= Duration::minutes(29));
        assert!(delta <= Duration::minutes(31));
    }

    #[test]
    fn test_absolute_bs_date_is_approximate_but_stable() {
        // २० आश्विन २०८२ -> month 6 -> gregorian month 9, year 2082-57
        let parsed = parse_nepali_datetime("२० आश्विन २०८२, सोमबार").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 9, 20).unwrap());
    }

    #[test]
    fn test_bs_months_past_asoj_wrap_to_january() {
        // माघ (10) maps to month 1 of the offset year
        let parsed = parse_nepali_datetime("१५ माघ २०८१").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_day_clamped_to_28() {
        // जेठ (2) -> month 5, year 2082-57, day 32 clamped
        let parsed = parse_nepali_datetime("३२ जेठ २०८२").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 5, 28).unwrap());
    }

    #[test]
    fn test_unparseable_text_returns_none() {
        assert!(parse_nepali_datetime("सोमबार").is_none());
        assert!(parse_nepali_datetime("hello world").is_none());
        assert!(parse_nepali_datetime("").is_none());
    }

    #[test]
    fn test_scan_text_for_date_only_checks_first_lines() {
        let mut text = (0..15).map(|i| format!("line {i}\n")).collect::<String>();
        text.push_str("२० आश्विन २०८२\n");
        assert!(scan_text_for_date(&text).is_none());

        let text = format!("शीर्षक\n२० आश्विन २०८२\nबाँकी");
        assert!(scan_text_for_date(&text).is_some());
    }
}
