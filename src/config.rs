//! Runtime configuration loaded from an optional YAML file.
//!
//! Every knob has a sensible default, so the pipeline runs with no config
//! file at all. The JS-heavy domain allow-list lives here rather than in the
//! extractor so that deployments can route new domains to browser rendering
//! without a code change.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Top-level settings for a pipeline run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    pub scraper: ScraperSettings,
    pub extractor: ExtractorSettings,
    pub llm: LlmSettings,
}

/// Link-discovery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// Maximum links to keep per source.
    pub max_links_per_source: usize,
    /// Optional cap on the total number of links across all sources.
    pub total_max_links: Option<usize>,
    /// Best-effort freshness window in hours. Most of these sites expose no
    /// machine-readable timestamps, so this currently passes all scraped
    /// links through and relies on the per-source cap to keep results fresh.
    pub hours_back: Option<u64>,
    /// Delay between requests to the same source, in seconds.
    pub rate_limit_secs: f64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            max_links_per_source: 6,
            total_max_links: None,
            hours_back: Some(5),
            rate_limit_secs: 2.0,
        }
    }
}

/// Content-extraction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// Maximum body text length in characters; longer bodies are truncated
    /// with a trailing "..." marker.
    pub max_body_length: usize,
    /// Standard HTTP fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// Retry attempts for transient HTTP failures (5xx, 429, connect).
    pub fetch_retries: usize,
    /// Browser navigation timeout in seconds.
    pub render_timeout_secs: u64,
    /// Domains whose articles are populated client-side; these skip the
    /// standard fetch and go straight to browser rendering.
    pub js_heavy_domains: Vec<String>,
    /// Directory for debug screenshots taken during browser rendering.
    /// Screenshots are skipped when unset.
    pub screenshot_dir: Option<String>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            max_body_length: 5000,
            fetch_timeout_secs: 30,
            fetch_retries: 3,
            render_timeout_secs: 30,
            js_heavy_domains: vec![
                "nepalipaisa.com".to_string(),
                "onlinekhabar.com".to_string(),
                "ekantipur.com".to_string(),
                "merolagani.com".to_string(),
                "bikashnews.com".to_string(),
            ],
            screenshot_dir: Some("logs/screenshots".to_string()),
        }
    }
}

/// Summarization API settings. The API key itself comes from the CLI or the
/// environment, never from the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat-completions endpoint URL.
    pub api_url: String,
    /// Model identifier.
    pub model: String,
    /// Completion token budget for the 1-2 sentence summary.
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    pub max_retries: usize,
    /// Sliding-window rate limit.
    pub calls_per_minute: usize,
    /// Prompt language: "ne" for Nepali, "en" for the English fallback.
    pub language: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.deepseek.com/v1/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            max_tokens: 150,
            temperature: 0.3,
            request_timeout_secs: 60,
            max_retries: 3,
            calls_per_minute: 20,
            language: "ne".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(p) => {
                let raw = std::fs::read_to_string(Path::new(p))?;
                let settings: Settings = serde_yaml::from_str(&raw)?;
                info!(path = %p, "Loaded settings file");
                Ok(settings)
            }
            None => Ok(Settings::default()),
        }
    }

    /// Validate an API key looks usable before any article is processed.
    ///
    /// Accepts both DeepSeek (`sk-`) and OpenRouter (`sk-or-v1-`) key shapes.
    pub fn validate_api_key(key: &str) -> Result<(), String> {
        if key.trim().is_empty() {
            return Err("API key is empty".to_string());
        }
        if !key.to_lowercase().starts_with("sk-") {
            return Err("API key appears to be invalid (should start with 'sk-')".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.extractor.max_body_length, 5000);
        assert_eq!(settings.extractor.fetch_timeout_secs, 30);
        assert_eq!(settings.scraper.max_links_per_source, 6);
        assert!(
            settings
                .extractor
                .js_heavy_domains
                .iter()
                .any(|d| d == "merolagani.com")
        );
    }

    #[test]
    fn test_partial_yaml_overlays_defaults() {
        let yaml = r#"
extractor:
  max_body_length: 2000
  js_heavy_domains: ["example.com"]
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.extractor.max_body_length, 2000);
        assert_eq!(settings.extractor.js_heavy_domains, vec!["example.com"]);
        // untouched sections keep their defaults
        assert_eq!(settings.llm.model, "deepseek-chat");
        assert_eq!(settings.scraper.max_links_per_source, 6);
    }

    #[test]
    fn test_api_key_validation() {
        assert!(Settings::validate_api_key("sk-abc123").is_ok());
        assert!(Settings::validate_api_key("sk-or-v1-abc").is_ok());
        assert!(Settings::validate_api_key("").is_err());
        assert!(Settings::validate_api_key("hunter2").is_err());
    }
}
