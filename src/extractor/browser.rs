//! Browser-rendered fetch for JavaScript-heavy sites.
//!
//! Rendering is modelled as an injected capability: the orchestrator only
//! sees the [`PageRenderer`] trait, so tests substitute a fake and the real
//! chromium driver stays behind the `browser` cargo feature. One render call
//! drives one browser session start to finish; sessions are never shared.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use super::patterns::{MEROLAGANI_WAIT_SELECTORS, RENDER_WAIT_SELECTORS};

/// Rendering failure. Surfaced to callers as `parser_status =
/// fallback_error`, never as a panic or escaped exception.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to capture rendered DOM: {0}")]
    Capture(String),
}

/// What "page is ready" means for a given site.
///
/// Some of these sites poll endpoints forever and never reach network idle,
/// so those are driven off the load event plus the settle delay instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Wait for network activity to quiet down before capturing.
    NetworkIdle,
    /// Wait for the load event only.
    Load,
}

/// Per-render configuration assembled by the orchestrator.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Navigation timeout.
    pub timeout: Duration,
    pub wait: WaitStrategy,
    /// Content selectors polled (bounded per-selector) before capture.
    pub wait_selectors: Vec<String>,
    /// Fixed settle delay after navigation, for late-arriving content.
    pub settle: Duration,
    /// Where to drop a debug screenshot; skipped when `None`.
    pub screenshot_dir: Option<PathBuf>,
}

impl RenderOptions {
    /// Site-dependent render options. Merolagani pages poll continuously and
    /// never reach network idle, so they get the load-event strategy and
    /// their ASP.NET panel selectors are tried first.
    pub fn for_url(url: &str, timeout: Duration, screenshot_dir: Option<PathBuf>) -> Self {
        let mut wait_selectors: Vec<String> = Vec::new();
        let wait = if url.contains("merolagani.com") {
            wait_selectors.extend(MEROLAGANI_WAIT_SELECTORS.iter().map(|s| s.to_string()));
            WaitStrategy::Load
        } else {
            WaitStrategy::NetworkIdle
        };
        wait_selectors.extend(RENDER_WAIT_SELECTORS.iter().map(|s| s.to_string()));
        Self {
            timeout,
            wait,
            wait_selectors,
            settle: Duration::from_secs(2),
            screenshot_dir,
        }
    }
}

/// Black-box `render(url) -> html` capability.
pub trait PageRenderer {
    /// Navigate to `url`, wait per `options`, and return the serialized DOM.
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String, RenderError>;
}

/// Stand-in renderer type for builds and runs without browser support. The
/// orchestrator holds `Option<R>`; this is the `R` when the option is always
/// `None`, so `render` is unreachable in practice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRenderer;

impl PageRenderer for NoRenderer {
    async fn render(&self, _url: &str, _options: &RenderOptions) -> Result<String, RenderError> {
        Err(RenderError::Launch("browser support not enabled".to_string()))
    }
}

#[cfg(feature = "browser")]
pub use chromium::ChromiumRenderer;

#[cfg(feature = "browser")]
mod chromium {
    use super::{PageRenderer, RenderError, RenderOptions, WaitStrategy};
    use crate::utils::POLITE_USER_AGENT;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
    use chromiumoxide::page::{Page, ScreenshotParams};
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::time::{Instant, sleep, timeout};
    use tracing::{debug, info, instrument, warn};

    /// Upper bound on each per-selector wait.
    const SELECTOR_WAIT: Duration = Duration::from_secs(5);

    /// Headless-chromium renderer. Each call launches a fresh browser,
    /// drives a single page, and tears the process down again; nothing is
    /// shared between calls.
    #[derive(Debug, Default, Clone)]
    pub struct ChromiumRenderer;

    impl ChromiumRenderer {
        async fn wait_for_any_selector(page: &Page, selectors: &[String]) {
            for selector in selectors {
                let deadline = Instant::now() + SELECTOR_WAIT;
                loop {
                    if page.find_element(selector.as_str()).await.is_ok() {
                        debug!(%selector, "Found content selector");
                        return;
                    }
                    if Instant::now() >= deadline {
                        break;
                    }
                    sleep(Duration::from_millis(250)).await;
                }
            }
        }

        async fn save_screenshot(page: &Page, dir: &std::path::Path) {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                warn!(error = %e, "Could not create screenshot directory");
                return;
            }
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S%.3f");
            let path = dir.join(format!("page_{stamp}.png"));
            let params = ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(true)
                .build();
            match page.save_screenshot(params, &path).await {
                Ok(_) => debug!(path = %path.display(), "Saved debug screenshot"),
                Err(e) => warn!(error = %e, "Screenshot capture failed"),
            }
        }
    }

    impl PageRenderer for ChromiumRenderer {
        #[instrument(level = "info", skip(self, options))]
        async fn render(&self, url: &str, options: &RenderOptions) -> Result<String, RenderError> {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .arg("--disable-dev-shm-usage")
                .build()
                .map_err(RenderError::Launch)?;

            let (mut browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| RenderError::Launch(e.to_string()))?;
            let driver = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let result = async {
                let page = browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| RenderError::Navigation(e.to_string()))?;
                page.set_user_agent(POLITE_USER_AGENT)
                    .await
                    .map_err(|e| RenderError::Navigation(e.to_string()))?;

                let navigation = async {
                    page.goto(url)
                        .await
                        .map_err(|e| RenderError::Navigation(e.to_string()))?;
                    page.wait_for_navigation()
                        .await
                        .map_err(|e| RenderError::Navigation(e.to_string()))?;
                    Ok::<(), RenderError>(())
                };
                timeout(options.timeout, navigation)
                    .await
                    .map_err(|_| RenderError::Timeout(options.timeout))??;

                Self::wait_for_any_selector(&page, &options.wait_selectors).await;

                // NetworkIdle sites get the settle delay doubled since the
                // load event alone undercounts late XHR content.
                let settle = match options.wait {
                    WaitStrategy::NetworkIdle => options.settle * 2,
                    WaitStrategy::Load => options.settle,
                };
                sleep(settle).await;

                if let Some(ref dir) = options.screenshot_dir {
                    Self::save_screenshot(&page, dir).await;
                }

                let html = page
                    .content()
                    .await
                    .map_err(|e| RenderError::Capture(e.to_string()))?;
                info!(bytes = html.len(), "Captured rendered DOM");
                Ok(html)
            }
            .await;

            if let Err(e) = browser.close().await {
                warn!(error = %e, "Browser close failed");
            }
            let _ = browser.wait().await;
            driver.abort();

            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merolagani_gets_load_strategy_and_panel_selectors() {
        let options = RenderOptions::for_url(
            "https://merolagani.com/NewsDetail.aspx?newsID=1",
            Duration::from_secs(30),
            None,
        );
        assert_eq!(options.wait, WaitStrategy::Load);
        assert!(options.wait_selectors[0].contains("NewsDetailPanel"));
        // generic selectors still follow
        assert!(options.wait_selectors.iter().any(|s| s == "article"));
    }

    #[test]
    fn test_other_sites_get_network_idle() {
        let options = RenderOptions::for_url(
            "https://www.bikashnews.com/story/12345",
            Duration::from_secs(30),
            None,
        );
        assert_eq!(options.wait, WaitStrategy::NetworkIdle);
        assert_eq!(options.wait_selectors[0], "article");
    }
}
