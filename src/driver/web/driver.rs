//! Web page driver implementation using Playwright
//!
//! A [`BrowserSession`] owns the Playwright process, the browser, one
//! context and one page. It is opened for a single crawl and must be
//! closed by its owner on every exit path.

use anyhow::{Context, Result};
use async_trait::async_trait;
use playwright::api::{Browser, BrowserContext, DocumentLoadState, Page, Viewport};
use playwright::Playwright;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::driver::traits::PageDriver;
use crate::utils::config::BrowserConfig;

/// Collects every `a[href]` resolved against the current location and keeps
/// the ones under the given origin
const SAME_ORIGIN_LINKS_JS: &str = r#"
(baseOrigin) => {
    return Array.from(document.querySelectorAll('a[href]'))
        .map(a => {
            const href = a.getAttribute('href');
            if (href) {
                try {
                    const fullUrl = new URL(href, window.location.href).href;
                    if (fullUrl.startsWith(baseOrigin)) {
                        return fullUrl;
                    }
                } catch (e) {}
            }
            return null;
        })
        .filter(Boolean);
}
"#;

/// Exclusively owned browser for one crawl
pub struct BrowserSession {
    #[allow(dead_code)]
    playwright: Playwright,
    browser: Browser,
    context: BrowserContext,
    page: WebPage,
}

impl BrowserSession {
    /// Launch Chromium and open a fresh context and page
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;
        let browser = launch_chromium_browser(&playwright, config).await?;

        let context = browser
            .context_builder()
            .user_agent(&config.user_agent)
            .build()
            .await
            .context("Failed to create browser context")?;

        let page = context.new_page().await.context("Failed to open page")?;
        page.set_viewport_size(Viewport {
            width: config.viewport_width as i32,
            height: config.viewport_height as i32,
        })
        .await?;

        log::debug!(
            "browser ready (headless: {}, viewport: {}x{})",
            config.headless,
            config.viewport_width,
            config.viewport_height
        );

        Ok(Self {
            playwright,
            browser,
            context,
            page: WebPage {
                page: Mutex::new(page),
            },
        })
    }

    pub fn page(&self) -> &WebPage {
        &self.page
    }

    /// Close the context and the browser
    pub async fn close(self) -> Result<()> {
        let context_result = self.context.close().await;
        let browser_result = self.browser.close().await;
        context_result.context("Failed to close browser context")?;
        browser_result.context("Failed to close browser")?;
        log::debug!("browser closed");
        Ok(())
    }
}

async fn launch_chromium_browser(playwright: &Playwright, config: &BrowserConfig) -> Result<Browser> {
    let chromium = playwright.chromium();
    let mut launcher = chromium.launcher().headless(config.headless);

    let env_path = std::env::var("PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH")
        .ok()
        .map(PathBuf::from);

    let executable = config.executable.clone().or(env_path);
    if let Some(ref path) = executable {
        log::info!("Using browser executable: {}", path.display());
        launcher = launcher.executable(path);
    }

    let args: Vec<String> = [
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
        "--ignore-certificate-errors",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    launcher = launcher.args(&args);

    launcher.launch().await.context("Failed to launch Chromium")
}

/// Playwright page behind the [`PageDriver`] interface
pub struct WebPage {
    page: Mutex<Page>,
}

#[async_trait]
impl PageDriver for WebPage {
    async fn goto(&self, url: &str, timeout_ms: u64) -> Result<()> {
        let page = self.page.lock().await;
        page.goto_builder(url)
            .wait_until(DocumentLoadState::DomContentLoaded)
            .timeout(timeout_ms as f64)
            .goto()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<bool> {
        // Playwright waits for the visible state by default
        let page = self.page.lock().await;
        let result = page
            .wait_for_selector_builder(selector)
            .timeout(timeout_ms as f64)
            .wait_for_selector()
            .await;

        Ok(matches!(result, Ok(Some(_))))
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        let page = self.page.lock().await;
        Ok(page.query_selector(selector).await?.is_some())
    }

    async fn click(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let page = self.page.lock().await;
        page.click_builder(selector)
            .timeout(timeout_ms as f64)
            .click()
            .await
            .with_context(|| format!("Failed to click: {}", selector))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str, timeout_ms: u64) -> Result<()> {
        let page = self.page.lock().await;
        page.fill_builder(selector, value)
            .timeout(timeout_ms as f64)
            .fill()
            .await
            .with_context(|| format!("Failed to fill: {}", selector))?;
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        let page = self.page.lock().await;
        match page.query_selector(selector).await? {
            Some(el) => Ok(Some(el.inner_text().await?)),
            None => Ok(None),
        }
    }

    async fn content(&self) -> Result<String> {
        let page = self.page.lock().await;
        Ok(page.content().await?)
    }

    async fn same_origin_links(&self, origin: &str) -> Result<Vec<String>> {
        let page = self.page.lock().await;
        let links: Vec<String> = page
            .evaluate::<&str, Vec<String>>(SAME_ORIGIN_LINKS_JS, origin)
            .await?;
        Ok(links)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let page = self.page.lock().await;
        page.screenshot_builder()
            .path(path.to_path_buf())
            .screenshot()
            .await?;
        Ok(())
    }
}
