//! Bounded breadth-first crawl of an authenticated site

use serde::Serialize;
use url::Url;

use super::frontier::CrawlFrontier;
use super::session::{LoginSelectors, SessionEstablisher, SessionOutcome};
use super::truncate_chars;
use crate::driver::traits::PageDriver;
use crate::driver::web::BrowserSession;
use crate::error::CrawlError;
use crate::utils::config::{AppConfig, CrawlConfig};
use crate::utils::prompt::Credentials;

/// Static and binary resources never worth visiting
/// Pending URLs kept per page still to be captured
const PENDING_URLS_PER_PAGE: usize = 50;

const SKIPPED_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".png", ".gif", ".css", ".js", ".zip"];

/// Bounded excerpt of one visited page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    pub content_excerpt: String,
    /// Visit ordinal, starting at 0
    pub discovered_at: usize,
}

/// Visited pages in visit order, unique by URL
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CrawlResult {
    pages: Vec<PageSnapshot>,
}

impl CrawlResult {
    pub(crate) fn insert(&mut self, url: String, content_excerpt: String) {
        let discovered_at = self.pages.len();
        self.pages.push(PageSnapshot {
            url,
            content_excerpt,
            discovered_at,
        });
    }

    pub fn get(&self, url: &str) -> Option<&PageSnapshot> {
        self.pages.iter().find(|p| p.url == url)
    }

    pub fn urls(&self) -> Vec<&str> {
        self.pages.iter().map(|p| p.url.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageSnapshot> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Login outcome plus whatever pages were collected
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub outcome: SessionOutcome,
    pub pages: CrawlResult,
}

impl CrawlReport {
    pub fn not_crawled(outcome: SessionOutcome) -> Self {
        Self {
            outcome,
            pages: CrawlResult::default(),
        }
    }
}

/// Logs in, then walks same-origin links breadth-first
pub struct SiteCrawler<'a> {
    config: &'a CrawlConfig,
    selectors: LoginSelectors,
}

impl<'a> SiteCrawler<'a> {
    pub fn new(config: &'a CrawlConfig) -> Self {
        Self {
            config,
            selectors: LoginSelectors::default(),
        }
    }

    /// Establish the session and crawl when it permits
    pub async fn crawl(
        &self,
        page: &dyn PageDriver,
        start_url: &str,
        credentials: &Credentials,
        max_pages: usize,
    ) -> CrawlReport {
        let outcome = SessionEstablisher::new(self.config, &self.selectors)
            .establish(page, start_url, credentials)
            .await;

        if !outcome.permits_crawl() {
            return CrawlReport::not_crawled(outcome);
        }

        let pages = self.crawl_pages(page, start_url, max_pages).await;
        CrawlReport { outcome, pages }
    }

    /// Breadth-first traversal over an already established session
    ///
    /// Per-page failures are logged and skipped; the result holds at most
    /// `max_pages` snapshots in visit order.
    pub async fn crawl_pages(
        &self,
        page: &dyn PageDriver,
        start_url: &str,
        max_pages: usize,
    ) -> CrawlResult {
        let mut results = CrawlResult::default();

        let start = match Url::parse(start_url) {
            Ok(u) => u,
            Err(e) => {
                log::warn!("Invalid start URL {}: {}", start_url, e);
                return results;
            }
        };
        let origin = start.origin().ascii_serialization();
        let capacity = max_pages.saturating_mul(PENDING_URLS_PER_PAGE);
        let mut frontier = CrawlFrontier::new(start_url, capacity);

        while results.len() < max_pages {
            let Some(current) = frontier.pop() else {
                break;
            };

            log::info!("Crawling page: {}", current);
            if let Err(e) = page.goto(&current, self.config.navigation_timeout_ms).await {
                let err = CrawlError::Navigation {
                    url: current.clone(),
                    reason: format!("{:#}", e),
                };
                log::warn!("{}", err);
                continue;
            }

            let html = match page.content().await {
                Ok(html) => html,
                Err(e) => {
                    log::warn!("Error reading content of {}: {:#}", current, e);
                    continue;
                }
            };
            results.insert(
                current.clone(),
                truncate_chars(&html, self.config.excerpt_chars).to_string(),
            );

            let links = match page.same_origin_links(&origin).await {
                Ok(links) => links,
                Err(e) => {
                    log::warn!("Error extracting links from {}: {:#}", current, e);
                    continue;
                }
            };

            let mut added = 0;
            for link in links {
                if should_enqueue(&link, &start) && frontier.push(&link) {
                    added += 1;
                }
            }
            log::debug!("{}: {} new links queued", current, added);
        }

        log::info!(
            "Crawl finished: {} pages captured, {} visited, {} left in queue",
            results.len(),
            frontier.visited_count(),
            frontier.pending()
        );
        results
    }
}

/// Same-origin, not a static resource, not the bare origin root
pub fn should_enqueue(link: &str, start: &Url) -> bool {
    let Ok(parsed) = Url::parse(link) else {
        return false;
    };
    if parsed.origin() != start.origin() {
        return false;
    }

    let path = parsed.path();
    if path.is_empty() || path == "/" {
        return false;
    }

    let lower = path.to_lowercase();
    !SKIPPED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Launch a browser, crawl, and always release the browser
pub async fn crawl_site(
    config: &AppConfig,
    start_url: &str,
    credentials: &Credentials,
    max_pages: usize,
) -> Result<CrawlReport, CrawlError> {
    if !credentials.is_complete() {
        return Ok(CrawlReport::not_crawled(SessionOutcome::NoCredentials));
    }

    let session = BrowserSession::launch(&config.browser)
        .await
        .map_err(|e| CrawlError::Browser(format!("{:#}", e)))?;

    let report = SiteCrawler::new(&config.crawl)
        .crawl(session.page(), start_url, credentials, max_pages)
        .await;

    if let Err(e) = session.close().await {
        log::warn!("{:#}", e);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakePage;
    use std::collections::HashSet;

    const ROOT: &str = "https://shop.test/home";

    fn config() -> CrawlConfig {
        CrawlConfig {
            selector_timeout_ms: 10,
            post_login_timeout_ms: 10,
            ..CrawlConfig::default()
        }
    }

    async fn crawl(page: &FakePage, max_pages: usize) -> CrawlResult {
        let config = config();
        SiteCrawler::new(&config).crawl_pages(page, ROOT, max_pages).await
    }

    /// home -> a, b ; a -> c, home ; b -> a, d
    fn site() -> FakePage {
        FakePage::new()
            .with_page(ROOT, "<h1>Home</h1>")
            .with_page("https://shop.test/a", "<h1>A</h1>")
            .with_page("https://shop.test/b", "<h1>B</h1>")
            .with_page("https://shop.test/c", "<h1>C</h1>")
            .with_page("https://shop.test/d", "<h1>D</h1>")
            .with_link(ROOT, "https://shop.test/a")
            .with_link(ROOT, "https://shop.test/b")
            .with_link("https://shop.test/a", "https://shop.test/c")
            .with_link("https://shop.test/a", ROOT)
            .with_link("https://shop.test/b", "https://shop.test/a")
            .with_link("https://shop.test/b", "https://shop.test/d")
    }

    #[tokio::test]
    async fn test_single_page_site() {
        let page = FakePage::new().with_page(ROOT, "<p>only page</p>");
        let result = crawl(&page, 5).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(ROOT).unwrap().content_excerpt, "<p>only page</p>");
    }

    #[tokio::test]
    async fn test_breadth_first_visit_order() {
        let result = crawl(&site(), 10).await;
        assert_eq!(
            result.urls(),
            vec![
                ROOT,
                "https://shop.test/a",
                "https://shop.test/b",
                "https://shop.test/c",
                "https://shop.test/d"
            ]
        );
        let ordinals: Vec<usize> = result.iter().map(|p| p.discovered_at).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_max_pages_bound_and_no_duplicates() {
        for max_pages in 1..=6 {
            let result = crawl(&site(), max_pages).await;
            assert!(result.len() <= max_pages);
            let unique: HashSet<&str> = result.urls().into_iter().collect();
            assert_eq!(unique.len(), result.len());
        }
    }

    #[tokio::test]
    async fn test_navigation_failure_is_skipped() {
        let page = site().with_unreachable("https://shop.test/a");
        let result = crawl(&page, 10).await;
        assert!(result.get("https://shop.test/a").is_none());
        assert!(result.get("https://shop.test/b").is_some());
        assert!(result.get("https://shop.test/d").is_some());
    }

    #[tokio::test]
    async fn test_failed_links_do_not_crowd_out_reachable_ones() {
        let page = FakePage::new()
            .with_page(ROOT, "<p>home</p>")
            .with_link(ROOT, "https://shop.test/down-1")
            .with_link(ROOT, "https://shop.test/down-2")
            .with_link(ROOT, "https://shop.test/up")
            .with_page("https://shop.test/up", "<p>up</p>")
            .with_unreachable("https://shop.test/down-1")
            .with_unreachable("https://shop.test/down-2");

        let result = crawl(&page, 2).await;
        assert_eq!(result.urls(), vec![ROOT, "https://shop.test/up"]);
    }

    #[tokio::test]
    async fn test_link_failure_keeps_snapshot() {
        let page = FakePage::new()
            .with_page(ROOT, "<p>home</p>")
            .with_broken_links(ROOT);
        let result = crawl(&page, 5).await;
        assert_eq!(result.urls(), vec![ROOT]);
    }

    #[tokio::test]
    async fn test_excerpt_is_bounded() {
        let html = "é".repeat(5000);
        let page = FakePage::new().with_page(ROOT, &html);
        let result = crawl(&page, 1).await;
        assert_eq!(result.get(ROOT).unwrap().content_excerpt.chars().count(), 4000);
    }

    #[tokio::test]
    async fn test_filters_resources_root_and_foreign_links() {
        let page = FakePage::new()
            .with_page(ROOT, "<p>home</p>")
            .with_page("https://shop.test/", "<p>root</p>")
            .with_page("https://shop.test/report.PDF", "%PDF")
            .with_page("https://shop.test/about", "<p>about</p>")
            .with_link(ROOT, "https://shop.test/")
            .with_link(ROOT, "https://shop.test/report.PDF")
            .with_link(ROOT, "https://shop.test.evil.com/x")
            .with_link(ROOT, "https://shop.test/about");
        let result = crawl(&page, 10).await;
        assert_eq!(result.urls(), vec![ROOT, "https://shop.test/about"]);
    }

    #[tokio::test]
    async fn test_crawl_requires_session() {
        let page = site();
        let config = config();
        let report = SiteCrawler::new(&config)
            .crawl(&page, ROOT, &Credentials::new("u", "p"), 5)
            .await;
        assert!(matches!(report.outcome, SessionOutcome::NoLoginFormFound));
        assert!(report.pages.is_empty());
    }

    #[tokio::test]
    async fn test_crawl_after_login() {
        let page = site()
            .with_visible(ROOT, "input, form")
            .with_visible(ROOT, "#email")
            .with_visible(ROOT, "#password")
            .with_visible(ROOT, "#submitButton")
            .on_click_reveal("#submitButton", "#searchPanel");
        let config = config();
        let report = SiteCrawler::new(&config)
            .crawl(&page, ROOT, &Credentials::new("u", "p"), 3)
            .await;
        assert_eq!(report.outcome, SessionOutcome::Success);
        assert_eq!(report.pages.len(), 3);
    }

    #[tokio::test]
    async fn test_crawl_site_without_credentials_skips_browser() {
        let report = crawl_site(&AppConfig::default(), ROOT, &Credentials::default(), 5)
            .await
            .unwrap();
        assert_eq!(report.outcome, SessionOutcome::NoCredentials);
        assert!(report.pages.is_empty());
    }

    #[test]
    fn test_should_enqueue() {
        let start = Url::parse(ROOT).unwrap();
        assert!(should_enqueue("https://shop.test/cart?x=1", &start));
        assert!(!should_enqueue("https://shop.test", &start));
        assert!(!should_enqueue("http://shop.test/cart", &start));
        assert!(!should_enqueue("https://shop.test/app.js", &start));
        assert!(!should_enqueue("not a url", &start));
    }
}
