//! Self-healing selector resolution
//!
//! Tries an ordered list of locator candidates against the live page and
//! returns the first one that matches a visible element. Order encodes
//! reliability: structural identifiers (id/name) first, then role/text,
//! then raw CSS/XPath.

use super::traits::{LocatorCandidate, PageDriver};
use std::time::{Duration, Instant};

/// A candidate that matched a visible element
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedLocator {
    pub candidate: LocatorCandidate,
    /// Playwright selector string to act on
    pub selector: String,
    /// 1-based position of the candidate in the list
    pub attempts: usize,
}

/// Outcome of resolving a candidate list
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Matched(MatchedLocator),
    NotFound { attempted: usize },
}

impl Resolution {
    pub fn matched(self) -> Option<MatchedLocator> {
        match self {
            Resolution::Matched(m) => Some(m),
            Resolution::NotFound { .. } => None,
        }
    }
}

/// Timing for one resolution
#[derive(Debug, Clone, Copy)]
pub struct ResolverTimeouts {
    /// Wait per candidate
    pub per_candidate: Duration,
    /// Overall budget for the whole list
    pub total: Duration,
}

impl ResolverTimeouts {
    pub fn new(per_candidate_ms: u64, total_ms: u64) -> Self {
        Self {
            per_candidate: Duration::from_millis(per_candidate_ms),
            total: Duration::from_millis(total_ms),
        }
    }
}

/// Resolve the first visible candidate, strictly in list order
///
/// Never fails: driver errors count as "not matched" for that candidate and
/// exhausting the list or the budget yields [`Resolution::NotFound`].
pub async fn resolve(
    page: &dyn PageDriver,
    candidates: &[LocatorCandidate],
    timeouts: ResolverTimeouts,
) -> Resolution {
    let started = Instant::now();
    let mut attempted = 0;

    for candidate in candidates {
        let remaining = timeouts.total.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            log::debug!("selector budget exhausted after {} candidates", attempted);
            break;
        }
        let wait = timeouts.per_candidate.min(remaining);
        let selector = candidate.to_selector();
        attempted += 1;

        match page
            .wait_for_visible(&selector, wait.as_millis() as u64)
            .await
        {
            Ok(true) => {
                log::debug!("selector matched: {}", selector);
                return Resolution::Matched(MatchedLocator {
                    candidate: candidate.clone(),
                    selector,
                    attempts: attempted,
                });
            }
            Ok(false) => log::debug!("selector not visible: {}", selector),
            Err(e) => log::debug!("selector wait failed for {}: {}", selector, e),
        }
    }

    Resolution::NotFound { attempted }
}

/// Wait for any of several interchangeable landmarks within one budget
///
/// CSS-compatible candidates are merged into a single selector group and
/// waited on once; text and XPath candidates each get an equal share.
pub async fn resolve_any(
    page: &dyn PageDriver,
    candidates: &[LocatorCandidate],
    total: Duration,
) -> Resolution {
    let (css, other): (Vec<&LocatorCandidate>, Vec<&LocatorCandidate>) =
        candidates.iter().partition(|c| c.kind.is_css());

    let mut groups = Vec::with_capacity(other.len() + 1);
    if !css.is_empty() {
        let joined = css
            .iter()
            .map(|c| c.to_selector())
            .collect::<Vec<_>>()
            .join(", ");
        groups.push(LocatorCandidate::css(joined));
    }
    groups.extend(other.into_iter().cloned());

    if groups.is_empty() {
        return Resolution::NotFound { attempted: 0 };
    }
    let timeouts = ResolverTimeouts {
        per_candidate: total / groups.len() as u32,
        total,
    };
    resolve(page, &groups, timeouts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakePage;

    const URL: &str = "https://site.test/login";

    fn candidates() -> Vec<LocatorCandidate> {
        vec![
            LocatorCandidate::id("user"),
            LocatorCandidate::name("email"),
            LocatorCandidate::css("input[type='email']"),
            LocatorCandidate::xpath("//input[contains(@placeholder, 'Email')]"),
        ]
    }

    async fn page_with(visible: &[&str]) -> FakePage {
        let mut page = FakePage::new().with_page(URL, "<form></form>");
        for sel in visible {
            page = page.with_visible(URL, sel);
        }
        page.goto(URL, 1000).await.unwrap();
        page
    }

    #[tokio::test]
    async fn test_stops_at_first_visible_match() {
        let page = page_with(&["input[type='email']", "xpath=//input[contains(@placeholder, 'Email')]"]).await;

        let resolution = resolve(&page, &candidates(), ResolverTimeouts::new(100, 10_000)).await;

        let matched = resolution.matched().expect("third candidate should match");
        assert_eq!(matched.attempts, 3);
        assert_eq!(matched.selector, "input[type='email']");
        assert_eq!(
            page.calls_with_prefix("wait:"),
            vec!["wait:#user", "wait:[name=\"email\"]", "wait:input[type='email']"]
        );
    }

    #[tokio::test]
    async fn test_prefers_earlier_candidate() {
        let page = page_with(&["#user", "input[type='email']"]).await;
        let matched = resolve(&page, &candidates(), ResolverTimeouts::new(100, 10_000))
            .await
            .matched()
            .unwrap();
        assert_eq!(matched.candidate, LocatorCandidate::id("user"));
        assert_eq!(page.calls_with_prefix("wait:").len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_after_all_candidates() {
        let page = page_with(&[]).await;
        let resolution = resolve(&page, &candidates(), ResolverTimeouts::new(100, 10_000)).await;
        assert_eq!(resolution, Resolution::NotFound { attempted: 4 });
    }

    #[tokio::test]
    async fn test_zero_budget_tries_nothing() {
        let page = page_with(&["#user"]).await;
        let resolution = resolve(&page, &candidates(), ResolverTimeouts::new(100, 0)).await;
        assert_eq!(resolution, Resolution::NotFound { attempted: 0 });
    }

    #[tokio::test]
    async fn test_resolve_any_reaches_last_landmark() {
        let page = FakePage::new()
            .with_page(URL, "<div class='search-panel'></div>")
            .with_visible(URL, ".search-panel")
            .with_slow_misses();
        page.goto(URL, 1000).await.unwrap();
        let landmarks = vec![
            LocatorCandidate::id("searchPanel"),
            LocatorCandidate::role("search"),
            LocatorCandidate::css(".search-panel"),
        ];

        let matched = resolve_any(&page, &landmarks, Duration::from_millis(50))
            .await
            .matched()
            .expect("grouped landmark should match");
        assert_eq!(matched.selector, "#searchPanel, [role=\"search\"], .search-panel");
        assert_eq!(page.calls_with_prefix("wait:").len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_any_splits_budget_for_xpath() {
        let page = page_with(&["xpath=//nav"]).await.with_slow_misses();
        let landmarks = vec![LocatorCandidate::id("missing"), LocatorCandidate::xpath("//nav")];

        let resolution = resolve_any(&page, &landmarks, Duration::from_millis(400)).await;
        assert_eq!(resolution.matched().unwrap().selector, "xpath=//nav");
        assert_eq!(
            page.calls_with_prefix("wait:"),
            vec!["wait:#missing", "wait:xpath=//nav"]
        );
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let page = page_with(&["#user"]).await;
        let resolution = resolve(&page, &[], ResolverTimeouts::new(100, 1000)).await;
        assert_eq!(resolution, Resolution::NotFound { attempted: 0 });
    }
}
