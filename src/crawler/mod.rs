//! Authenticated site crawling
//!
//! Logs into the target site with self-healing locators and collects a
//! bounded excerpt of every page reachable breadth-first from the start URL.

pub mod crawl;
pub mod frontier;
pub mod session;

pub use crawl::{crawl_site, CrawlReport, CrawlResult, PageSnapshot, SiteCrawler};
pub use frontier::CrawlFrontier;
pub use session::{LoginSelectors, SessionEstablisher, SessionOutcome};

/// Longest prefix of `text` holding at most `max_chars` characters
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
