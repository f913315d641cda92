use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;

/// Strategy used by a locator candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorKind {
    /// Element id attribute
    Id,
    /// Form control name attribute
    Name,
    /// ARIA role attribute, optionally with a name filter: `button[name="Sign in"]`
    Role,
    /// Visible text
    Text,
    /// Raw CSS (Playwright pseudo-classes such as `:has-text()` allowed)
    Css,
    /// Raw XPath
    XPath,
}

/// One way of locating an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorCandidate {
    pub kind: LocatorKind,
    pub value: String,
}

impl LocatorCandidate {
    pub fn new(kind: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Id, value)
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Name, value)
    }

    pub fn role(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Role, value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Text, value)
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Css, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::XPath, value)
    }

    /// Convert to a Playwright selector string
    pub fn to_selector(&self) -> String {
        match self.kind {
            LocatorKind::Id => format!("#{}", self.value),
            LocatorKind::Name => format!("[name=\"{}\"]", self.value),
            LocatorKind::Role => role_selector(&self.value),
            LocatorKind::Text => format!("text=\"{}\"", self.value),
            LocatorKind::Css => self.value.clone(),
            LocatorKind::XPath => format!("xpath={}", self.value),
        }
    }
}

impl LocatorKind {
    /// Whether the rendered selector is plain CSS and can join a selector group
    pub fn is_css(self) -> bool {
        !matches!(self, LocatorKind::Text | LocatorKind::XPath)
    }
}

/// `button[name="Sign in"]` becomes `[role="button"]:has-text("Sign in")`
fn role_selector(value: &str) -> String {
    let Some((role, filter)) = value.split_once('[') else {
        return format!("[role=\"{}\"]", value.trim());
    };
    let name = filter
        .trim_end_matches(']')
        .trim_start_matches("name=")
        .trim_matches(|c: char| c == '"' || c == '\'');
    format!("[role=\"{}\"]:has-text(\"{}\")", role.trim(), name)
}

impl fmt::Display for LocatorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_selector())
    }
}

/// Browser page interface used by the login and crawl logic
///
/// The Playwright-backed implementation lives in [`crate::driver::web`];
/// tests substitute an in-memory page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait for DOMContentLoaded
    async fn goto(&self, url: &str, timeout_ms: u64) -> Result<()>;

    /// Wait until an element matching `selector` is visible
    ///
    /// # Returns
    /// True if the element became visible, false on timeout
    async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<bool>;

    /// Whether any element currently matches `selector` (no waiting)
    async fn exists(&self, selector: &str) -> Result<bool>;

    async fn click(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    async fn fill(&self, selector: &str, value: &str, timeout_ms: u64) -> Result<()>;

    /// Inner text of the first element matching `selector`, if any
    async fn inner_text(&self, selector: &str) -> Result<Option<String>>;

    /// Full HTML of the current document
    async fn content(&self) -> Result<String>;

    /// Absolute URLs of every `a[href]` starting with `origin`
    async fn same_origin_links(&self, origin: &str) -> Result<Vec<String>>;

    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Suspend for a fixed settle interval
    async fn pause(&self, ms: u64) {
        if ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
        }
    }
}
