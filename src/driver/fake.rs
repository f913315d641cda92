//! In-memory page used by unit tests

use super::traits::PageDriver;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Default, Clone)]
struct FakeDoc {
    html: String,
    visible: HashSet<String>,
    texts: HashMap<String, String>,
    links: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    docs: HashMap<String, FakeDoc>,
    current: Option<String>,
    /// Selectors that become visible on every page after a click
    revealed: HashSet<String>,
    on_click: HashMap<String, Vec<String>>,
    unreachable: HashSet<String>,
    broken_links: HashSet<String>,
    /// A wait on a missing selector lasts its full timeout
    slow_misses: bool,
    calls: Vec<String>,
}

/// Scripted page: documents keyed by URL, visible selectors per document
#[derive(Debug, Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .docs
            .entry(url.to_string())
            .or_default()
            .html = html.to_string();
        self
    }

    pub fn with_visible(self, url: &str, selector: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .docs
            .entry(url.to_string())
            .or_default()
            .visible
            .insert(selector.to_string());
        self
    }

    pub fn with_text(self, url: &str, selector: &str, text: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let doc = state.docs.entry(url.to_string()).or_default();
            doc.visible.insert(selector.to_string());
            doc.texts.insert(selector.to_string(), text.to_string());
        }
        self
    }

    pub fn with_link(self, url: &str, target: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .docs
            .entry(url.to_string())
            .or_default()
            .links
            .push(target.to_string());
        self
    }

    /// Clicking `selector` reveals `revealed` on every page afterwards
    pub fn on_click_reveal(self, selector: &str, revealed: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .on_click
            .entry(selector.to_string())
            .or_default()
            .push(revealed.to_string());
        self
    }

    pub fn with_unreachable(self, url: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .unreachable
            .insert(url.to_string());
        self
    }

    /// Link extraction fails on this page
    pub fn with_broken_links(self, url: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .broken_links
            .insert(url.to_string());
        self
    }

    /// Make waits on invisible selectors consume their whole timeout
    pub fn with_slow_misses(self) -> Self {
        self.state.lock().unwrap().slow_misses = true;
        self
    }

    /// Every driver call in order, formatted as `op:argument`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    /// Exact match first, then any member of a comma-separated group
    fn is_visible_now(&self, selector: &str) -> bool {
        let state = self.state.lock().unwrap();
        let doc = state.current.as_ref().and_then(|url| state.docs.get(url));
        let visible = |sel: &str| {
            state.revealed.contains(sel) || doc.map_or(false, |d| d.visible.contains(sel))
        };
        visible(selector) || (selector.contains(',') && selector.split(',').any(|s| visible(s.trim())))
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str, _timeout_ms: u64) -> Result<()> {
        self.record(format!("goto:{}", url));
        let mut state = self.state.lock().unwrap();
        if state.unreachable.contains(url) || !state.docs.contains_key(url) {
            anyhow::bail!("net::ERR_NAME_NOT_RESOLVED at {}", url);
        }
        state.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<bool> {
        self.record(format!("wait:{}", selector));
        if self.is_visible_now(selector) {
            return Ok(true);
        }
        let slow = self.state.lock().unwrap().slow_misses;
        if slow {
            tokio::time::sleep(std::time::Duration::from_millis(timeout_ms)).await;
        }
        Ok(false)
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        self.record(format!("exists:{}", selector));
        Ok(self.is_visible_now(selector))
    }

    async fn click(&self, selector: &str, _timeout_ms: u64) -> Result<()> {
        self.record(format!("click:{}", selector));
        if !self.is_visible_now(selector) {
            anyhow::bail!("element not found: {}", selector);
        }
        let mut state = self.state.lock().unwrap();
        if let Some(revealed) = state.on_click.get(selector).cloned() {
            state.revealed.extend(revealed);
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str, _timeout_ms: u64) -> Result<()> {
        self.record(format!("fill:{}={}", selector, value));
        if !self.is_visible_now(selector) {
            anyhow::bail!("element not found: {}", selector);
        }
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .current
            .as_ref()
            .and_then(|url| state.docs.get(url))
            .and_then(|doc| doc.texts.get(selector).cloned()))
    }

    async fn content(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        Ok(state
            .current
            .as_ref()
            .and_then(|url| state.docs.get(url))
            .map(|doc| doc.html.clone())
            .unwrap_or_default())
    }

    async fn same_origin_links(&self, origin: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let Some(current) = state.current.clone() else {
            return Ok(Vec::new());
        };
        if state.broken_links.contains(&current) {
            anyhow::bail!("Execution context was destroyed");
        }
        Ok(state
            .docs
            .get(&current)
            .map(|doc| {
                doc.links
                    .iter()
                    .filter(|l| l.starts_with(origin))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(format!("screenshot:{}", path.display()));
        Ok(())
    }

    async fn pause(&self, ms: u64) {
        self.record(format!("pause:{}", ms));
    }
}
