//! Application configuration
//!
//! Built once at startup (defaults, then an optional YAML file, then
//! environment overrides) and shared read-only through an `Arc`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub browser: BrowserConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
}

/// Text-generation endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrowserConfig {
    pub headless: bool,
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Explicit Chromium executable, otherwise Playwright's bundled one
    pub executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport_width: 1280,
            viewport_height: 720,
            executable: None,
        }
    }
}

/// Crawl and login timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrawlConfig {
    pub max_pages: usize,
    /// Characters of page HTML kept per snapshot
    pub excerpt_chars: usize,
    pub navigation_timeout_ms: u64,
    /// Wait per locator candidate
    pub selector_timeout_ms: u64,
    /// Overall budget for one candidate list
    pub selector_budget_ms: u64,
    /// Settle after clicking the sign-in affordance
    pub sign_in_settle_ms: u64,
    /// Settle after each filled field
    pub fill_settle_ms: u64,
    pub post_login_timeout_ms: u64,
    /// Extra wait when neither a landmark nor an error message shows up
    pub ambiguous_wait_ms: u64,
    /// Where to drop a screenshot when login fails
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            excerpt_chars: 4000,
            navigation_timeout_ms: 60_000,
            selector_timeout_ms: 10_000,
            selector_budget_ms: 60_000,
            sign_in_settle_ms: 2_000,
            fill_settle_ms: 1_000,
            post_login_timeout_ms: 30_000,
            ambiguous_wait_ms: 5_000,
            diagnostics_dir: None,
        }
    }
}

/// Artifact output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicit file, the default location, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("QAGEN_API_KEY").or_else(|| lookup("GROQ_API_KEY")) {
            if !key.trim().is_empty() {
                self.generator.api_key = Some(key.trim().to_string());
            }
        }
        if let Some(model) = lookup("QAGEN_MODEL") {
            self.generator.model = model;
        }
        if let Some(base_url) = lookup("QAGEN_BASE_URL") {
            self.generator.base_url = base_url;
        }
        if let Some(headless) = lookup("QAGEN_HEADLESS") {
            self.browser.headless = headless == "true" || headless == "1";
        }
        if let Some(max_pages) = lookup("QAGEN_MAX_PAGES").and_then(|v| v.parse().ok()) {
            self.crawl.max_pages = max_pages;
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("qa-suite-generator").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.crawl.max_pages, 5);
        assert_eq!(config.crawl.excerpt_chars, 4000);
        assert_eq!(config.generator.model, DEFAULT_MODEL);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
crawl:
  maxPages: 12
generator:
  model: "custom-model"
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.crawl.max_pages, 12);
        assert_eq!(config.crawl.navigation_timeout_ms, 60_000);
        assert_eq!(config.generator.model, "custom-model");
        assert_eq!(config.generator.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GROQ_API_KEY", "secret"),
            ("QAGEN_HEADLESS", "0"),
            ("QAGEN_MAX_PAGES", "9"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.generator.api_key.as_deref(), Some("secret"));
        assert!(!config.browser.headless);
        assert_eq!(config.crawl.max_pages, 9);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = AppConfig::default();
        config.generator.api_key = Some("secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }
}
