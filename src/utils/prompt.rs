//! Instruction preprocessing
//!
//! Pulls the target URL, credentials and element keywords out of a
//! free-text instruction when they were not supplied separately.

use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));
static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"username\s*=\s*'([^']+)'").expect("valid username regex"));
static PASSWORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"password\s*=\s*'([^']+)'").expect("valid password regex"));

/// Vocabulary used to tell the inspector what to focus on
const ELEMENT_KEYWORDS: &[&str] = &[
    "search", "input", "button", "title", "heading", "section", "link", "locator", "element",
    "screenshot", "scroll", "verify", "assert", "check", "capture", "wait", "load", "click",
    "fill", "submit", "navigate", "page", "url", "text", "selector", "xpath", "css", "id",
    "name", "class", "tag", "role",
];

const DEFAULT_KEY_ELEMENTS: &str = "main interactive elements";

/// Login credentials for the target site
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Resolved inputs for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub instruction: String,
    pub site_url: Option<String>,
    pub credentials: Credentials,
    pub max_pages: usize,
}

impl RunRequest {
    /// Fill missing URL and credentials from the instruction text
    pub fn resolve(
        instruction: &str,
        site_url: Option<String>,
        username: Option<String>,
        password: Option<String>,
        max_pages: usize,
    ) -> Self {
        let site_url = site_url
            .filter(|u| !u.trim().is_empty())
            .or_else(|| extract_url(instruction));
        let username = username
            .filter(|u| !u.is_empty())
            .or_else(|| capture(&USERNAME_PATTERN, instruction))
            .unwrap_or_default();
        let password = password
            .filter(|p| !p.is_empty())
            .or_else(|| capture(&PASSWORD_PATTERN, instruction))
            .unwrap_or_default();

        Self {
            instruction: instruction.to_string(),
            site_url,
            credentials: Credentials::new(username, password),
            max_pages,
        }
    }

    pub fn key_elements(&self) -> String {
        key_elements(&self.instruction)
    }
}

pub fn extract_url(text: &str) -> Option<String> {
    URL_PATTERN.find(text).map(|m| m.as_str().to_string())
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Keywords from the fixed vocabulary found in the instruction
///
/// Plain substring matching, so "identity" also yields "id".
pub fn key_elements(instruction: &str) -> String {
    let lower = instruction.to_lowercase();
    let found: Vec<&str> = ELEMENT_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| lower.contains(kw))
        .collect();

    if found.is_empty() {
        DEFAULT_KEY_ELEMENTS.to_string()
    } else {
        found.join(", ")
    }
}
