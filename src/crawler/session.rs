//! Authenticated session establishment
//!
//! Logs into a site whose markup is unknown ahead of time: an optional
//! "sign in" affordance is clicked, then the email, password and submit
//! controls are located through the selector resolver, the form is
//! submitted and the page is probed for a post-login landmark.
//!
//! State flow:
//! `Start → MaybeClickSignIn → LocateEmail → LocatePassword → LocateSubmit
//!  → AwaitPostLoginSignal → Done`

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::driver::resolver::{resolve, resolve_any, MatchedLocator, ResolverTimeouts};
use crate::driver::traits::{LocatorCandidate, PageDriver};
use crate::error::CrawlError;
use crate::utils::config::CrawlConfig;
use crate::utils::prompt::Credentials;

/// Characters of page HTML logged when login fails
const DIAGNOSTIC_HTML_CHARS: usize = 1000;

/// Terminal result of a login attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// A post-login landmark became visible
    Success,
    /// Neither a landmark nor an error message appeared; crawling proceeds
    /// opportunistically since some sites redirect without a landmark
    Ambiguous,
    LoginFailed(String),
    NoCredentials,
    /// The start page carries no form controls at all
    NoLoginFormFound,
    /// The start URL could not be loaded
    NavigationFailed(String),
}

impl SessionOutcome {
    /// Whether crawling may continue after this outcome
    pub fn permits_crawl(&self) -> bool {
        matches!(self, SessionOutcome::Success | SessionOutcome::Ambiguous)
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Success => write!(f, "logged in"),
            SessionOutcome::Ambiguous => write!(f, "login result unclear, continuing"),
            SessionOutcome::LoginFailed(reason) => write!(f, "login failed: {}", reason),
            SessionOutcome::NoCredentials => write!(f, "no credentials provided"),
            SessionOutcome::NoLoginFormFound => write!(f, "no login form found"),
            SessionOutcome::NavigationFailed(reason) => write!(f, "navigation failed: {}", reason),
        }
    }
}

/// Candidate lists for every control the login flow touches
#[derive(Debug, Clone)]
pub struct LoginSelectors {
    /// Optional entry point that reveals the login form
    pub sign_in: Vec<LocatorCandidate>,
    pub email: Vec<LocatorCandidate>,
    pub password: Vec<LocatorCandidate>,
    pub submit: Vec<LocatorCandidate>,
    /// Landmarks that only exist once logged in
    pub post_login: Vec<LocatorCandidate>,
    /// Error banners shown for rejected credentials
    pub login_error: Vec<LocatorCandidate>,
    /// Probe telling whether the page has any form controls
    pub any_form_control: String,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            sign_in: vec![
                LocatorCandidate::css("a[href*='login']"),
                LocatorCandidate::css("button:has-text('Sign In')"),
                LocatorCandidate::css("button:has-text('Log In')"),
            ],
            email: vec![
                LocatorCandidate::id("userNameInput"),
                LocatorCandidate::id("email"),
                LocatorCandidate::name("email"),
                LocatorCandidate::css("[data-testid='email']"),
                LocatorCandidate::css("input[type='email']"),
                LocatorCandidate::xpath("//input[contains(@placeholder, 'Email')]"),
            ],
            password: vec![
                LocatorCandidate::id("passwordInput"),
                LocatorCandidate::id("password"),
                LocatorCandidate::name("password"),
                LocatorCandidate::css("[data-testid='password']"),
                LocatorCandidate::css("input[type='password']"),
                LocatorCandidate::xpath("//input[contains(@placeholder, 'Password')]"),
            ],
            submit: vec![
                LocatorCandidate::id("submitButton"),
                LocatorCandidate::role("button[name=\"Sign in\"]"),
                LocatorCandidate::role("button[name=\"Log in\"]"),
                LocatorCandidate::css("[data-testid='submit']"),
                LocatorCandidate::css("button[type='submit']"),
                LocatorCandidate::css(".submit"),
            ],
            post_login: vec![
                LocatorCandidate::id("searchPanel"),
                LocatorCandidate::role("search"),
                LocatorCandidate::css(".search-panel"),
            ],
            login_error: vec![
                LocatorCandidate::text("Invalid credentials"),
                LocatorCandidate::text("Login failed"),
                LocatorCandidate::css("[role='alert']"),
            ],
            any_form_control: "input, form".to_string(),
        }
    }
}

#[derive(Debug)]
enum SessionState {
    Start,
    MaybeClickSignIn,
    LocateEmail,
    LocatePassword {
        email: MatchedLocator,
    },
    LocateSubmit {
        email: MatchedLocator,
        password: MatchedLocator,
    },
    AwaitPostLoginSignal,
    Done(SessionOutcome),
}

fn exhausted(field: &str) -> SessionState {
    let err = CrawlError::LocatorExhausted {
        field: field.to_string(),
    };
    SessionState::Done(SessionOutcome::LoginFailed(err.to_string()))
}

/// Drives the login state machine against one page
pub struct SessionEstablisher<'a> {
    config: &'a CrawlConfig,
    selectors: &'a LoginSelectors,
}

impl<'a> SessionEstablisher<'a> {
    pub fn new(config: &'a CrawlConfig, selectors: &'a LoginSelectors) -> Self {
        Self { config, selectors }
    }

    fn field_timeouts(&self) -> ResolverTimeouts {
        ResolverTimeouts::new(self.config.selector_timeout_ms, self.config.selector_budget_ms)
    }

    /// Run the login flow to completion
    ///
    /// Unexpected driver errors are folded into [`SessionOutcome::LoginFailed`].
    pub async fn establish(
        &self,
        page: &dyn PageDriver,
        start_url: &str,
        credentials: &Credentials,
    ) -> SessionOutcome {
        if !credentials.is_complete() {
            return SessionOutcome::NoCredentials;
        }

        let outcome = match self.run(page, start_url, credentials).await {
            Ok(outcome) => outcome,
            Err(e) => SessionOutcome::LoginFailed(format!("{:#}", e)),
        };

        match &outcome {
            SessionOutcome::Success => log::info!("Logged in successfully at {}", start_url),
            SessionOutcome::Ambiguous => log::warn!(
                "No post-login landmark or error message found at {}, continuing",
                start_url
            ),
            other => {
                log::warn!("Session not established: {}", other);
                self.capture_diagnostics(page).await;
            }
        }
        outcome
    }

    async fn run(
        &self,
        page: &dyn PageDriver,
        start_url: &str,
        credentials: &Credentials,
    ) -> anyhow::Result<SessionOutcome> {
        let mut state = SessionState::Start;

        loop {
            state = match state {
                SessionState::Start => {
                    log::info!("Navigating to {}...", start_url);
                    match page.goto(start_url, self.config.navigation_timeout_ms).await {
                        Ok(()) => SessionState::MaybeClickSignIn,
                        Err(e) => SessionState::Done(SessionOutcome::NavigationFailed(format!(
                            "{:#}",
                            e
                        ))),
                    }
                }

                SessionState::MaybeClickSignIn => {
                    self.maybe_click_sign_in(page).await;
                    SessionState::LocateEmail
                }

                SessionState::LocateEmail => {
                    let resolved = resolve(page, &self.selectors.email, self.field_timeouts())
                        .await
                        .matched();
                    match resolved {
                        Some(email) => SessionState::LocatePassword { email },
                        None => {
                            if page.exists(&self.selectors.any_form_control).await? {
                                exhausted("email input")
                            } else {
                                SessionState::Done(SessionOutcome::NoLoginFormFound)
                            }
                        }
                    }
                }

                SessionState::LocatePassword { email } => {
                    match resolve(page, &self.selectors.password, self.field_timeouts())
                        .await
                        .matched()
                    {
                        Some(password) => SessionState::LocateSubmit { email, password },
                        None => exhausted("password input"),
                    }
                }

                SessionState::LocateSubmit { email, password } => {
                    match resolve(page, &self.selectors.submit, self.field_timeouts())
                        .await
                        .matched()
                    {
                        Some(submit) => {
                            self.submit(page, credentials, &email, &password, &submit)
                                .await?;
                            SessionState::AwaitPostLoginSignal
                        }
                        None => exhausted("submit button"),
                    }
                }

                SessionState::AwaitPostLoginSignal => {
                    SessionState::Done(self.await_post_login(page).await)
                }

                SessionState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    async fn maybe_click_sign_in(&self, page: &dyn PageDriver) {
        for candidate in &self.selectors.sign_in {
            let selector = candidate.to_selector();
            if !page.exists(&selector).await.unwrap_or(false) {
                continue;
            }
            log::info!("Clicking sign-in affordance: {}", selector);
            match page.click(&selector, self.config.selector_timeout_ms).await {
                Ok(()) => page.pause(self.config.sign_in_settle_ms).await,
                Err(e) => log::debug!("sign-in click failed, assuming form is shown: {:#}", e),
            }
            return;
        }
    }

    async fn submit(
        &self,
        page: &dyn PageDriver,
        credentials: &Credentials,
        email: &MatchedLocator,
        password: &MatchedLocator,
        submit: &MatchedLocator,
    ) -> anyhow::Result<()> {
        let timeout = self.config.selector_timeout_ms;

        log::info!("Filling email with selector: {}", email.selector);
        page.fill(&email.selector, &credentials.username, timeout).await?;
        page.pause(self.config.fill_settle_ms).await;

        log::info!("Filling password with selector: {}", password.selector);
        page.fill(&password.selector, &credentials.password, timeout).await?;
        page.pause(self.config.fill_settle_ms).await;

        log::info!("Clicking submit with selector: {}", submit.selector);
        page.click(&submit.selector, timeout).await?;
        Ok(())
    }

    async fn await_post_login(&self, page: &dyn PageDriver) -> SessionOutcome {
        let landmark = resolve_any(
            page,
            &self.selectors.post_login,
            Duration::from_millis(self.config.post_login_timeout_ms),
        )
        .await;
        if landmark.matched().is_some() {
            return SessionOutcome::Success;
        }

        for candidate in &self.selectors.login_error {
            if let Ok(Some(text)) = page.inner_text(&candidate.to_selector()).await {
                let text = text.trim().to_string();
                log::warn!("Login failed with error: {}", text);
                return SessionOutcome::LoginFailed(text);
            }
        }

        page.pause(self.config.ambiguous_wait_ms).await;
        SessionOutcome::Ambiguous
    }

    async fn capture_diagnostics(&self, page: &dyn PageDriver) {
        match page.content().await {
            Ok(html) => log::debug!(
                "Page HTML on failure:\n{}...",
                super::truncate_chars(&html, DIAGNOSTIC_HTML_CHARS)
            ),
            Err(e) => log::debug!("Could not get page content on failure: {:#}", e),
        }

        if let Some(ref dir) = self.config.diagnostics_dir {
            let path: PathBuf = dir.join(format!(
                "login_failure_{}.png",
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            ));
            match page.screenshot(&path).await {
                Ok(()) => log::info!("Saved login failure screenshot: {}", path.display()),
                Err(e) => log::debug!("Could not save screenshot: {:#}", e),
            }
        }
    }
}
