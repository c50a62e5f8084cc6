//! Scrape Session: headless Chrome, jeden izolovaný browser na session.
//!
//! Stavový automat: Idle → Launched → Navigated → ChallengeWait → Extracted → Closed,
//! do Closed se jde z každého stavu. `close()` je idempotentní a volá ho i `Drop`,
//! takže Chrome proces se uvolní na každé cestě, včetně chyb a panik.

use crate::challenge::looks_like_challenge;
use crate::error::ScrapeError;
use crate::extract::{extract_records, Extracted, RecordSpec};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub locale: String,
    pub proxy: Option<String>,
    pub nav_timeout: Duration,
    /// Max čekání na zmizení challenge stránky
    pub challenge_timeout: Duration,
    pub challenge_poll: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport: (1366, 768),
            locale: "en-US".to_string(),
            proxy: None,
            nav_timeout: Duration::from_secs(60),
            challenge_timeout: Duration::from_secs(20),
            challenge_poll: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Launched,
    Navigated,
    ChallengeWait,
    Extracted,
    Closed,
}

pub struct ScrapeSession {
    options: SessionOptions,
    state: SessionState,
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    current_url: Option<String>,
}

impl ScrapeSession {
    pub fn new(options: SessionOptions) -> Self {
        Self { options, state: SessionState::Idle, browser: None, tab: None, current_url: None }
    }

    /// Spustí vlastní Chrome instanci pro tuto session
    pub fn open(options: SessionOptions) -> Result<Self, ScrapeError> {
        let mut session = Self::new(options);
        session.launch()?;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn launch(&mut self) -> Result<(), ScrapeError> {
        if self.state != SessionState::Idle {
            return Err(ScrapeError::Browser(format!("cannot launch from state {:?}", self.state)));
        }

        let lang_arg = format!("--lang={}", self.options.locale);
        let ua_arg = format!("--user-agent={}", self.options.user_agent);
        let args: Vec<&OsStr> = vec![
            OsStr::new(&lang_arg),
            OsStr::new(&ua_arg),
            OsStr::new("--disable-blink-features=AutomationControlled"),
        ];

        let launch = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some(self.options.viewport))
            .proxy_server(self.options.proxy.as_deref())
            .args(args)
            .idle_browser_timeout(self.options.nav_timeout + self.options.challenge_timeout + Duration::from_secs(30))
            .build()
            .map_err(|e| ScrapeError::Browser(format!("launch options: {e}")))?;

        let browser = Browser::new(launch).map_err(|e| ScrapeError::Browser(format!("launch failed: {e}")))?;
        let tab = browser.new_tab().map_err(|e| ScrapeError::Browser(format!("new tab failed: {e}")))?;
        tab.set_default_timeout(self.options.nav_timeout);

        let accept_language = format!("{},en;q=0.9", self.options.locale);
        tab.set_user_agent(&self.options.user_agent, Some(&accept_language), Some("Win32"))
            .map_err(|e| ScrapeError::Browser(format!("set user agent failed: {e}")))?;

        debug!(proxy = ?self.options.proxy, "Chrome session launched");
        self.browser = Some(browser);
        self.tab = Some(tab);
        self.state = SessionState::Launched;
        Ok(())
    }

    fn live_tab(&self) -> Result<Arc<Tab>, ScrapeError> {
        match (&self.tab, self.state) {
            (_, SessionState::Closed) => Err(ScrapeError::Browser("session already closed".into())),
            (Some(tab), _) => Ok(Arc::clone(tab)),
            (None, _) => Err(ScrapeError::Browser("session not launched".into())),
        }
    }

    pub fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let tab = self.live_tab()?;
        let nav_err = |e: &dyn std::fmt::Display| ScrapeError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let started = Instant::now();
        tab.navigate_to(url).map_err(|e| nav_err(&e))?;
        tab.wait_until_navigated().map_err(|e| nav_err(&e))?;

        debug!("Navigated to {} in {}ms", url, started.elapsed().as_millis());
        self.current_url = Some(url.to_string());
        self.state = SessionState::Navigated;
        Ok(())
    }

    /// Polluje title + obsah, dokud challenge markery nezmizí; po timeoutu Blocked
    pub fn await_challenge(&mut self) -> Result<(), ScrapeError> {
        let tab = self.live_tab()?;
        self.state = SessionState::ChallengeWait;

        let url = self.current_url.clone().unwrap_or_default();
        let deadline = Instant::now() + self.options.challenge_timeout;
        let mut polls = 0u32;

        loop {
            let title = tab.get_title().unwrap_or_default();
            let html = tab.get_content().map_err(|e| ScrapeError::Browser(format!("read content: {e}")))?;

            if !looks_like_challenge(&title, &html) {
                if polls > 0 {
                    info!("Challenge on {} resolved after {} polls", url, polls);
                }
                return Ok(());
            }

            if Instant::now() >= deadline {
                warn!("Challenge on {} still present after {:?}", url, self.options.challenge_timeout);
                return Err(ScrapeError::Blocked(url));
            }

            polls += 1;
            std::thread::sleep(self.options.challenge_poll);
        }
    }

    pub fn extract(&mut self, specs: &[RecordSpec]) -> Result<Extracted, ScrapeError> {
        let tab = self.live_tab()?;
        let title = tab.get_title().unwrap_or_default();
        let html = tab.get_content().map_err(|e| ScrapeError::Browser(format!("read content: {e}")))?;

        if looks_like_challenge(&title, &html) {
            return Err(ScrapeError::Blocked(self.current_url.clone().unwrap_or_default()));
        }

        let out = extract_records(&html, specs)?;
        self.state = SessionState::Extracted;
        Ok(out)
    }

    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close(false) {
                debug!("tab close failed: {}", e);
            }
        }
        // drop Browser = kill Chrome procesu
        self.browser.take();
        self.state = SessionState::Closed;
    }

    /// Celý průchod jedné stránky: navigate → challenge → extract, close vždy
    pub fn scrape_once(options: SessionOptions, url: &str, specs: &[RecordSpec]) -> Result<Extracted, ScrapeError> {
        let mut session = Self::open(options)?;
        let result = session.navigate(url)
            .and_then(|_| session.await_challenge())
            .and_then(|_| session.extract(specs));
        session.close();
        result
    }
}

impl Drop for ScrapeSession {
    fn drop(&mut self) {
        self.close();
    }
}
