//! PageSource: šev mezi joby a browserem. Produkce: `BrowserSource`
//! (nová izolovaná session pro každou stránku), testy: `StaticPages`.

use crate::challenge::{html_title, looks_like_challenge};
use crate::error::ScrapeError;
use crate::extract::{extract_records, Extracted, RecordSpec};
use crate::session::{ScrapeSession, SessionOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub trait PageSource: Send + Sync {
    /// Blokující: otevře stránku (volitelně přes proxy) a vytáhne záznamy
    fn scrape(&self, url: &str, specs: &[RecordSpec], proxy: Option<&str>) -> Result<Extracted, ScrapeError>;
}

pub struct BrowserSource {
    options: SessionOptions,
}

impl BrowserSource {
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }
}

impl PageSource for BrowserSource {
    fn scrape(&self, url: &str, specs: &[RecordSpec], proxy: Option<&str>) -> Result<Extracted, ScrapeError> {
        let mut options = self.options.clone();
        options.proxy = proxy.map(str::to_string);
        ScrapeSession::scrape_once(options, url, specs)
    }
}

/// Fixture zdroj: HTML podle URL, bez browseru
#[derive(Default)]
pub struct StaticPages {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, html: impl Into<String>) {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(url.into(), html.into());
        }
    }

    pub fn remove(&self, url: &str) {
        if let Ok(mut pages) = self.pages.lock() {
            pages.remove(url);
        }
    }

    /// (url, proxy) všech požadavků v pořadí
    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl PageSource for StaticPages {
    fn scrape(&self, url: &str, specs: &[RecordSpec], proxy: Option<&str>) -> Result<Extracted, ScrapeError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push((url.to_string(), proxy.map(str::to_string)));
        }

        let html = self.pages.lock()
            .ok()
            .and_then(|pages| pages.get(url).cloned())
            .ok_or_else(|| ScrapeError::Network(format!("no page for {url}")))?;

        if looks_like_challenge(&html_title(&html), &html) {
            return Err(ScrapeError::Blocked(url.to_string()));
        }
        extract_records(&html, specs)
    }
}

/// Spustí blokující scrape mimo async runtime
pub async fn scrape_blocking(
    source: Arc<dyn PageSource>,
    url: String,
    specs: Vec<RecordSpec>,
    proxy: Option<String>,
) -> Result<Extracted, ScrapeError> {
    tokio::task::spawn_blocking(move || source.scrape(&url, &specs, proxy.as_deref()))
        .await
        .map_err(|e| ScrapeError::Browser(format!("scrape task failed: {e}")))?
}
