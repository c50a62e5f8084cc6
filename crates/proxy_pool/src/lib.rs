//! Proxy Pool: rotující pool výstupních proxy pro scraping
//!
//! - `refresh()` stáhne kandidáty z veřejných listů (`host:port` na řádek)
//!   a vymění celý pool jen pokud přišel aspoň jeden kandidát
//! - `next()` round-robin přes proxy s méně než 3 selháními,
//!   líný auto-refresh každých 30 minut (žádný background timer)
//! - `mark_failed()` zvedá counter; vyřazená proxy zůstává v poolu do dalšího refreshe
//! - `test()` je jen pro pre-validaci, `next()` ho nevolá

use futures_util::future::join_all;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Od kolika selhání proxy přestáváme vydávat
pub const FAILURE_THRESHOLD: u32 = 3;

/// Líný auto-refresh interval
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Timeout pro fetch listů i pro probe přes proxy
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_SOURCES: &[&str] = &[
    "https://api.proxyscrape.com/v2/?request=displayproxies&protocol=http&timeout=10000&country=all",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt",
    "https://raw.githubusercontent.com/clarketm/proxy-list/master/proxy-list-raw.txt",
];

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("proxy list fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("invalid proxy address: {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone)]
pub struct ProxyInfo {
    pub address:   String,
    pub failures:  u32,
    pub last_used: Option<Instant>,
}

impl ProxyInfo {
    fn fresh(address: String) -> Self {
        Self { address, failures: 0, last_used: None }
    }

    pub fn is_healthy(&self) -> bool {
        self.failures < FAILURE_THRESHOLD
    }
}

#[derive(Debug, Default)]
struct PoolState {
    entries: Vec<ProxyInfo>,
    cursor: usize,
    /// Poslední pokus o refresh (i neúspěšný), time-box pro líný refresh
    last_refresh_attempt: Option<Instant>,
}

pub struct ProxyPool {
    client: reqwest::Client,
    sources: Vec<String>,
    probe_target: String,
    refresh_every: Duration,
    state: Mutex<PoolState>,
}

impl ProxyPool {
    pub fn new(sources: Vec<String>, probe_target: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(PROBE_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            sources,
            probe_target: probe_target.into(),
            refresh_every: REFRESH_INTERVAL,
            state: Mutex::new(PoolState::default()),
        }
    }

    pub fn with_default_sources(probe_target: impl Into<String>) -> Self {
        Self::new(DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(), probe_target)
    }

    /// Pevný pool bez zdrojů, nikdy se sám neobnoví (testy, ruční seznam)
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pool = Self::new(Vec::new(), "");
        pool.install(addresses.into_iter().map(Into::into).collect());
        pool
    }

    /// Prázdný pool: `next()` vždy vrátí None, joby jedou bez proxy
    pub fn disabled() -> Self {
        Self::new(Vec::new(), "")
    }

    pub fn with_refresh_interval(mut self, every: Duration) -> Self {
        self.refresh_every = every;
        self
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn install(&self, addresses: Vec<String>) {
        let mut st = self.lock();
        st.entries = addresses.into_iter().map(ProxyInfo::fresh).collect();
        st.cursor = 0;
    }

    /// Stáhne všechny zdroje a pokud přišel aspoň jeden kandidát, atomicky vymění pool.
    /// Vrací počet kandidátů (0 = pool zůstal beze změny).
    pub async fn refresh(&self) -> usize {
        self.lock().last_refresh_attempt = Some(Instant::now());

        let candidates = self.fetch_candidates().await;
        if candidates.is_empty() {
            warn!("Proxy refresh: 0 candidates from {} sources, keeping current pool", self.sources.len());
            return 0;
        }

        let count = candidates.len();
        self.install(candidates);
        info!("Proxy refresh: pool replaced with {} candidates", count);
        count
    }

    async fn fetch_candidates(&self) -> Vec<String> {
        let bodies = join_all(self.sources.iter().map(|url| self.fetch_source(url))).await;

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for body in bodies {
            match body {
                Ok(text) => {
                    for addr in parse_candidates(&text) {
                        if seen.insert(addr.clone()) {
                            out.push(addr);
                        }
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
        out
    }

    async fn fetch_source(&self, url: &str) -> Result<String, ProxyError> {
        let fetch_err = |reason: String| ProxyError::Fetch { url: url.to_string(), reason };

        let resp = self.client.get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {status}")));
        }

        resp.text().await.map_err(|e| fetch_err(e.to_string()))
    }

    fn refresh_due(&self) -> bool {
        if self.sources.is_empty() {
            return false;
        }
        let st = self.lock();
        st.last_refresh_attempt.map_or(true, |t| t.elapsed() >= self.refresh_every)
    }

    /// Další zdravá proxy v round-robin pořadí, None pokud žádná není
    pub async fn next(&self) -> Option<String> {
        if self.refresh_due() {
            self.refresh().await;
        }

        let mut st = self.lock();
        let n = st.entries.len();
        for step in 0..n {
            let idx = (st.cursor + step) % n;
            if st.entries[idx].is_healthy() {
                st.cursor = (idx + 1) % n;
                st.entries[idx].last_used = Some(Instant::now());
                return Some(st.entries[idx].address.clone());
            }
        }

        debug!("Proxy pool: no healthy proxy ({} entries)", n);
        None
    }

    pub fn mark_failed(&self, address: &str) {
        let mut st = self.lock();
        if let Some(entry) = st.entries.iter_mut().find(|e| e.address == address) {
            entry.failures = entry.failures.saturating_add(1);
            if entry.failures == FAILURE_THRESHOLD {
                debug!("Proxy {} retired after {} failures", address, FAILURE_THRESHOLD);
            }
        }
    }

    /// Probe přes kandidáta na scrape target s omezeným timeoutem.
    /// Jakákoliv HTTP odpověď pod 500 znamená, že proxy target dosáhne.
    pub async fn test(&self, address: &str) -> bool {
        let proxy = match reqwest::Proxy::all(format!("http://{address}")) {
            Ok(p) => p,
            Err(e) => {
                debug!("{}", ProxyError::InvalidAddress(format!("{address}: {e}")));
                return false;
            }
        };

        let client = match reqwest::Client::builder().proxy(proxy).timeout(PROBE_TIMEOUT).build() {
            Ok(c) => c,
            Err(_) => return false,
        };

        match tokio::time::timeout(PROBE_TIMEOUT, client.get(&self.probe_target).send()).await {
            Ok(Ok(resp)) => resp.status().as_u16() < 500,
            Ok(Err(e)) => {
                debug!("Proxy probe {} failed: {}", address, e);
                false
            }
            Err(_) => {
                debug!("Proxy probe {} timed out", address);
                false
            }
        }
    }

    /// Otestuje až `limit` zdravých kandidátů a neprůchozí rovnou vyřadí.
    /// Vrací počet proxy, které probe prošly.
    pub async fn prevalidate(&self, limit: usize) -> usize {
        let candidates: Vec<String> = self.lock()
            .entries
            .iter()
            .filter(|e| e.is_healthy())
            .take(limit)
            .map(|e| e.address.clone())
            .collect();

        let results = join_all(candidates.iter().map(|addr| self.test(addr))).await;

        let mut st = self.lock();
        let mut passed = 0;
        for (addr, ok) in candidates.iter().zip(results) {
            if ok {
                passed += 1;
            } else if let Some(entry) = st.entries.iter_mut().find(|e| &e.address == addr) {
                entry.failures = entry.failures.max(FAILURE_THRESHOLD);
            }
        }
        info!("Proxy prevalidation: {}/{} passed", passed, candidates.len());
        passed
    }

    pub fn snapshot(&self) -> Vec<ProxyInfo> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn healthy_len(&self) -> usize {
        self.lock().entries.iter().filter(|e| e.is_healthy()).count()
    }
}

/// Vytáhne `host:port` páry z textu listu (jeden kandidát na token, volitelně se schématem)
pub fn parse_candidates(body: &str) -> Vec<String> {
    let pattern = match Regex::new(r"^(?:https?://)?([A-Za-z0-9][A-Za-z0-9.-]*):(\d{1,5})$") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    let mut out = Vec::new();
    for token in body.split_whitespace() {
        let Some(caps) = pattern.captures(token) else { continue };
        let host = &caps[1];
        match caps[2].parse::<u16>() {
            Ok(port) if port > 0 => out.push(format!("{host}:{port}")),
            _ => continue,
        }
    }
    out
}
