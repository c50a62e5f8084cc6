//! Konfigurace z prostředí (+ volitelný `.env` přes dotenv v binárkách).
//! Chybějící proměnná = default, nevalidní hodnota = chyba při startu.

use anyhow::{anyhow, Result};
use hltv_scraper::{RetryPolicy, SessionOptions};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.hltv.org";

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_path: PathBuf,
    pub http_bind: SocketAddr,
    pub log_dir: PathBuf,
    /// Kanonické id eventu pro 10minutový championship polling
    pub championship_event_id: Option<i64>,
    pub scrape_base_url: String,
    pub proxy_sources: Vec<String>,
    pub use_proxies: bool,
    pub nav_timeout: Duration,
    pub challenge_timeout: Duration,
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    pub scheduler_enabled: bool,
    pub ntfy_topic: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/hltv.db"),
            http_bind: SocketAddr::from(([127, 0, 0, 1], 8090)),
            log_dir: PathBuf::from("logs"),
            championship_event_id: None,
            scrape_base_url: DEFAULT_BASE_URL.to_string(),
            proxy_sources: proxy_pool::DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            use_proxies: true,
            nav_timeout: Duration::from_secs(60),
            challenge_timeout: Duration::from_secs(20),
            retry_max_attempts: 3,
            retry_base_delay: Duration::from_millis(2000),
            scheduler_enabled: true,
            ntfy_topic: None,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Stejné jako `from_env`, jen s vlastním zdrojem hodnot
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let d = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let proxy_sources = match get("PROXY_SOURCES") {
            Some(list) => list.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
            None => d.proxy_sources,
        };

        Ok(Self {
            database_path: get("DATABASE_PATH").map(PathBuf::from).unwrap_or(d.database_path),
            http_bind: parse_var(&get, "HTTP_BIND", d.http_bind)?,
            log_dir: get("LOG_DIR").map(PathBuf::from).unwrap_or(d.log_dir),
            championship_event_id: get("CHAMPIONSHIP_EVENT_ID")
                .map(|v| v.parse::<i64>().map_err(|e| anyhow!("CHAMPIONSHIP_EVENT_ID={v}: {e}")))
                .transpose()?,
            scrape_base_url: get("SCRAPE_BASE_URL").unwrap_or(d.scrape_base_url),
            proxy_sources,
            use_proxies: parse_bool(&get, "USE_PROXIES", d.use_proxies)?,
            nav_timeout: Duration::from_secs(parse_var(&get, "NAV_TIMEOUT_SECS", 60)?),
            challenge_timeout: Duration::from_secs(parse_var(&get, "CHALLENGE_TIMEOUT_SECS", 20)?),
            retry_max_attempts: parse_var(&get, "RETRY_MAX_ATTEMPTS", d.retry_max_attempts)?,
            retry_base_delay: Duration::from_millis(parse_var(&get, "RETRY_BASE_DELAY_MS", 2000)?),
            scheduler_enabled: parse_bool(&get, "SCHEDULER_ENABLED", d.scheduler_enabled)?,
            ntfy_topic: get("NTFY_TOPIC"),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_max_attempts, self.retry_base_delay)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            nav_timeout: self.nav_timeout,
            challenge_timeout: self.challenge_timeout,
            ..SessionOptions::default()
        }
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(v) => v.parse().map_err(|e| anyhow!("{key}={v}: {e}")),
        None => Ok(default),
    }
}

fn parse_bool(get: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match get(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(anyhow!("{key}={other}: expected true/false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<SyncConfig> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        SyncConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = load(&[]).unwrap();
        assert_eq!(c.http_bind.to_string(), "127.0.0.1:8090");
        assert_eq!(c.championship_event_id, None);
        assert_eq!(c.proxy_sources.len(), 3);
        assert!(c.use_proxies && c.scheduler_enabled);
        assert_eq!(c.retry_policy().max_attempts, 3);
    }

    #[test]
    fn reads_overrides() {
        let c = load(&[
            ("CHAMPIONSHIP_EVENT_ID", "42"),
            ("PROXY_SOURCES", "http://a/list.txt, http://b/list.txt"),
            ("USE_PROXIES", "false"),
            ("NAV_TIMEOUT_SECS", "30"),
            ("NTFY_TOPIC", "hltv-sync"),
        ])
        .unwrap();
        assert_eq!(c.championship_event_id, Some(42));
        assert_eq!(c.proxy_sources, vec!["http://a/list.txt", "http://b/list.txt"]);
        assert!(!c.use_proxies);
        assert_eq!(c.session_options().nav_timeout, Duration::from_secs(30));
        assert_eq!(c.ntfy_topic.as_deref(), Some("hltv-sync"));
    }

    #[test]
    fn invalid_values_fail_with_key_in_message() {
        let err = load(&[("CHAMPIONSHIP_EVENT_ID", "major")]).unwrap_err();
        assert!(err.to_string().contains("CHAMPIONSHIP_EVENT_ID"));
        assert!(load(&[("USE_PROXIES", "maybe")]).is_err());
        assert!(load(&[("HTTP_BIND", "localhost")]).is_err());
    }
}
