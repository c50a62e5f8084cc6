use crate::error::ScrapeError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Strop pro exponenciální backoff
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Omezený počet pokusů s exponenciálním backoffem kolem každého fetch.
/// Opakují se jen `is_retryable()` chyby; zbytek rovnou nahoru.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(2), max_delay: MAX_BACKOFF }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay, max_delay: MAX_BACKOFF }
    }

    /// Jeden pokus, žádné čekání
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Čekání po `retry`-tém neúspěchu (0 = po prvním pokusu)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// `op` dostává číslo pokusu (od 0)
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ScrapeError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ScrapeError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let wait = self.delay_for(attempt);
                    warn!("{} attempt {}/{} failed: {} (retry in {:?})", label, attempt + 1, attempts, e, wait);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
