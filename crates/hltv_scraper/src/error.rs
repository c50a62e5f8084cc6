use thiserror::Error;

/// Chyby scrape vrstvy
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Timeout, spadlé spojení nebo nefunkční egress (proxy)
    #[error("network error: {0}")]
    Network(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Anti-bot challenge je na stránce i po čekání
    #[error("anti-bot challenge still present on {0}")]
    Blocked(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}

impl ScrapeError {
    /// Stojí za to zkusit znovu (s jinou proxy) v rámci stejného běhu
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Navigation { .. } | Self::Blocked(_))
    }

    /// Selhání, za které může egress; proxy dostane failure
    pub fn is_egress_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Navigation { .. })
    }
}
