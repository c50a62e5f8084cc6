//! Lease per job name: cron tick a ruční trigger stejného jobu nepoběží přes sebe.
//! Lease má TTL: zaseknutý běh po vypršení převezme kdokoliv další.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug)]
struct Lease {
    token: u64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    leases: Mutex<HashMap<String, Lease>>,
    next_token: AtomicU64,
}

#[derive(Debug, Clone, Default)]
pub struct JobLocks {
    inner: Arc<Inner>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn leases(&self) -> MutexGuard<'_, HashMap<String, Lease>> {
        self.inner.leases.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// None = lease drží jiný, ještě nevypršelý běh
    pub fn try_acquire(&self, name: &str, ttl: Duration) -> Option<LeaseGuard> {
        let now = Instant::now();
        let mut leases = self.leases();

        if let Some(held) = leases.get(name) {
            if held.expires_at > now {
                return None;
            }
            warn!("Lease {} expired, taking over", name);
        }

        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        leases.insert(name.to_string(), Lease { token, expires_at: now + ttl });
        debug!("Lease {} acquired (ttl {:?})", name, ttl);

        Some(LeaseGuard { locks: self.clone(), name: name.to_string(), token })
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.leases().get(name).is_some_and(|l| l.expires_at > Instant::now())
    }

    fn release(&self, name: &str, token: u64) {
        let mut leases = self.leases();
        // převzatý lease patří novému držiteli
        if leases.get(name).is_some_and(|l| l.token == token) {
            leases.remove(name);
        }
    }
}

/// Uvolní lease při dropu
#[derive(Debug)]
pub struct LeaseGuard {
    locks: JobLocks,
    name: String,
    token: u64,
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        self.locks.release(&self.name, self.token);
    }
}
