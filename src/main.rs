/// HLTV sync daemon
///
/// Co dělá:
///   1. Drží kanonickou DB eventů, týmů a zápasů aktuální (scraping přes browser + proxy pool)
///   2. Přepočítává team stats, H2H a Swiss stage
///   3. Opravuje stav eventů podle kalendáře a aktivity zápasů
///   4. Pouští joby podle kadencí + ruční trigger přes HTTP (POST /cron/<job>)
///
/// Spuštění:
///   cargo run --bin sync-daemon

use anyhow::{Context, Result};
use canon_db::Store;
use dotenv::dotenv;
use hltv_scraper::BrowserSource;
use hltv_sync::api::{router, AppState};
use hltv_sync::{scheduler, JobContext, SyncConfig};
use logger::{now_iso, ProxyRefreshEvent, RunLogger};
use proxy_pool::ProxyPool;
use std::env;
use std::fs::File;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let config = SyncConfig::from_env().context("invalid configuration")?;

    info!("=== HLTV sync daemon v{} ===", env!("CARGO_PKG_VERSION"));
    info!("DB: {:?} | Logs: {:?}", config.database_path, config.log_dir);

    // Single instance lock
    let lock_file_path = env::temp_dir().join("hltv_sync_daemon.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of sync-daemon is already running! Exiting.");
            return Ok(());
        }
    };

    let store = Store::open(&config.database_path)
        .with_context(|| format!("opening {:?}", config.database_path))?;
    let runs = Arc::new(RunLogger::new(config.log_dir.clone()));

    let proxies = if config.use_proxies {
        let pool = ProxyPool::new(config.proxy_sources.clone(), config.scrape_base_url.clone());
        let candidates = pool.refresh().await;
        runs.events().log_quiet(&ProxyRefreshEvent {
            ts:         now_iso(),
            event:      "PROXY_REFRESH",
            candidates,
            replaced:   candidates > 0,
        });
        info!("🌐 Proxy pool: {} candidates", candidates);
        pool
    } else {
        info!("🌐 Proxies disabled, direct egress");
        ProxyPool::disabled()
    };

    let source = Arc::new(BrowserSource::new(config.session_options()));
    let ctx = JobContext::new(&config, store, source, Arc::new(proxies), runs);

    if config.scheduler_enabled {
        let tasks = scheduler::spawn(ctx.clone());
        info!("🗓️  Scheduler: {} cadences", tasks.len());
    } else {
        info!("Scheduler disabled, manual triggers only");
    }

    let app = router(AppState::new(ctx)).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(config.http_bind)
        .await
        .with_context(|| format!("binding {}", config.http_bind))?;
    info!("🚀 READY: trigger API on http://{}", config.http_bind);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
