//! Probe binárka: jedna session proti zdroji, počty záznamů a stav challenge
//! Spustit: cargo run --bin scrape-probe [-- --prevalidate 20]

use anyhow::{Context, Result};
use dotenv::dotenv;
use hltv_scraper::pages::{event_list_specs, news_specs, parse_events, parse_news, parse_ranking, ranking_specs};
use hltv_scraper::{scrape_blocking, BrowserSource, HltvPages, PageSource, ScrapeError};
use hltv_sync::SyncConfig;
use proxy_pool::ProxyPool;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
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
    let prevalidate = prevalidate_limit()?;

    info!("🚀 Scrape probe against {}", config.scrape_base_url);

    let pool = ProxyPool::new(config.proxy_sources.clone(), config.scrape_base_url.clone());
    let mut proxy = None;
    if config.use_proxies {
        let candidates = pool.refresh().await;
        info!("🌐 Proxy candidates: {}", candidates);

        if let Some(limit) = prevalidate {
            info!("🩺 Pre-validating up to {} proxies...", limit);
            let passed = pool.prevalidate(limit).await;
            info!("Pre-validation: {} passed, {} healthy left", passed, pool.healthy_len());
        }
        proxy = pool.next().await;
    }
    info!("Using proxy: {:?}", proxy);

    let pages = HltvPages::new(config.scrape_base_url.clone());
    let source: Arc<dyn PageSource> = Arc::new(BrowserSource::new(config.session_options()));

    let probes = [
        ("events", pages.events_url(), event_list_specs()),
        ("ranking", pages.ranking_url(), ranking_specs()),
        ("news", pages.news_url(), news_specs()),
    ];

    for (label, url, specs) in probes {
        let started = Instant::now();
        match scrape_blocking(Arc::clone(&source), url.clone(), specs, proxy.clone()).await {
            Ok(extracted) => {
                let count = match label {
                    "events" => parse_events(&pages, &extracted).len(),
                    "ranking" => parse_ranking(&extracted).len(),
                    _ => parse_news(&pages, &extracted).len(),
                };
                info!("Probe {} -> {} records in {:?}, challenge passed", url, count, started.elapsed());
            }
            Err(ScrapeError::Blocked(_)) => {
                warn!("Probe {} -> still behind anti-bot challenge after {:?}", url, started.elapsed());
            }
            Err(e) => warn!("Probe {} failed: {}", url, e),
        }

        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    info!("✅ Probe done");
    Ok(())
}

/// `--prevalidate N` nebo `PROBE_PREVALIDATE=N`
fn prevalidate_limit() -> Result<Option<usize>> {
    let mut args = std::env::args().skip(1);
    let raw = loop {
        match args.next() {
            Some(a) if a == "--prevalidate" => break args.next(),
            Some(_) => continue,
            None => break std::env::var("PROBE_PREVALIDATE").ok(),
        }
    };

    raw.map(|v| v.parse::<usize>().with_context(|| format!("prevalidate limit {v}")))
        .transpose()
}
