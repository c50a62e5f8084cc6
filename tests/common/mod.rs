#![allow(dead_code)]

use canon_db::Store;
use hltv_scraper::{RetryPolicy, StaticPages};
use hltv_sync::{JobContext, SyncConfig};
use logger::RunLogger;
use proxy_pool::ProxyPool;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const BASE: &str = "https://hltv.test";

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

pub struct Harness {
    pub ctx: JobContext,
    pub pages: Arc<StaticPages>,
    pub log_dir: PathBuf,
}

/// Kontext bez browseru, bez proxy a bez retry čekání
pub fn harness() -> Harness {
    let log_dir = std::env::temp_dir().join(format!(
        "hltv-sync-test-{}-{}",
        std::process::id(),
        NEXT_DIR.fetch_add(1, Ordering::Relaxed)
    ));
    let config = SyncConfig {
        scrape_base_url: BASE.to_string(),
        log_dir: log_dir.clone(),
        use_proxies: false,
        scheduler_enabled: false,
        ..SyncConfig::default()
    };

    let pages = Arc::new(StaticPages::new());
    let mut ctx = JobContext::new(
        &config,
        Store::open_in_memory().unwrap(),
        pages.clone(),
        Arc::new(ProxyPool::disabled()),
        Arc::new(RunLogger::new(log_dir.clone())),
    );
    ctx.retry = RetryPolicy::none();

    Harness { ctx, pages, log_dir }
}

impl Harness {
    pub fn serve_all(&self) {
        self.pages.insert(format!("{BASE}/events"), EVENTS_HTML);
        self.pages.insert(format!("{BASE}/events/7148/event"), EVENT_PAGE_HTML);
        self.pages.insert(format!("{BASE}/ranking/teams"), RANKING_HTML);
        self.pages.insert(format!("{BASE}/results?event=7148"), RESULTS_HTML);
        self.pages.insert(format!("{BASE}/matches?event=7148"), UPCOMING_HTML);
        self.pages.insert(format!("{BASE}/"), NEWS_HTML);
    }

    /// Kanonické id eventu podle HLTV id
    pub fn event_id(&self, external_id: i64) -> i64 {
        self.ctx.store.event_by_external_id(external_id).unwrap().unwrap().id
    }

    pub fn team_id(&self, external_id: i64) -> i64 {
        self.ctx.store.team_by_external_id(external_id).unwrap().unwrap().id
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.log_dir);
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub const EVENTS_HTML: &str = r#"
<html><head><title>CS2 Events | HLTV.org</title></head><body>
  <a href="/events/7148/pgl-major-copenhagen-2024" class="a-reset ongoing-event">
    <div class="event-name-small"><div class="text-ellipsis">PGL Major Copenhagen 2024</div></div>
    <div class="event-date"><span data-unix="1710806400000">Mar 19</span> - <span data-unix="1712016000000">Apr 2</span></div>
    <div class="event-location">Copenhagen, Denmark</div>
  </a>
  <a href="/events/7500/iem-cologne-2024" class="a-reset big-event">
    <div class="big-event-name">IEM Cologne 2024</div>
    <div class="event-date"><span data-unix="1723161600000">Aug 9</span></div>
  </a>
  <script src="/cdn-cgi/challenge-platform/scripts/jsd/main.js"></script>
</body></html>
"#;

pub const EVENT_PAGE_HTML: &str = r#"
<html><head><title>PGL Major Copenhagen 2024 | HLTV.org</title></head><body>
  <div class="team-box" data-seed="1">
    <div class="team-name"><a href="/team/4608/natus-vincere"><div class="text">Natus Vincere</div></a></div>
    <img class="team-logo" src="https://img-cdn.hltv.org/teamlogo/navi.svg">
    <div class="event-world-rank">#2</div>
  </div>
  <div class="team-box" data-seed="2">
    <div class="team-name"><a href="/team/6667/faze"><div class="text">FaZe</div></a></div>
    <div class="event-world-rank">#4</div>
  </div>
  <div class="related-events"><a href="/events/7259/pgl-major-copenhagen-2024-opening-stage">Opening Stage</a></div>
</body></html>
"#;

pub const RANKING_HTML: &str = r#"
<html><head><title>CS2 Ranking | HLTV.org</title></head><body>
  <div class="ranked-team standard-box">
    <span class="position">#1</span>
    <div class="team-logo"><img src="https://img-cdn.hltv.org/teamlogo/navi.svg"></div>
    <div class="teamLine"><span class="name">Natus Vincere</span></div>
    <div class="team-flag"><img title="Ukraine" src="/img/flag/UA.gif"></div>
    <a class="moreLink" href="/team/4608/natus-vincere">Team profile</a>
  </div>
  <div class="ranked-team standard-box">
    <span class="position">#3 (+2)</span>
    <div class="teamLine"><span class="name">Spirit</span></div>
    <div class="team-flag"><img title="Russia" src="/img/flag/RU.gif"></div>
    <a class="moreLink" href="/team/7020/spirit">Team profile</a>
  </div>
</body></html>
"#;

/// NAVI 2-1 FaZe, NAVI 2-0 G2, FaZe 16-14 G2 (bo1)
pub const RESULTS_HTML: &str = r#"
<html><head><title>Results | HLTV.org</title></head><body>
  <div class="result-con" data-zonedgrouping-entry-unix="1710900000000">
    <a href="/matches/2370727/navi-vs-faze" class="a-reset"></a>
    <div class="team1"><a href="/team/4608/natus-vincere"><div class="team">Natus Vincere</div></a></div>
    <div class="result-score"><span class="score-won">2</span> - <span class="score-lost">1</span></div>
    <div class="team2"><a href="/team/6667/faze"><div class="team">FaZe</div></a></div>
    <div class="map-text">bo3</div>
  </div>
  <div class="result-con" data-zonedgrouping-entry-unix="1711000000000">
    <a href="/matches/2370730/navi-vs-g2" class="a-reset"></a>
    <div class="team1"><a href="/team/4608/natus-vincere"><div class="team">Natus Vincere</div></a></div>
    <div class="result-score"><span class="score-won">2</span> - <span class="score-lost">0</span></div>
    <div class="team2"><a href="/team/5995/g2"><div class="team">G2</div></a></div>
    <div class="map-text">bo3</div>
  </div>
  <div class="result-con" data-zonedgrouping-entry-unix="1711100000000">
    <a href="/matches/2370733/faze-vs-g2" class="a-reset"></a>
    <div class="team1"><a href="/team/6667/faze"><div class="team">FaZe</div></a></div>
    <div class="result-score"><span class="score-won">16</span> - <span class="score-lost">14</span></div>
    <div class="team2"><a href="/team/5995/g2"><div class="team">G2</div></a></div>
    <div class="map-text">nuke</div>
  </div>
</body></html>
"#;

/// G2 vs Vitality naplánováno, druhý řádek má TBD soupeře
pub const UPCOMING_HTML: &str = r#"
<html><head><title>Matches | HLTV.org</title></head><body>
  <div class="upcomingMatch">
    <a href="/matches/2370800/g2-vs-vitality"></a>
    <div class="matchTime" data-unix="1711200000000"></div>
    <div class="team1"><a href="/team/5995/g2"><div class="team">G2</div></a></div>
    <div class="team2"><a href="/team/9565/vitality"><div class="team">Vitality</div></a></div>
    <div class="map-text">bo3</div>
  </div>
  <div class="upcomingMatch">
    <a href="/matches/2370801/tbd"></a>
    <div class="team1"><a href="/team/4608/natus-vincere"><div class="team">Natus Vincere</div></a></div>
    <div class="team2"><div class="team">TBD</div></div>
  </div>
</body></html>
"#;

pub const NEWS_HTML: &str = r#"
<html><head><title>CS2 News | HLTV.org</title></head><body>
  <a href="/news/38912/major-recap" class="newsline article" data-unix="1711900000000">
    <div class="newstext">Major recap</div>
  </a>
  <a href="/news/38915/cologne-invites" class="newsline article" data-unix="1711990000000">
    <div class="newstext">Cologne invites revealed</div>
  </a>
</body></html>
"#;
