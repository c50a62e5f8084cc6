//! HLTV.org scrape vrstva pro sync joby
//!
//! - `session`: headless Chrome session s garantovaným úklidem (jeden browser na session)
//! - `extract`: selector-driven extrakce záznamů z HTML
//! - `challenge`: detekce anti-bot interstitialu
//! - `source`: `PageSource` šev (browser vs. fixtures)
//! - `retry`: retry policy s exponenciálním backoffem
//! - `pages`: HLTV URL, selektory, typované řádky

pub mod challenge;
pub mod error;
pub mod extract;
pub mod pages;
pub mod retry;
pub mod session;
pub mod source;

pub use error::ScrapeError;
pub use extract::{extract_records, Extracted, Record, RecordSpec};
pub use pages::HltvPages;
pub use retry::RetryPolicy;
pub use session::{ScrapeSession, SessionOptions, SessionState};
pub use source::{scrape_blocking, BrowserSource, PageSource, StaticPages};
