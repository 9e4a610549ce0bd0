//! Default backfill passes
//!
//! Each pass fills in keys the server expects but the config may lack. A
//! pass only adds keys that are missing and never rewrites existing values,
//! so running it again is a no-op. Passes do their own read-modify-write
//! cycle on the file; they are not batched together.

mod browser;
mod search;

use std::fmt;

use tracing::{info, warn};

use crate::config::{ConfigStore, StoreError};

pub use browser::{backfill_browser, BrowserDefaults};
pub use search::{backfill_search, default_engine_url, SearchDefaults};

/// A non-fatal problem noticed while backfilling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// `search.engine_url` is not an http(s) URL.
    InvalidEngineUrl(String),
    /// `[browser.proxy]` has a server but lacks a username or password.
    IncompleteProxyCredentials,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::InvalidEngineUrl(url) => write!(
                f,
                "search.engine_url '{}' does not start with http:// or https://",
                url
            ),
            Finding::IncompleteProxyCredentials => write!(
                f,
                "browser.proxy.server is set without both username and password"
            ),
        }
    }
}

/// What a single pass did to the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Dotted paths that were added
    pub added: Vec<String>,
    pub findings: Vec<Finding>,
}

impl BackfillReport {
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }

    fn log(&self, pass: &str) {
        if self.changed() {
            info!("{} defaults added: {}", pass, self.added.join(", "));
        }
        for finding in &self.findings {
            warn!("{}", finding);
        }
    }
}

/// Run the search pass against the file.
pub fn check_search_defaults(store: &ConfigStore) -> Result<BackfillReport, StoreError> {
    let defaults = SearchDefaults::default();
    let (report, _) = store.modify(|doc| backfill_search(doc, &defaults))?;
    report.log("search");
    Ok(report)
}

/// Run the browser pass against the file.
pub fn check_browser_defaults(store: &ConfigStore) -> Result<BackfillReport, StoreError> {
    let defaults = BrowserDefaults::default();
    let (report, _) = store.modify(|doc| backfill_browser(doc, &defaults))?;
    report.log("browser");
    Ok(report)
}

/// Run both passes in order, each with its own read-modify-write. A missing
/// file skips both.
pub fn run_all(store: &ConfigStore) -> Result<Vec<BackfillReport>, StoreError> {
    if !store.exists() {
        warn!(
            "skipping default checks: {} does not exist",
            store.path().display()
        );
        return Ok(Vec::new());
    }
    Ok(vec![
        check_search_defaults(store)?,
        check_browser_defaults(store)?,
    ])
}
