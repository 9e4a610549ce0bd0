//! Browser section defaults

use launcher_toml::Document;

use super::{BackfillReport, Finding};

const TABLE: &str = "browser";
const PROXY_TABLE: &str = "browser.proxy";

/// Values written when `[browser]` is missing, or when individual timing
/// keys are missing from an existing section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserDefaults {
    pub headless: bool,
    pub disable_security: bool,
    /// Milliseconds
    pub timeout: u64,
    pub retry_count: u32,
    /// Milliseconds
    pub retry_delay: u64,
}

impl Default for BrowserDefaults {
    fn default() -> Self {
        Self {
            headless: false,
            disable_security: true,
            timeout: 30000,
            retry_count: 3,
            retry_delay: 1000,
        }
    }
}

impl BrowserDefaults {
    /// Keys backfilled one by one into an existing section.
    fn timing(&self) -> [(&'static str, String); 3] {
        [
            ("timeout", self.timeout.to_string()),
            ("retry_count", self.retry_count.to_string()),
            ("retry_delay", self.retry_delay.to_string()),
        ]
    }
}

/// Backfill `[browser]` in `doc` and check proxy credentials.
pub fn backfill_browser(doc: &mut Document, defaults: &BrowserDefaults) -> BackfillReport {
    let mut report = BackfillReport::default();

    if doc.has_table(TABLE) {
        for (key, value) in defaults.timing() {
            if doc.backfill(TABLE, key, &value) {
                report.added.push(format!("{}.{}", TABLE, key));
            }
        }
    } else {
        let headless = defaults.headless.to_string();
        let disable_security = defaults.disable_security.to_string();
        let timing = defaults.timing();

        let mut pairs: Vec<(&str, &str)> = vec![
            ("headless", headless.as_str()),
            ("disable_security", disable_security.as_str()),
        ];
        pairs.extend(timing.iter().map(|(key, value)| (*key, value.as_str())));

        doc.append_block(TABLE, &pairs);
        report
            .added
            .extend(pairs.iter().map(|(key, _)| format!("{}.{}", TABLE, key)));
    }

    if proxy_credentials_incomplete(doc) {
        report.findings.push(Finding::IncompleteProxyCredentials);
    }

    report
}

fn proxy_credentials_incomplete(doc: &Document) -> bool {
    let present = |key: &str| {
        doc.get_text(PROXY_TABLE, key)
            .is_some_and(|value| !value.is_empty())
    };
    present("server") && !(present("username") && present("password"))
}
