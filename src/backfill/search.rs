//! Search section defaults

use launcher_toml::Document;

use super::{BackfillReport, Finding};

const TABLE: &str = "search";

/// Engine name -> default landing URL. Unknown engines fall back to Google.
const ENGINE_URLS: &[(&str, &str)] = &[
    ("google", "https://www.google.com"),
    ("bing", "https://www.bing.com"),
    ("duckduckgo", "https://duckduckgo.com"),
    ("yahoo", "https://search.yahoo.com"),
];

/// Values written when `[search]` is missing entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDefaults {
    pub engine: String,
    pub lang: String,
    pub country: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            engine: "google".to_string(),
            lang: "en".to_string(),
            country: "us".to_string(),
        }
    }
}

/// Default URL for an engine name, case-insensitively.
pub fn default_engine_url(engine: &str) -> &'static str {
    let engine = engine.trim().to_lowercase();
    ENGINE_URLS
        .iter()
        .find(|(name, _)| *name == engine)
        .map_or(ENGINE_URLS[0].1, |(_, url)| *url)
}

/// Backfill `[search]` in `doc`.
pub fn backfill_search(doc: &mut Document, defaults: &SearchDefaults) -> BackfillReport {
    let mut report = BackfillReport::default();

    if !doc.has_table(TABLE) {
        let url = default_engine_url(&defaults.engine);
        doc.append_block(
            TABLE,
            &[
                ("engine", defaults.engine.as_str()),
                ("engine_url", url),
                ("lang", defaults.lang.as_str()),
                ("country", defaults.country.as_str()),
            ],
        );
        report.added.extend(
            ["engine", "engine_url", "lang", "country"]
                .iter()
                .map(|key| format!("{}.{}", TABLE, key)),
        );
        return report;
    }

    match doc.get_text(TABLE, "engine_url") {
        None => {
            let engine = doc.get_text(TABLE, "engine").unwrap_or_default();
            if doc.backfill(TABLE, "engine_url", default_engine_url(&engine)) {
                report.added.push(format!("{}.engine_url", TABLE));
            }
        }
        Some(url) => {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                report.findings.push(Finding::InvalidEngineUrl(url));
            }
        }
    }

    report
}
