//! Config file handling
//!
//! - `locator`: find or seed `config/config.toml`
//! - `store`: read-modify-write access to the active file
//! - `settings`: typed, defaulted view for validation

mod locator;
mod settings;
mod store;

pub use locator::{
    ensure_config, ConfigLocation, LocateError, LocateOutcome, CONFIG_DIR, CONFIG_FILE,
    EXAMPLE_FILE,
};
pub use settings::{
    AppSettings, BrowserSettings, LlmSettings, McpSettings, ProxySettings, SandboxSettings,
    SearchSettings, SettingsError, DEFAULT_LLM,
};
pub use store::{ConfigStore, StoreError, SyncReport, UpdateReport, REDACTED};
