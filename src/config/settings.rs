//! Typed view of the synced config
//!
//! The patcher works on raw text; this module parses the result with the
//! `toml` crate so the launcher can validate credentials and show what the
//! server will see. Every field has a default, so sparse files still load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Key under which the base `[llm]` table is exposed.
pub const DEFAULT_LLM: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub max_tokens: u32,
    /// None means unlimited
    pub max_input_tokens: Option<u32>,
    pub temperature: f64,
    /// openai, azure, or ollama
    pub api_type: String,
    pub api_version: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            max_tokens: 4096,
            max_input_tokens: None,
            temperature: 1.0,
            api_type: "openai".to_string(),
            api_version: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProxySettings {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub disable_security: bool,
    pub extra_chromium_args: Vec<String>,
    pub chrome_instance_path: Option<String>,
    pub wss_url: Option<String>,
    pub cdp_url: Option<String>,
    pub proxy: Option<ProxySettings>,
    pub max_content_length: u32,
    /// Milliseconds
    pub timeout: u64,
    pub retry_count: u32,
    /// Milliseconds
    pub retry_delay: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            disable_security: true,
            extra_chromium_args: Vec::new(),
            chrome_instance_path: None,
            wss_url: None,
            cdp_url: None,
            proxy: None,
            max_content_length: 2000,
            timeout: 30000,
            retry_count: 3,
            retry_delay: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub engine: String,
    pub engine_url: Option<String>,
    pub fallback_engines: Vec<String>,
    /// Seconds to wait before retrying all engines
    pub retry_delay: u64,
    pub max_retries: u32,
    pub lang: String,
    pub country: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            engine: "Google".to_string(),
            engine_url: None,
            fallback_engines: vec![
                "DuckDuckGo".to_string(),
                "Baidu".to_string(),
                "Bing".to_string(),
            ],
            retry_delay: 60,
            max_retries: 3,
            lang: "en".to_string(),
            country: "us".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    pub use_sandbox: bool,
    pub image: String,
    pub work_dir: String,
    pub memory_limit: String,
    pub cpu_limit: f64,
    /// Seconds
    pub timeout: u64,
    pub network_enabled: bool,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            use_sandbox: false,
            image: "python:3.12-slim".to_string(),
            work_dir: "/workspace".to_string(),
            memory_limit: "512m".to_string(),
            cpu_limit: 1.0,
            timeout: 300,
            network_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    pub server_reference: String,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            server_reference: "app.mcp.server".to_string(),
        }
    }
}

/// All settings the server reads, keyed the way the server keys them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSettings {
    /// `default` plus one entry per `[llm.<name>]` override table
    pub llm: BTreeMap<String, LlmSettings>,
    pub browser: Option<BrowserSettings>,
    pub search: Option<SearchSettings>,
    pub sandbox: SandboxSettings,
    pub mcp: McpSettings,
}

/// Errors loading typed settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

impl AppSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let mut root: toml::Table = toml::from_str(content)?;

        let llm = Self::llm_settings(root.remove("llm"))?;

        let browser = match root.remove("browser") {
            Some(value) => {
                let mut browser: BrowserSettings = value.try_into()?;
                // A proxy without a server is treated as no proxy.
                if browser.proxy.as_ref().is_some_and(|p| p.server.is_empty()) {
                    browser.proxy = None;
                }
                Some(browser)
            }
            None => None,
        };

        let search: Option<SearchSettings> =
            root.remove("search").map(|v| v.try_into()).transpose()?;
        let sandbox: SandboxSettings = root
            .remove("sandbox")
            .map(|v| v.try_into())
            .transpose()?
            .unwrap_or_default();
        let mcp: McpSettings = root
            .remove("mcp")
            .map(|v| v.try_into())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            llm,
            browser,
            search,
            sandbox,
            mcp,
        })
    }

    /// `[llm]` scalars form the default; each sub-table overrides them.
    fn llm_settings(
        value: Option<toml::Value>,
    ) -> Result<BTreeMap<String, LlmSettings>, SettingsError> {
        let table = match value {
            Some(toml::Value::Table(table)) => table,
            _ => toml::Table::new(),
        };

        let (overrides, base): (Vec<_>, Vec<_>) =
            table.into_iter().partition(|(_, v)| v.is_table());
        let base: toml::Table = base.into_iter().collect();

        let mut out: BTreeMap<String, LlmSettings> = BTreeMap::new();
        out.insert(
            DEFAULT_LLM.to_string(),
            toml::Value::Table(base.clone()).try_into()?,
        );

        for (name, value) in overrides {
            let mut merged = base.clone();
            if let toml::Value::Table(fields) = value {
                merged.extend(fields);
            }
            out.insert(name, toml::Value::Table(merged).try_into()?);
        }

        Ok(out)
    }

    /// Read and parse `path`.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Like [`AppSettings::load`], but a broken or missing file yields
    /// [`AppSettings::fallback`] with a warning.
    pub fn load_or_fallback(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("{}; using built-in fallback settings", err);
                Self::fallback()
            }
        }
    }

    /// Minimal settings used when the config cannot be parsed.
    pub fn fallback() -> Self {
        let mut llm = BTreeMap::new();
        llm.insert(
            DEFAULT_LLM.to_string(),
            LlmSettings {
                temperature: 0.7,
                ..LlmSettings::default()
            },
        );
        Self {
            llm,
            browser: Some(BrowserSettings {
                headless: true,
                ..BrowserSettings::default()
            }),
            search: Some(SearchSettings {
                engine: "Google".to_string(),
                engine_url: Some("https://www.google.com".to_string()),
                lang: "ja".to_string(),
                country: "jp".to_string(),
                ..SearchSettings::default()
            }),
            sandbox: SandboxSettings::default(),
            mcp: McpSettings::default(),
        }
    }

    /// The base `[llm]` settings.
    pub fn default_llm(&self) -> LlmSettings {
        self.llm.get(DEFAULT_LLM).cloned().unwrap_or_default()
    }
}
