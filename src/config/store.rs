//! Read-modify-write access to the active config file
//!
//! Every mutating operation reads the whole file, edits it in memory, and
//! overwrites the file in one `fs::write` only when the text changed. There is
//! no locking and no temp-file swap.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use launcher_toml::{DottedPath, Document, PatchOutcome, SectionView};
use tracing::{debug, info, warn};

use crate::env::{apply_to_document, reverse_mapping, AppliedOverride, EnvBinding, EnvLookup};

/// Placeholder shown instead of secret values.
pub const REDACTED: &str = "[REDACTED]";

/// Key fragments whose values are redacted on export.
const SECRET_KEYS: &[&str] = &["api_key", "password", "token", "secret"];

/// Errors accessing the config file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("config file {0} does not exist")]
    Missing(PathBuf),

    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of a batch of updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// `(path, outcome)` per requested update, in request order
    pub outcomes: Vec<(String, PatchOutcome)>,
    /// True if the file was rewritten
    pub written: bool,
}

/// Result of syncing environment overrides into the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub applied: Vec<AppliedOverride>,
    pub written: bool,
}

/// Handle on the active config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the raw file contents.
    pub fn read(&self) -> Result<String, StoreError> {
        if !self.exists() {
            return Err(StoreError::Missing(self.path.clone()));
        }
        fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the file with `content`.
    pub fn write(&self, content: &str) -> Result<(), StoreError> {
        fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    pub fn document(&self) -> Result<Document, StoreError> {
        Ok(Document::parse(&self.read()?))
    }

    /// Read the file, let `edit` change the document, and write it back if
    /// the serialized text differs.
    pub fn modify<T>(&self, edit: impl FnOnce(&mut Document) -> T) -> Result<(T, bool), StoreError> {
        let before = self.read()?;
        let mut doc = Document::parse(&before);
        let result = edit(&mut doc);
        let after = doc.to_string();

        if after == before {
            return Ok((result, false));
        }
        self.write(&after)?;
        debug!("rewrote {}", self.path.display());
        Ok((result, true))
    }

    /// A section's raw text, or None if it is absent or the file is
    /// unreadable.
    pub fn read_section(&self, name: &str) -> Option<SectionView> {
        match self.document() {
            Ok(doc) => doc.read_section(name),
            Err(err) => {
                debug!("read_section({}): {}", name, err);
                None
            }
        }
    }

    /// Every table and its trimmed body, in file order.
    pub fn sections(&self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self.document()?.sections())
    }

    /// Apply `(dotted.path, raw value)` updates in order, writing once.
    pub fn update<K, V>(&self, updates: &[(K, V)]) -> Result<UpdateReport, StoreError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (outcomes, written) = self.modify(|doc| {
            updates
                .iter()
                .map(|(path, value)| {
                    let outcome = doc.set(path.as_ref(), value.as_ref());
                    if let PatchOutcome::Skipped(reason) = &outcome {
                        warn!("not setting {}: {}", path.as_ref(), reason);
                    }
                    (path.as_ref().to_string(), outcome)
                })
                .collect::<Vec<_>>()
        })?;
        Ok(UpdateReport { outcomes, written })
    }

    /// Fold environment overrides into the file. A missing file is skipped
    /// with a warning rather than treated as an error.
    pub fn sync_env(
        &self,
        env: &dyn EnvLookup,
        table: &[EnvBinding],
    ) -> Result<SyncReport, StoreError> {
        if !self.exists() {
            warn!(
                "skipping environment sync: {} does not exist",
                self.path.display()
            );
            return Ok(SyncReport::default());
        }

        let (applied, written) = self.modify(|doc| apply_to_document(doc, env, table))?;
        if !applied.is_empty() {
            info!(
                "applied {} environment override(s) to {}",
                applied.len(),
                self.path.display()
            );
        }
        Ok(SyncReport { applied, written })
    }

    /// Turn config values back into `VAR=value` pairs using the reverse
    /// mapping. Paths not set in the file are omitted.
    pub fn export_env_vars(
        &self,
        table: &[EnvBinding],
        redact: bool,
    ) -> Result<Vec<(String, String)>, StoreError> {
        let doc = self.document()?;
        let mut out = Vec::new();

        for (path, var) in reverse_mapping(table) {
            let Ok(dotted) = DottedPath::parse(path) else {
                continue;
            };
            let Some(value) = doc.get_text(&dotted.table(), dotted.key()) else {
                continue;
            };
            let value = if redact && is_secret(dotted.key()) && !value.is_empty() {
                REDACTED.to_string()
            } else {
                value
            };
            out.push((var.to_string(), value));
        }

        Ok(out)
    }
}

fn is_secret(key: &str) -> bool {
    let key = key.to_lowercase();
    SECRET_KEYS.iter().any(|s| key.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ENV_BINDINGS;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn store_with(content: &str) -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        (dir, ConfigStore::new(path))
    }

    #[test]
    fn test_modify_skips_write_when_unchanged() {
        let (_dir, store) = store_with("[llm]\nmodel = \"gpt-4o\"\n");
        let (_, written) = store.modify(|doc| doc.set("llm.model", "gpt-4o")).unwrap();
        assert!(!written);
    }

    #[test]
    fn test_update_batch() {
        let (_dir, store) = store_with("[llm]\nmodel = \"gpt-4\"\n");

        let report = store
            .update(&[("llm.model", "gpt-4o"), ("llm.temperature", "0.7"), ("bad", "x")])
            .unwrap();

        assert!(report.written);
        assert_eq!(report.outcomes[0].1, PatchOutcome::Replaced);
        assert_eq!(report.outcomes[1].1, PatchOutcome::Appended);
        assert!(report.outcomes[2].1.is_skipped());
        assert_eq!(
            store.read().unwrap(),
            "[llm]\nmodel = \"gpt-4o\"\ntemperature = 0.7\n"
        );
    }

    #[test]
    fn test_read_section_unreadable_is_none() {
        let store = ConfigStore::new("/nonexistent/config.toml");
        assert_eq!(store.read_section("llm"), None);
        assert!(matches!(store.read(), Err(StoreError::Missing(_))));
    }

    #[test]
    fn test_sync_env_missing_file_skipped() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        let env: HashMap<String, String> =
            [("LLM_MODEL".to_string(), "x".to_string())].into_iter().collect();

        let report = store.sync_env(&env, ENV_BINDINGS).unwrap();

        assert!(report.applied.is_empty());
        assert!(!store.exists());
    }

    #[test]
    fn test_sync_env_writes_once() {
        let (_dir, store) = store_with("[llm]\nmodel = \"gpt-4\"\n");
        let env: HashMap<String, String> = [
            ("LLM_MODEL".to_string(), "gpt-4o".to_string()),
            ("SEARCH_ENGINE".to_string(), "bing".to_string()),
        ]
        .into_iter()
        .collect();

        let report = store.sync_env(&env, ENV_BINDINGS).unwrap();
        assert!(report.written);
        assert_eq!(report.applied.len(), 2);

        let again = store.sync_env(&env, ENV_BINDINGS).unwrap();
        assert!(!again.written);
    }

    #[test]
    fn test_export_env_vars_redacts() {
        let (_dir, store) = store_with(
            "[llm]\nmodel = \"gpt-4o\"\napi_key = \"sk-live\"\n\n[browser.proxy]\npassword = \"pw\"\n",
        );

        let vars: HashMap<String, String> =
            store.export_env_vars(ENV_BINDINGS, true).unwrap().into_iter().collect();
        assert_eq!(vars["LLM_MODEL"], "gpt-4o");
        assert_eq!(vars["LLM_API_KEY"], REDACTED);
        assert_eq!(vars["BROWSER_PROXY_PASSWORD"], REDACTED);
        assert!(!vars.contains_key("OPENAI_API_KEY"));
        assert!(!vars.contains_key("SEARCH_ENGINE"));

        let plain: HashMap<String, String> =
            store.export_env_vars(ENV_BINDINGS, false).unwrap().into_iter().collect();
        assert_eq!(plain["LLM_API_KEY"], "sk-live");
    }
}
