//! Locating and seeding the working config file
//!
//! The active config lives at `<root>/config/config.toml`. On first run it is
//! seeded by copying `<root>/config/config.example.toml` verbatim. An existing
//! active config is never touched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Directory holding both config files, relative to the root.
pub const CONFIG_DIR: &str = "config";

/// Active config file name.
pub const CONFIG_FILE: &str = "config.toml";

/// Template the active config is seeded from.
pub const EXAMPLE_FILE: &str = "config.example.toml";

/// What [`ensure_config`] found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateOutcome {
    /// The active config was already present.
    Existing,
    /// The active config was copied from the template.
    Seeded,
    /// Neither file exists; downstream writes are skipped.
    Missing,
}

/// Resolved config paths for a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub root: PathBuf,
    pub active: PathBuf,
    pub example: PathBuf,
    pub outcome: LocateOutcome,
}

impl ConfigLocation {
    /// Compute paths under `root` without touching the filesystem.
    pub fn for_root(root: &Path) -> Self {
        let dir = root.join(CONFIG_DIR);
        let active = dir.join(CONFIG_FILE);
        let outcome = if active.exists() {
            LocateOutcome::Existing
        } else {
            LocateOutcome::Missing
        };
        Self {
            root: root.to_path_buf(),
            active,
            example: dir.join(EXAMPLE_FILE),
            outcome,
        }
    }

    /// True if the active config file is present on disk.
    pub fn exists(&self) -> bool {
        self.active.is_file()
    }
}

/// Errors while seeding the active config
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Make sure `<root>/config/config.toml` exists, seeding it from the example
/// if needed.
pub fn ensure_config(root: &Path) -> Result<ConfigLocation, LocateError> {
    let mut location = ConfigLocation::for_root(root);

    if location.exists() {
        location.outcome = LocateOutcome::Existing;
        return Ok(location);
    }

    if !location.example.is_file() {
        warn!(
            "no config found: neither {} nor {} exists",
            location.active.display(),
            location.example.display()
        );
        location.outcome = LocateOutcome::Missing;
        return Ok(location);
    }

    if let Some(dir) = location.active.parent() {
        fs::create_dir_all(dir).map_err(|source| LocateError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    fs::copy(&location.example, &location.active).map_err(|source| LocateError::Copy {
        from: location.example.clone(),
        to: location.active.clone(),
        source,
    })?;

    info!(
        "created {} from {}",
        location.active.display(),
        location.example.display()
    );
    location.outcome = LocateOutcome::Seeded;
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_seeds_from_example() {
        let root = TempDir::new().unwrap();
        let example = root.path().join("config/config.example.toml");
        write(&example, "[llm]\nmodel = \"gpt-4o\"\n");

        let location = ensure_config(root.path()).unwrap();

        assert_eq!(location.outcome, LocateOutcome::Seeded);
        assert!(location.exists());
        assert_eq!(
            fs::read_to_string(&location.active).unwrap(),
            "[llm]\nmodel = \"gpt-4o\"\n"
        );
    }

    #[test]
    fn test_existing_config_untouched() {
        let root = TempDir::new().unwrap();
        write(&root.path().join("config/config.example.toml"), "[llm]\n");
        write(&root.path().join("config/config.toml"), "# my edits\n");

        let location = ensure_config(root.path()).unwrap();

        assert_eq!(location.outcome, LocateOutcome::Existing);
        assert_eq!(fs::read_to_string(&location.active).unwrap(), "# my edits\n");
    }

    #[test]
    fn test_missing_both_files() {
        let root = TempDir::new().unwrap();

        let location = ensure_config(root.path()).unwrap();

        assert_eq!(location.outcome, LocateOutcome::Missing);
        assert!(!location.exists());
        assert!(!root.path().join("config").exists());
    }

    #[test]
    fn test_for_root_paths() {
        let location = ConfigLocation::for_root(Path::new("/srv/app"));
        assert_eq!(location.active, PathBuf::from("/srv/app/config/config.toml"));
        assert_eq!(
            location.example,
            PathBuf::from("/srv/app/config/config.example.toml")
        );
    }
}
