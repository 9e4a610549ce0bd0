//! Manus launcher
//!
//! Prepares `config/config.toml` for the Manus MCP server and runs it:
//! seeds the config from its template, folds environment overrides into it
//! without disturbing the rest of the file, fills in missing defaults,
//! checks credentials, then starts and supervises the server process.
//!
//! The line-preserving TOML editing lives in the `launcher-toml` crate.

pub mod backfill;
pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod launch;
pub mod signal;

pub use config::{AppSettings, ConfigLocation, ConfigStore};
pub use env::{EnvLookup, ProcessEnv, ENV_BINDINGS};
pub use error::LauncherError;
pub use launch::{launch, LaunchOptions};
pub use launcher_toml::{read_section, set_value, Document, PatchOutcome, SectionView};
pub use signal::ShutdownToken;
