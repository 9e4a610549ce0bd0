//! Server launch
//!
//! A launch runs, in order:
//!
//! 1. preflight: the entry script must exist under the root
//! 2. config preparation: locate or seed, fold in env overrides, backfill
//! 3. credential check against the typed settings
//! 4. optional dependency install
//! 5. spawn and supervise the server until it exits

mod deps;
mod supervisor;

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, error, info};

use crate::backfill::{self, BackfillReport};
use crate::config::{
    ensure_config, AppSettings, ConfigLocation, ConfigStore, LocateError, StoreError, SyncReport,
};
use crate::credentials::{check_credentials, CredentialError};
use crate::env::{EnvLookup, ENV_BINDINGS};
use crate::signal::ShutdownToken;

pub use deps::{install_dependencies, DepsOutcome};
pub use supervisor::{exit_code, supervise, POLL_INTERVAL};

pub const DEFAULT_INTERPRETER: &str = "python3";
pub const DEFAULT_ENTRY: &str = "run_mcp_server.py";
pub const DEFAULT_MANIFEST: &str = "requirements.txt";

/// Set to `1` in the server's environment.
pub const LAUNCHER_FLAG_VAR: &str = "MANUS_LAUNCHER";
/// Absolute path of the active config, passed to the server.
pub const CONFIG_PATH_VAR: &str = "MANUS_CONFIG_PATH";

/// How to start the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub root: PathBuf,
    pub interpreter: String,
    /// Entry script, relative to `root`
    pub entry: PathBuf,
    /// Dependency manifest, relative to `root`
    pub manifest: PathBuf,
    pub install_deps: bool,
    /// Passed through to the entry script
    pub args: Vec<String>,
}

impl LaunchOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            entry: PathBuf::from(DEFAULT_ENTRY),
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            install_deps: false,
            args: Vec::new(),
        }
    }

    pub fn entry_path(&self) -> PathBuf {
        self.root.join(&self.entry)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest)
    }
}

/// Errors that stop a launch
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("server entry point not found: {0}")]
    MissingEntry(PathBuf),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("credential check failed: {0}")]
    Credentials(#[from] CredentialError),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for server: {0}")]
    Wait(#[source] io::Error),
}

/// Result of preparing the config before a launch.
#[derive(Debug, Clone)]
pub struct PreparedConfig {
    pub location: ConfigLocation,
    pub sync: SyncReport,
    pub backfill: Vec<BackfillReport>,
}

/// Fail early if the entry script is missing.
pub fn preflight(opts: &LaunchOptions) -> Result<(), LaunchError> {
    let entry = opts.entry_path();
    if !entry.is_file() {
        return Err(LaunchError::MissingEntry(entry));
    }
    Ok(())
}

/// Locate the config, apply environment overrides and backfill defaults.
///
/// A missing config (no active file and no template) is not an error; the
/// later steps are skipped with a warning.
pub fn prepare_config(root: &Path, env: &dyn EnvLookup) -> Result<PreparedConfig, LaunchError> {
    let location = ensure_config(root)?;
    let store = ConfigStore::new(&location.active);

    let sync = store.sync_env(env, ENV_BINDINGS)?;
    let backfill = backfill::run_all(&store)?;

    Ok(PreparedConfig {
        location,
        sync,
        backfill,
    })
}

/// Build the server command: `<interpreter> <entry> <args...>`.
///
/// The server stays in the launcher's process group, so it remains in the
/// terminal's foreground group and can read a tty on stdin.
pub fn server_command(opts: &LaunchOptions, config_path: &Path) -> Command {
    let mut cmd = Command::new(&opts.interpreter);
    cmd.arg(&opts.entry)
        .args(&opts.args)
        .current_dir(&opts.root)
        .env(LAUNCHER_FLAG_VAR, "1")
        .env(CONFIG_PATH_VAR, absolute(config_path))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd
}

/// Run the full launch sequence and return the exit code to report.
pub fn launch(
    opts: &LaunchOptions,
    env: &dyn EnvLookup,
    token: &ShutdownToken,
) -> Result<i32, LaunchError> {
    preflight(opts)?;

    let prepared = prepare_config(&opts.root, env)?;
    let settings = AppSettings::load_or_fallback(&prepared.location.active);
    check_credentials(&settings.default_llm())?;

    if opts.install_deps {
        install_dependencies(opts);
    }

    let mut cmd = server_command(opts, &prepared.location.active);
    debug!("spawning {:?}", cmd);
    let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        program: opts.interpreter.clone(),
        source,
    })?;
    info!(
        "server started (pid {}): {} {}",
        child.id(),
        opts.interpreter,
        opts.entry.display()
    );

    let status = supervise(&mut child, token, POLL_INTERVAL).map_err(LaunchError::Wait)?;
    let code = exit_code(&status);
    if code == 0 {
        info!("server exited cleanly");
    } else {
        error!("server exited with code {}", code);
    }
    Ok(code)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
