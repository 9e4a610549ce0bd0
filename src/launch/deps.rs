//! Best-effort dependency installation
//!
//! Failure here never aborts a launch; it is logged and the server is
//! started anyway.

use std::io;
use std::process::{Command, Stdio};

use tracing::{info, warn};

use super::LaunchOptions;

/// Result of the install step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepsOutcome {
    /// No manifest under the root; nothing to install.
    NoManifest,
    Installed,
    /// The installer could not be run or exited nonzero.
    Failed(String),
}

/// Run `<interpreter> -m pip install -r <manifest>` in the root directory.
pub fn install_dependencies(opts: &LaunchOptions) -> DepsOutcome {
    let manifest = opts.manifest_path();
    if !manifest.is_file() {
        info!(
            "no dependency manifest at {}, skipping install",
            manifest.display()
        );
        return DepsOutcome::NoManifest;
    }

    info!("installing dependencies from {}", manifest.display());
    let status = Command::new(&opts.interpreter)
        .args(["-m", "pip", "install", "-r"])
        .arg(&manifest)
        .current_dir(&opts.root)
        .stdin(Stdio::null())
        // stdout may be a protocol stream; keep installer chatter off it.
        .stdout(Stdio::from(io::stderr()))
        .status();

    let outcome = match status {
        Ok(status) if status.success() => DepsOutcome::Installed,
        Ok(status) => DepsOutcome::Failed(format!("installer exited with {}", status)),
        Err(err) => DepsOutcome::Failed(format!("could not run {}: {}", opts.interpreter, err)),
    };

    if let DepsOutcome::Failed(reason) = &outcome {
        warn!("dependency install failed ({}); continuing", reason);
    }
    outcome
}
