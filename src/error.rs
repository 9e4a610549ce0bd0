//! Top-level error type for the CLI

use crate::config::{LocateError, SettingsError, StoreError};
use crate::credentials::CredentialError;
use crate::launch::LaunchError;

#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid config: {0}")]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("invalid assignment '{0}' (expected PATH=VALUE)")]
    InvalidAssignment(String),

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl LauncherError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LauncherError::InvalidAssignment(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let missing = LauncherError::from(LaunchError::MissingEntry(PathBuf::from("x.py")));
        assert_eq!(missing.exit_code(), 1);
        assert_eq!(
            LauncherError::InvalidAssignment("llm.model".into()).exit_code(),
            2
        );
    }

    #[test]
    fn test_messages_pass_through() {
        let err = LauncherError::from(CredentialError::Missing);
        assert!(err.to_string().starts_with("llm.api_key is not set"));
    }
}
