//! API key validation before launch

use crate::config::LlmSettings;

/// Substrings that mark an example key left in place.
const PLACEHOLDER_MARKERS: &[&str] = &["your", "xxx", "api_key_here", "<", ">"];

/// Why the configured key is unusable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("llm.api_key is not set (set LLM_API_KEY or edit the config)")]
    Missing,

    #[error("llm.api_key looks like a placeholder: {0}")]
    Placeholder(String),
}

/// Check that the LLM settings carry a usable API key.
///
/// Ollama runs locally and needs no key.
pub fn check_credentials(llm: &LlmSettings) -> Result<(), CredentialError> {
    if llm.api_type.eq_ignore_ascii_case("ollama") {
        return Ok(());
    }

    let key = llm.api_key.trim();
    if key.is_empty() {
        return Err(CredentialError::Missing);
    }
    if is_placeholder(key) {
        return Err(CredentialError::Placeholder(mask(key)));
    }
    Ok(())
}

fn is_placeholder(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower == "sk-..." || PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m))
}

/// Keep only a short prefix so the key never lands in logs whole.
fn mask(key: &str) -> String {
    let prefix: String = key.chars().take(6).collect();
    if key.chars().count() > 6 {
        format!("{}...", prefix)
    } else {
        prefix
    }
}
