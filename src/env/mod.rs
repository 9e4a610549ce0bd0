//! Environment variable overrides
//!
//! A fixed table maps recognized environment variables onto dotted config
//! paths. Several variables may point at the same path; they are applied in
//! declaration order, so the one declared later wins when both are set.

use std::collections::{BTreeMap, HashMap};

use launcher_toml::{Document, PatchOutcome};
use tracing::debug;

/// One environment variable and the config path it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvBinding {
    pub var: &'static str,
    pub path: &'static str,
}

const fn bind(var: &'static str, path: &'static str) -> EnvBinding {
    EnvBinding { var, path }
}

/// Recognized environment variables, in application order.
pub static ENV_BINDINGS: &[EnvBinding] = &[
    // OPENAI_API_KEY is the compatibility alias; LLM_API_KEY wins when both are set.
    bind("OPENAI_API_KEY", "llm.api_key"),
    bind("LLM_API_KEY", "llm.api_key"),
    bind("LLM_MODEL", "llm.model"),
    bind("LLM_BASE_URL", "llm.base_url"),
    bind("LLM_MAX_TOKENS", "llm.max_tokens"),
    bind("LLM_TEMPERATURE", "llm.temperature"),
    bind("LLM_API_TYPE", "llm.api_type"),
    bind("LLM_API_VERSION", "llm.api_version"),
    bind("LLM_VISION_MODEL", "llm.vision.model"),
    bind("LLM_VISION_BASE_URL", "llm.vision.base_url"),
    bind("LLM_VISION_API_KEY", "llm.vision.api_key"),
    bind("LLM_VISION_MAX_TOKENS", "llm.vision.max_tokens"),
    bind("LLM_VISION_TEMPERATURE", "llm.vision.temperature"),
    bind("BROWSER_HEADLESS", "browser.headless"),
    bind("BROWSER_DISABLE_SECURITY", "browser.disable_security"),
    bind("BROWSER_EXTRA_CHROMIUM_ARGS", "browser.extra_chromium_args"),
    bind("BROWSER_CHROME_INSTANCE_PATH", "browser.chrome_instance_path"),
    bind("BROWSER_WSS_URL", "browser.wss_url"),
    bind("BROWSER_CDP_URL", "browser.cdp_url"),
    bind("BROWSER_MAX_CONTENT_LENGTH", "browser.max_content_length"),
    bind("BROWSER_TIMEOUT", "browser.timeout"),
    bind("BROWSER_RETRY_COUNT", "browser.retry_count"),
    bind("BROWSER_RETRY_DELAY", "browser.retry_delay"),
    bind("PROXY_SERVER", "browser.proxy.server"),
    bind("BROWSER_PROXY_SERVER", "browser.proxy.server"),
    bind("PROXY_USERNAME", "browser.proxy.username"),
    bind("BROWSER_PROXY_USERNAME", "browser.proxy.username"),
    bind("PROXY_PASSWORD", "browser.proxy.password"),
    bind("BROWSER_PROXY_PASSWORD", "browser.proxy.password"),
    bind("SEARCH_ENGINE", "search.engine"),
    bind("SEARCH_ENGINE_URL", "search.engine_url"),
    bind("SEARCH_FALLBACK_ENGINES", "search.fallback_engines"),
    bind("SEARCH_RETRY_DELAY", "search.retry_delay"),
    bind("SEARCH_MAX_RETRIES", "search.max_retries"),
    bind("SEARCH_LANG", "search.lang"),
    bind("SEARCH_COUNTRY", "search.country"),
    bind("SANDBOX_USE_SANDBOX", "sandbox.use_sandbox"),
    bind("SANDBOX_IMAGE", "sandbox.image"),
    bind("SANDBOX_WORK_DIR", "sandbox.work_dir"),
    bind("SANDBOX_MEMORY_LIMIT", "sandbox.memory_limit"),
    bind("SANDBOX_CPU_LIMIT", "sandbox.cpu_limit"),
    bind("SANDBOX_TIMEOUT", "sandbox.timeout"),
    bind("SANDBOX_NETWORK_ENABLED", "sandbox.network_enabled"),
    bind("MCP_SERVER_REFERENCE", "mcp.server_reference"),
];

/// Config path -> last variable declared for it, in order of first
/// appearance of the path. Aliases collapse onto the later name.
pub fn reverse_mapping(table: &[EnvBinding]) -> Vec<(&'static str, &'static str)> {
    let mut out: Vec<(&'static str, &'static str)> = Vec::new();
    for binding in table {
        match out.iter_mut().find(|(path, _)| *path == binding.path) {
            Some(slot) => slot.1 = binding.var,
            None => out.push((binding.path, binding.var)),
        }
    }
    out
}

/// Source of environment values.
pub trait EnvLookup {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A variable that was set and what applying it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOverride {
    pub var: &'static str,
    pub path: &'static str,
    pub outcome: PatchOutcome,
}

/// Apply every set, non-empty variable in `table` to `doc`.
pub fn apply_to_document(
    doc: &mut Document,
    env: &dyn EnvLookup,
    table: &[EnvBinding],
) -> Vec<AppliedOverride> {
    let mut applied = Vec::new();
    for binding in table {
        let Some(value) = env.lookup(binding.var).filter(|v| !v.is_empty()) else {
            continue;
        };
        let outcome = doc.set(binding.path, &value);
        match &outcome {
            PatchOutcome::Skipped(reason) => {
                debug!("{} -> {} skipped: {}", binding.var, binding.path, reason);
            }
            other => debug!("{} -> {} ({:?})", binding.var, binding.path, other),
        }
        applied.push(AppliedOverride {
            var: binding.var,
            path: binding.path,
            outcome,
        });
    }
    applied
}

/// Fold all environment overrides into `content` and return the result.
pub fn apply_env_overrides(content: &str, env: &dyn EnvLookup, table: &[EnvBinding]) -> String {
    let mut doc = Document::parse(content);
    let applied = apply_to_document(&mut doc, env, table);
    if applied.iter().all(|a| a.outcome.is_skipped()) {
        return content.to_string();
    }
    doc.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_var_names_unique() {
        let mut seen = HashSet::new();
        for binding in ENV_BINDINGS {
            assert!(seen.insert(binding.var), "duplicate {}", binding.var);
        }
    }

    #[test]
    fn test_all_paths_supported() {
        for binding in ENV_BINDINGS {
            assert!(
                launcher_toml::DottedPath::parse(binding.path).is_ok(),
                "{} has unsupported path {}",
                binding.var,
                binding.path
            );
        }
    }

    #[test]
    fn test_reverse_mapping_keeps_last_alias() {
        let reverse = reverse_mapping(ENV_BINDINGS);
        let lookup: HashMap<_, _> = reverse.iter().copied().collect();
        assert_eq!(lookup["llm.api_key"], "LLM_API_KEY");
        assert_eq!(lookup["browser.proxy.server"], "BROWSER_PROXY_SERVER");
        assert_eq!(lookup["search.engine"], "SEARCH_ENGINE");
        // One entry per distinct path, first-appearance order.
        assert_eq!(reverse[0].0, "llm.api_key");
        let paths: HashSet<_> = ENV_BINDINGS.iter().map(|b| b.path).collect();
        assert_eq!(reverse.len(), paths.len());
    }

    #[test]
    fn test_apply_sets_values() {
        let env = env(&[("LLM_MODEL", "gpt-4o"), ("BROWSER_HEADLESS", "true")]);
        let out = apply_env_overrides("[llm]\nmodel = \"gpt-4\"\n", &env, ENV_BINDINGS);
        assert_eq!(
            out,
            "[llm]\nmodel = \"gpt-4o\"\n\n[browser]\nheadless = true\n"
        );
    }

    #[test]
    fn test_later_alias_wins() {
        let env = env(&[("OPENAI_API_KEY", "sk-old"), ("LLM_API_KEY", "sk-new")]);
        let out = apply_env_overrides("[llm]\napi_key = \"\"\n", &env, ENV_BINDINGS);
        assert_eq!(out, "[llm]\napi_key = \"sk-new\"\n");
    }

    #[test]
    fn test_empty_values_ignored() {
        let env = env(&[("LLM_MODEL", ""), ("UNRELATED", "x")]);
        let content = "[llm]\nmodel = \"gpt-4\"\n";
        assert_eq!(apply_env_overrides(content, &env, ENV_BINDINGS), content);
    }

    #[test]
    fn test_idempotent() {
        let env = env(&[
            ("SEARCH_ENGINE", "bing"),
            ("LLM_VISION_MODEL", "gpt-4o-mini"),
            ("SEARCH_FALLBACK_ENGINES", r#"["DuckDuckGo"]"#),
        ]);
        let once = apply_env_overrides("", &env, ENV_BINDINGS);
        let twice = apply_env_overrides(&once, &env, ENV_BINDINGS);
        assert_eq!(once, twice);
        assert!(once.contains("fallback_engines = [\"DuckDuckGo\"]"));
    }

    #[test]
    fn test_report_records_outcomes() {
        let env = env(&[("LLM_MODEL", "x"), ("SEARCH_LANG", "ja")]);
        let mut doc = Document::parse("[llm]\nmodel = \"y\"\n");
        let applied = apply_to_document(&mut doc, &env, ENV_BINDINGS);
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].var, "LLM_MODEL");
        assert_eq!(applied[0].outcome, PatchOutcome::Replaced);
        assert_eq!(applied[1].outcome, PatchOutcome::SectionCreated);
    }
}
