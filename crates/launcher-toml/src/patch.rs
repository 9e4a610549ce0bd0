//! Setting keys by dotted path.

use crate::document::{Document, Entry};
use crate::path::{DottedPath, PathError};
use crate::value::format_value;

/// What [`Document::set`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The first existing assignment of the key was rewritten.
    Replaced,
    /// The table existed and the key was added to it.
    Appended,
    /// A new table block was added at the end of the document.
    SectionCreated,
    /// Nothing was changed.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// `section.key` was requested, `[section]` is absent and a
    /// `[section.key]` table already exists.
    #[error("[{0}] already exists as a nested table")]
    NestedSectionCollision(String),
}

impl PatchOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, PatchOutcome::Skipped(_))
    }
}

impl Document {
    /// Set `path` to `raw_value`, formatted with [`format_value`].
    pub fn set(&mut self, path: &str, raw_value: &str) -> PatchOutcome {
        let path = match DottedPath::parse(path) {
            Ok(path) => path,
            Err(err) => return PatchOutcome::Skipped(err.into()),
        };
        self.set_path(&path, &format_value(raw_value))
    }

    /// Set `path` to an already formatted TOML value literal.
    pub fn set_path(&mut self, path: &DottedPath, value: &str) -> PatchOutcome {
        let table = path.table();
        let key = path.key();
        let eol = self.eol();

        if let Some(idx) = self.table_index(&table) {
            let section = &mut self.sections[idx];
            return match section.entry_mut(key) {
                Some(entry) => {
                    entry.set_value(value);
                    PatchOutcome::Replaced
                }
                None => {
                    section.push_entry(Entry::new(key, value, eol));
                    PatchOutcome::Appended
                }
            };
        }

        if path.is_top_level() {
            let nested = format!("{}.{}", path.section(), key);
            if self.has_table(&nested) {
                return PatchOutcome::Skipped(SkipReason::NestedSectionCollision(nested));
            }
        }

        self.append_table(&table, vec![Entry::new(key, value, eol)]);
        PatchOutcome::SectionCreated
    }

    /// Add `key = value` to `[table]` only when the key is missing, creating
    /// the table if needed. Returns true if anything was written.
    pub fn backfill(&mut self, table: &str, key: &str, raw_value: &str) -> bool {
        if self.has_key(table, key) {
            return false;
        }
        let entry = Entry::new(key, &format_value(raw_value), self.eol());
        match self.table_index(table) {
            Some(idx) => self.sections[idx].push_entry(entry),
            None => self.append_table(table, vec![entry]),
        }
        true
    }

    /// Append a whole `[table]` block of raw `(key, value)` pairs.
    pub fn append_block(&mut self, table: &str, pairs: &[(&str, &str)]) {
        let eol = self.eol();
        let entries = pairs
            .iter()
            .map(|(key, raw)| Entry::new(key, &format_value(raw), eol))
            .collect();
        self.append_table(table, entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_only_first_occurrence() {
        let mut doc = Document::parse("[llm]\nmodel = \"a\"\nmodel = \"b\"\n");
        assert_eq!(doc.set("llm.model", "c"), PatchOutcome::Replaced);
        assert_eq!(doc.to_string(), "[llm]\nmodel = \"c\"\nmodel = \"b\"\n");
    }

    #[test]
    fn test_replace_keeps_indent_and_drops_trailing_comment() {
        let mut doc = Document::parse("[llm]\n  temperature = 1.0 # default\n");
        doc.set("llm.temperature", "0.2");
        assert_eq!(doc.to_string(), "[llm]\n  temperature = 0.2\n");
    }

    #[test]
    fn test_replace_multiline_array() {
        let mut doc = Document::parse("[search]\nfallback_engines = [\n  \"Bing\",\n]\nlang = \"en\"\n");
        doc.set("search.fallback_engines", r#"["Baidu"]"#);
        assert_eq!(
            doc.to_string(),
            "[search]\nfallback_engines = [\"Baidu\"]\nlang = \"en\"\n"
        );
    }

    #[test]
    fn test_append_key_before_trailing_blank_lines() {
        let mut doc = Document::parse("[llm]\nmodel = \"x\"\n\n[browser]\nheadless = true\n");
        assert_eq!(doc.set("llm.max_tokens", "4096"), PatchOutcome::Appended);
        assert_eq!(
            doc.to_string(),
            "[llm]\nmodel = \"x\"\nmax_tokens = 4096\n\n[browser]\nheadless = true\n"
        );
    }

    #[test]
    fn test_append_key_to_empty_section() {
        let mut doc = Document::parse("[mcp]\n");
        doc.set("mcp.server_reference", "app.mcp.server");
        assert_eq!(doc.to_string(), "[mcp]\nserver_reference = \"app.mcp.server\"\n");
    }

    #[test]
    fn test_new_section_separated_by_blank_line() {
        let mut doc = Document::parse("[llm]\nmodel = \"x\"\n");
        assert_eq!(doc.set("search.engine", "bing"), PatchOutcome::SectionCreated);
        assert_eq!(
            doc.to_string(),
            "[llm]\nmodel = \"x\"\n\n[search]\nengine = \"bing\"\n"
        );
    }

    #[test]
    fn test_new_section_without_trailing_newline() {
        let mut doc = Document::parse("[llm]\nmodel = \"x\"");
        doc.set("search.engine", "bing");
        assert_eq!(
            doc.to_string(),
            "[llm]\nmodel = \"x\"\n\n[search]\nengine = \"bing\"\n"
        );
    }

    #[test]
    fn test_three_segment_creates_nested_table() {
        let mut doc = Document::parse("[browser]\nheadless = true\n");
        assert_eq!(
            doc.set("browser.proxy.server", "http://proxy:8080"),
            PatchOutcome::SectionCreated
        );
        assert_eq!(
            doc.to_string(),
            "[browser]\nheadless = true\n\n[browser.proxy]\nserver = \"http://proxy:8080\"\n"
        );
    }

    #[test]
    fn test_three_segment_updates_nested_table() {
        let mut doc = Document::parse("[llm.vision]\nmodel = \"a\"\n\n[search]\n");
        assert_eq!(doc.set("llm.vision.model", "b"), PatchOutcome::Replaced);
        assert_eq!(doc.set("llm.vision.api_key", "k"), PatchOutcome::Appended);
        assert_eq!(
            doc.to_string(),
            "[llm.vision]\nmodel = \"b\"\napi_key = \"k\"\n\n[search]\n"
        );
    }

    #[test]
    fn test_two_segment_does_not_touch_nested_table() {
        // [llm] exists separately from [llm.vision]
        let mut doc = Document::parse("[llm]\n\n[llm.vision]\nmodel = \"a\"\n");
        assert_eq!(doc.set("llm.model", "b"), PatchOutcome::Appended);
        assert_eq!(doc.get_text("llm", "model").as_deref(), Some("b"));
        assert_eq!(doc.get_text("llm.vision", "model").as_deref(), Some("a"));
    }

    #[test]
    fn test_nested_collision_reported() {
        let mut doc = Document::parse("[search.custom]\nurl = \"x\"\n");
        let before = doc.to_string();
        assert_eq!(
            doc.set("search.custom", "v"),
            PatchOutcome::Skipped(SkipReason::NestedSectionCollision("search.custom".into()))
        );
        assert_eq!(doc.to_string(), before);
    }

    #[test]
    fn test_unrelated_nested_table_does_not_block() {
        let mut doc = Document::parse("[search.custom]\nurl = \"x\"\n");
        assert_eq!(doc.set("search.engine", "bing"), PatchOutcome::SectionCreated);
        assert!(doc.has_key("search", "engine"));
    }

    #[test]
    fn test_invalid_path_skipped() {
        let mut doc = Document::parse("");
        assert!(doc.set("a.b.c.d", "v").is_skipped());
        assert!(doc.set("nodots", "v").is_skipped());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_key_match_is_exact() {
        // `key` must not match inside `api_key`
        let mut doc = Document::parse("[llm]\napi_key = \"secret\"\n");
        assert_eq!(doc.set("llm.key", "v"), PatchOutcome::Appended);
        assert_eq!(doc.get_text("llm", "api_key").as_deref(), Some("secret"));
    }

    #[test]
    fn test_backfill_only_when_missing() {
        let mut doc = Document::parse("[browser]\ntimeout = 5000\n");
        assert!(!doc.backfill("browser", "timeout", "30000"));
        assert!(doc.backfill("browser", "retry_count", "3"));
        assert_eq!(doc.to_string(), "[browser]\ntimeout = 5000\nretry_count = 3\n");
    }

    #[test]
    fn test_append_block() {
        let mut doc = Document::parse("");
        doc.append_block("search", &[("engine", "google"), ("lang", "en")]);
        assert_eq!(doc.to_string(), "[search]\nengine = \"google\"\nlang = \"en\"\n");
    }

    #[test]
    fn test_crlf_line_endings_kept_on_replace_and_append() {
        let mut doc = Document::parse("[llm]\r\nmodel = \"a\"\r\n\r\n[browser]\r\nheadless = true\r\n");
        assert_eq!(doc.set("llm.model", "b"), PatchOutcome::Replaced);
        assert_eq!(doc.set("llm.max_tokens", "4096"), PatchOutcome::Appended);
        assert_eq!(doc.set("search.engine", "bing"), PatchOutcome::SectionCreated);
        assert_eq!(
            doc.to_string(),
            "[llm]\r\nmodel = \"b\"\r\nmax_tokens = 4096\r\n\r\n[browser]\r\nheadless = true\r\n\r\n[search]\r\nengine = \"bing\"\r\n"
        );
    }

    #[test]
    fn test_crlf_without_trailing_newline() {
        let mut doc = Document::parse("[llm]\r\nmodel = \"a\"");
        doc.append_block("search", &[("engine", "google")]);
        assert_eq!(
            doc.to_string(),
            "[llm]\r\nmodel = \"a\"\r\n\r\n[search]\r\nengine = \"google\"\r\n"
        );
        assert_eq!(doc.read_section("llm"), Some(crate::SectionView::Flat("model = \"a\"".to_string())));
    }
}
