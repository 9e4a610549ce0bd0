//! Value formatting for inserted keys.

use regex_lite::Regex;
use std::sync::OnceLock;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("number pattern is valid")
    })
}

/// Render a raw string as a TOML value literal.
///
/// Booleans and numbers are emitted bare, bracketed text is assumed to be an
/// array literal and emitted bare, everything else is double-quoted. Quotes
/// inside the value are not escaped.
pub fn format_value(raw: &str) -> String {
    if raw == "true" || raw == "false" || number_re().is_match(raw) {
        return raw.to_string();
    }
    if raw.starts_with('[') && raw.ends_with(']') {
        return raw.to_string();
    }
    format!("\"{}\"", raw)
}

/// Best-effort plain text of a raw value: the contents of a leading quoted
/// string, or the unquoted text before any trailing comment.
pub fn scalar_text(raw: &str) -> String {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            return match rest.find(quote) {
                Some(end) => rest[..end].to_string(),
                None => rest.to_string(),
            };
        }
    }
    match raw.find('#') {
        Some(idx) => raw[..idx].trim_end().to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans_unquoted() {
        assert_eq!(format_value("true"), "true");
        assert_eq!(format_value("false"), "false");
        // Only the exact lowercase words count.
        assert_eq!(format_value("True"), "\"True\"");
    }

    #[test]
    fn test_numbers_unquoted() {
        assert_eq!(format_value("4096"), "4096");
        assert_eq!(format_value("-3"), "-3");
        assert_eq!(format_value("0.7"), "0.7");
        assert_eq!(format_value("1e5"), "1e5");
    }

    #[test]
    fn test_non_numbers_quoted() {
        assert_eq!(format_value("gpt-4o"), "\"gpt-4o\"");
        assert_eq!(format_value("1.2.3"), "\"1.2.3\"");
        assert_eq!(format_value(""), "\"\"");
        assert_eq!(format_value("NaN"), "\"NaN\"");
    }

    #[test]
    fn test_array_literal_unquoted() {
        assert_eq!(
            format_value(r#"["DuckDuckGo", "Bing"]"#),
            r#"["DuckDuckGo", "Bing"]"#
        );
    }

    #[test]
    fn test_no_escaping() {
        assert_eq!(format_value(r#"say "hi""#), r#""say "hi"""#);
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text("\"google\""), "google");
        assert_eq!(scalar_text("'bing' # comment"), "bing");
        assert_eq!(scalar_text("30000 # ms"), "30000");
        assert_eq!(scalar_text("  true "), "true");
    }
}
