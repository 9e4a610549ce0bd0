//! Dotted configuration paths.

use std::fmt;

/// A parsed `section.key` or `section.subsection.key` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedPath {
    section: String,
    subsection: Option<String>,
    key: String,
}

/// Why a dotted path was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("expected 2 or 3 segments, got {0}")]
    UnsupportedArity(usize),

    #[error("empty segment in path")]
    EmptySegment,
}

impl DottedPath {
    /// Parse a dotted path. Only arity 2 and 3 are accepted.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let parts: Vec<&str> = path.split('.').map(str::trim).collect();

        let (section, subsection, key) = match parts.as_slice() {
            [section, key] => (*section, None, *key),
            [section, sub, key] => (*section, Some(*sub), *key),
            other => return Err(PathError::UnsupportedArity(other.len())),
        };

        if parts.iter().any(|p| p.is_empty()) {
            return Err(PathError::EmptySegment);
        }

        Ok(Self {
            section: section.to_string(),
            subsection: subsection.map(str::to_string),
            key: key.to_string(),
        })
    }

    /// Name of the table holding the key: `section` or `section.subsection`.
    pub fn table(&self) -> String {
        match &self.subsection {
            Some(sub) => format!("{}.{}", self.section, sub),
            None => self.section.clone(),
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn subsection(&self) -> Option<&str> {
        self.subsection.as_deref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// True for `section.key` paths.
    pub fn is_top_level(&self) -> bool {
        self.subsection.is_none()
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table(), self.key)
    }
}
