//! Reading section bodies back out of a document.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::document::Document;

/// Raw text of a section, or of a family of nested sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SectionView {
    /// Trimmed body of `[name]`.
    Flat(String),
    /// `X` -> trimmed body of `[name.X]`, used when `[name]` itself is absent.
    Nested(BTreeMap<String, String>),
}

impl Document {
    /// Look up `[name]`, falling back to every `[name.X]` table.
    pub fn read_section(&self, name: &str) -> Option<SectionView> {
        if let Some(idx) = self.table_index(name) {
            return Some(SectionView::Flat(self.sections[idx].body()));
        }

        let prefix = format!("{}.", name);
        let nested: BTreeMap<String, String> = self
            .sections
            .iter()
            .filter_map(|section| {
                let child = section.table_name()?.strip_prefix(&prefix)?;
                Some((child.to_string(), section.body()))
            })
            .collect();

        if nested.is_empty() {
            None
        } else {
            Some(SectionView::Nested(nested))
        }
    }

    /// Every table's name and trimmed body, in document order.
    pub fn sections(&self) -> Vec<(String, String)> {
        self.sections
            .iter()
            .filter_map(|section| Some((section.table_name()?.to_string(), section.body())))
            .collect()
    }
}
