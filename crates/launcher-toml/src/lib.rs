//! Line-preserving TOML section patcher.
//!
//! Reads a configuration document into an ordered list of sections, each a
//! list of key/value entries and untouched raw lines, and writes it back out
//! byte-for-byte except where a key was set or a block was appended.
//!
//! Only two shapes of dotted path are understood: `section.key` and
//! `section.subsection.key`. Anything else is reported as skipped and leaves
//! the document alone.

mod document;
mod patch;
mod path;
mod section;
mod value;

pub use document::{Document, Entry};
pub use patch::{PatchOutcome, SkipReason};
pub use path::{DottedPath, PathError};
pub use section::SectionView;
pub use value::{format_value, scalar_text};

/// Set `dotted_path` to `raw_value` in `content` and return the new text.
///
/// Unsupported paths and nested-section collisions return `content`
/// unchanged.
pub fn set_value(content: &str, dotted_path: &str, raw_value: &str) -> String {
    let mut doc = Document::parse(content);
    match doc.set(dotted_path, raw_value) {
        PatchOutcome::Skipped(_) => content.to_string(),
        _ => doc.to_string(),
    }
}

/// Read a section out of `content`. See [`Document::read_section`].
pub fn read_section(content: &str, name: &str) -> Option<SectionView> {
    Document::parse(content).read_section(name)
}
