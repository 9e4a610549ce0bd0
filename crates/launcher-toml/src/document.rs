//! Tolerant line-based document model.
//!
//! Every physical line of the input ends up in exactly one place: the
//! preamble, a section header, an entry, or a raw line. Serializing joins them
//! back in order, so untouched content round-trips unchanged.

use regex_lite::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::value::scalar_text;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\[\[?)\s*([A-Za-z0-9_\-]+(?:\s*\.\s*[A-Za-z0-9_\-]+)*)\s*(\]\]?)$")
            .expect("header pattern is valid")
    })
}

fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\s*)([A-Za-z0-9_\-]+(?:\s*\.\s*[A-Za-z0-9_\-]+)*)\s*=\s*(.*)$")
            .expect("entry pattern is valid")
    })
}

/// A `key = value` assignment. `text` holds the original physical line(s),
/// including any `\r` left over from CRLF line endings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: String,
    indent: String,
    value: String,
    text: String,
}

impl Entry {
    /// New unindented assignment; `eol` is `"\r"` in CRLF documents.
    pub(crate) fn new(key: &str, value: &str, eol: &str) -> Self {
        Self {
            key: key.to_string(),
            indent: String::new(),
            value: value.to_string(),
            text: format!("{} = {}{}", key, value, eol),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw value text, possibly spanning several lines.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Rewrite the assignment as `key = value`, keeping the indentation and
    /// the line ending.
    pub(crate) fn set_value(&mut self, value: &str) {
        let eol = if self.text.ends_with('\r') { "\r" } else { "" };
        self.text = format!("{}{} = {}{}", self.indent, self.key, value, eol);
        self.value = value.to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line {
    Entry(Entry),
    Raw(String),
}

impl Line {
    fn text(&self) -> &str {
        match self {
            Line::Entry(entry) => &entry.text,
            Line::Raw(text) => text,
        }
    }

    fn text_mut(&mut self) -> &mut String {
        match self {
            Line::Entry(entry) => &mut entry.text,
            Line::Raw(text) => text,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Line::Raw(text) if text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HeaderKind {
    Table(String),
    ArrayOfTables(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    pub(crate) header: String,
    pub(crate) kind: HeaderKind,
    pub(crate) lines: Vec<Line>,
}

impl Section {
    pub(crate) fn table(name: &str, eol: &str) -> Self {
        Self {
            header: format!("[{}]{}", name, eol),
            kind: HeaderKind::Table(name.to_string()),
            lines: Vec::new(),
        }
    }

    pub(crate) fn table_name(&self) -> Option<&str> {
        match &self.kind {
            HeaderKind::Table(name) => Some(name),
            HeaderKind::ArrayOfTables(_) => None,
        }
    }

    pub(crate) fn entry(&self, key: &str) -> Option<&Entry> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry(entry) if entry.key == key => Some(entry),
            _ => None,
        })
    }

    pub(crate) fn entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.lines.iter_mut().find_map(|line| match line {
            Line::Entry(entry) if entry.key == key => Some(entry),
            _ => None,
        })
    }

    /// Insert after the last non-blank line, so trailing spacing before the
    /// next header stays where it was.
    pub(crate) fn push_entry(&mut self, entry: Entry) {
        let at = self
            .lines
            .iter()
            .rposition(|line| !line.is_blank())
            .map_or(0, |idx| idx + 1);
        self.lines.insert(at, Line::Entry(entry));
    }

    /// Trimmed text of everything below the header, with `\n` line endings.
    pub(crate) fn body(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text().trim_end_matches('\r'))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

/// A parsed configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub(crate) preamble: Vec<Line>,
    pub(crate) sections: Vec<Section>,
    trailing_newline: bool,
    crlf: bool,
}

impl Document {
    /// Parse `content`. Never fails: lines that are neither headers nor
    /// simple assignments are kept verbatim.
    pub fn parse(content: &str) -> Self {
        let mut doc = Document::default();
        if content.is_empty() {
            return doc;
        }

        let mut physical: Vec<&str> = content.split('\n').collect();
        if content.ends_with('\n') {
            physical.pop();
            doc.trailing_newline = true;
        }
        doc.crlf = physical.first().is_some_and(|line| line.ends_with('\r'));

        let mut idx = 0;
        while idx < physical.len() {
            let line = physical[idx];
            idx += 1;

            if let Some(kind) = parse_header(line) {
                doc.sections.push(Section {
                    header: line.to_string(),
                    kind,
                    lines: Vec::new(),
                });
                continue;
            }

            let parsed = match entry_re().captures(line) {
                Some(caps) => {
                    let indent = caps.get(1).map_or("", |m| m.as_str());
                    let key: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
                    let first = caps.get(3).map_or("", |m| m.as_str());

                    let mut text = line.to_string();
                    let mut value = first.to_string();
                    let mut open = Continuation::after(first);
                    while open.is_open() && idx < physical.len() && parse_header(physical[idx]).is_none() {
                        let next = physical[idx];
                        idx += 1;
                        text.push('\n');
                        text.push_str(next);
                        value.push('\n');
                        value.push_str(next);
                        open = open.feed(next);
                    }

                    Line::Entry(Entry {
                        key,
                        indent: indent.to_string(),
                        value,
                        text,
                    })
                }
                None => Line::Raw(line.to_string()),
            };

            match doc.sections.last_mut() {
                Some(section) => section.lines.push(parsed),
                None => doc.preamble.push(parsed),
            }
        }

        doc
    }

    pub fn is_empty(&self) -> bool {
        self.preamble.is_empty() && self.sections.is_empty()
    }

    pub(crate) fn table_index(&self, name: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.table_name() == Some(name))
    }

    /// True if a `[name]` table header exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.table_index(name).is_some()
    }

    /// Terminator suffix for generated lines, matching the first line read.
    pub(crate) fn eol(&self) -> &'static str {
        if self.crlf {
            "\r"
        } else {
            ""
        }
    }

    /// Raw value of the first `key` in the first `[table]`.
    pub fn get(&self, table: &str, key: &str) -> Option<&str> {
        let idx = self.table_index(table)?;
        self.sections[idx].entry(key).map(Entry::value)
    }

    /// Plain text of a value, with quotes and trailing comments removed.
    pub fn get_text(&self, table: &str, key: &str) -> Option<String> {
        self.get(table, key).map(scalar_text)
    }

    /// True if `key` is assigned in `[table]`.
    pub fn has_key(&self, table: &str, key: &str) -> bool {
        self.get(table, key).is_some()
    }

    /// Append a new `[name]` table holding `entries`, separated from earlier
    /// content by a blank line.
    pub(crate) fn append_table(&mut self, name: &str, entries: Vec<Entry>) {
        let eol = self.eol();
        if !self.trailing_newline && self.crlf {
            // The old last line gains a terminator; give it the `\r` too.
            if let Some(text) = self.last_text_mut() {
                text.push('\r');
            }
        }

        let needs_gap = match self.sections.last() {
            Some(section) => section.lines.last().map_or(true, |line| !line.is_blank()),
            None => self.preamble.last().is_some_and(|line| !line.is_blank()),
        };
        if needs_gap {
            match self.sections.last_mut() {
                Some(section) => section.lines.push(Line::Raw(eol.to_string())),
                None => self.preamble.push(Line::Raw(eol.to_string())),
            }
        }

        let mut section = Section::table(name, eol);
        section.lines.extend(entries.into_iter().map(Line::Entry));
        self.sections.push(section);
        self.trailing_newline = true;
    }

    fn last_text_mut(&mut self) -> Option<&mut String> {
        match self.sections.last_mut() {
            Some(section) => match section.lines.last_mut() {
                Some(line) => Some(line.text_mut()),
                None => Some(&mut section.header),
            },
            None => self.preamble.last_mut().map(Line::text_mut),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<&str> = self.preamble.iter().map(Line::text).collect();
        for section in &self.sections {
            lines.push(&section.header);
            lines.extend(section.lines.iter().map(Line::text));
        }
        f.write_str(&lines.join("\n"))?;
        if self.trailing_newline && !lines.is_empty() {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

fn parse_header(line: &str) -> Option<HeaderKind> {
    let mut text = line.trim();
    if let Some(idx) = text.find('#') {
        text = text[..idx].trim_end();
    }
    let caps = header_re().captures(text)?;
    let name: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
    match (&caps[1], &caps[3]) {
        ("[", "]") => Some(HeaderKind::Table(name)),
        ("[[", "]]") => Some(HeaderKind::ArrayOfTables(name)),
        _ => None,
    }
}

/// Tracks whether a value continues onto following lines: an unclosed
/// multi-line string or an array whose brackets are not yet balanced.
#[derive(Debug, Clone, Copy)]
enum Continuation {
    Closed,
    Array(i32),
    Basic,
    Literal,
}

impl Continuation {
    fn after(value: &str) -> Self {
        let value = value.trim_start();
        if let Some(rest) = value.strip_prefix("\"\"\"") {
            return if rest.contains("\"\"\"") {
                Continuation::Closed
            } else {
                Continuation::Basic
            };
        }
        if let Some(rest) = value.strip_prefix("'''") {
            return if rest.contains("'''") {
                Continuation::Closed
            } else {
                Continuation::Literal
            };
        }
        if value.starts_with('[') {
            return Continuation::Array(0).feed(value);
        }
        Continuation::Closed
    }

    fn feed(self, line: &str) -> Self {
        match self {
            Continuation::Closed => Continuation::Closed,
            Continuation::Basic if line.contains("\"\"\"") => Continuation::Closed,
            Continuation::Literal if line.contains("'''") => Continuation::Closed,
            Continuation::Basic | Continuation::Literal => self,
            Continuation::Array(depth) => {
                let depth = depth + bracket_delta(line);
                if depth > 0 {
                    Continuation::Array(depth)
                } else {
                    Continuation::Closed
                }
            }
        }
    }

    fn is_open(self) -> bool {
        !matches!(self, Continuation::Closed)
    }
}

/// Net bracket depth change of a line, ignoring quoted text and comments.
fn bracket_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in line.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q == '"' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '#' => break,
                '[' => delta += 1,
                ']' => delta -= 1,
                _ => {}
            },
        }
    }
    delta
}
