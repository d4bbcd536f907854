//! Lossless INI document model
//!
//! This module provides a line-oriented representation of yum/dnf INI-style
//! configuration files. Unlike map-based INI parsers, every physical line of
//! the input is kept verbatim and tagged with its semantic role, so a parsed
//! document renders back to the exact input bytes and edits touch only the
//! lines they target.
//!
//! ## Features
//!
//! - Byte-identical round-trip: `parse` followed by `render` reproduces the
//!   input, including comments, blank lines and key spelling
//! - Strict parsing with file/line context: stray lines, duplicate sections
//!   and duplicate keys are rejected the way `yum`/`dnf` reject them
//! - In-place mutation: `set_key` rewrites a single value, `remove_section`
//!   and `push_section` add or drop whole sections, everything else is left
//!   untouched
//! - Multi-line values: indented continuation lines are attached to the
//!   preceding key and folded into its logical value
//!
//! ## Example
//!
//! ```ignore
//! use yum_repo_tools::document::Document;
//!
//! let mut doc = Document::parse("[updates]\nenabled=0\n", "updates.repo")?;
//! doc.set_key("updates", "enabled", "1")?;
//! assert_eq!(doc.render(), "[updates]\nenabled=1\n");
//! ```

use crate::error::{Error, Result};

/// Section name used for keys that appear before any `[section]` header.
pub const ROOT_SECTION: &str = "";

/// Semantic role of a single physical line.
#[derive(Clone, Debug, PartialEq, Eq)]
enum LineKind {
    /// Whitespace-only line.
    Blank,
    /// Full-line comment starting with `#` or `;`.
    Comment,
    /// `[name]` header.
    SectionHeader { name: String },
    /// `key = value` line. `value_start` is the byte offset in the raw text
    /// where the value begins, so a replacement can keep the original key
    /// spelling and spacing.
    KeyValue {
        key: String,
        value: String,
        value_start: usize,
    },
    /// Indented line extending the value of the preceding key.
    Continuation { text: String },
}

/// One physical line: the exact input text plus its semantic tag.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Line {
    raw: String,
    kind: LineKind,
}

impl Line {
    fn header(name: &str) -> Self {
        Line {
            raw: format!("[{}]", name),
            kind: LineKind::SectionHeader {
                name: name.to_string(),
            },
        }
    }

    fn key_value(key: &str, value: &str) -> Self {
        Line {
            raw: format!("{}={}", key, value),
            kind: LineKind::KeyValue {
                key: key.to_string(),
                value: value.to_string(),
                value_start: key.len() + 1,
            },
        }
    }
}

fn classify(raw: &str, origin: &str, number: usize, prev: Option<&LineKind>) -> Result<LineKind> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Ok(LineKind::Blank);
    }
    if trimmed.starts_with('#') || trimmed.starts_with(';') {
        return Ok(LineKind::Comment);
    }

    if raw.starts_with(|ch: char| ch.is_whitespace()) {
        // Indented content continues the previous key's value.
        match prev {
            Some(LineKind::KeyValue { .. }) | Some(LineKind::Continuation { .. }) => {
                return Ok(LineKind::Continuation {
                    text: trimmed.to_string(),
                });
            }
            _ => {
                return Err(parse_error(
                    origin,
                    number,
                    "continuation line without a preceding option",
                ));
            }
        }
    }

    if trimmed.starts_with('[') {
        let closing = match trimmed.find(']') {
            Some(pos) => pos,
            None => return Err(parse_error(origin, number, "section header is not closed")),
        };
        if !trimmed[closing + 1..].trim().is_empty() {
            return Err(parse_error(
                origin,
                number,
                "unexpected text after section header",
            ));
        }
        let name = trimmed[1..closing].trim();
        if name.is_empty() {
            return Err(parse_error(origin, number, "section name is empty"));
        }
        return Ok(LineKind::SectionHeader {
            name: name.to_string(),
        });
    }

    match raw.find('=') {
        Some(pos) => {
            let key = raw[..pos].trim();
            if key.is_empty() {
                return Err(parse_error(origin, number, "option name is empty"));
            }
            let rest = &raw[pos + 1..];
            let value = rest.trim();
            let value_start = pos + 1 + (rest.len() - rest.trim_start().len());
            Ok(LineKind::KeyValue {
                key: key.to_string(),
                value: value.to_string(),
                value_start,
            })
        }
        None => Err(parse_error(
            origin,
            number,
            "line is not a section header, option or comment",
        )),
    }
}

fn parse_error(origin: &str, line: usize, message: &str) -> Error {
    Error::Parse {
        path: origin.to_string(),
        line,
        message: message.to_string(),
    }
}

/// A parsed configuration file that can be edited and rendered back without
/// disturbing untouched lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    lines: Vec<Line>,
    /// Whether the source text ended with a newline. Preserved on render.
    trailing_newline: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Document {
            lines: Vec::new(),
            trailing_newline: true,
        }
    }

    /// Parse INI text into a document.
    ///
    /// `origin` names the source (a file path or URL) and only appears in
    /// error messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] with a 1-based line number when the input
    /// contains a malformed header, a line that is neither option nor
    /// comment, a duplicate section, or a duplicate key within one section.
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let mut raw_lines: Vec<&str> = text.split('\n').collect();
        let trailing_newline = if text.is_empty() {
            false
        } else {
            // split leaves one empty trailing element when the text ends
            // with a newline
            match raw_lines.last() {
                Some(last) if last.is_empty() => {
                    raw_lines.pop();
                    true
                }
                _ => false,
            }
        };

        let mut lines = Vec::with_capacity(raw_lines.len());
        let mut prev_kind: Option<LineKind> = None;
        for (index, raw) in raw_lines.iter().enumerate() {
            let kind = classify(raw, origin, index + 1, prev_kind.as_ref())?;
            prev_kind = Some(kind.clone());
            lines.push(Line {
                raw: (*raw).to_string(),
                kind,
            });
        }

        let doc = Document {
            lines,
            trailing_newline,
        };
        doc.check_duplicates(origin)?;
        Ok(doc)
    }

    fn check_duplicates(&self, origin: &str) -> Result<()> {
        let mut seen_sections: Vec<&str> = Vec::new();
        let mut current_section = ROOT_SECTION;
        let mut seen_keys: Vec<String> = Vec::new();

        for (index, line) in self.lines.iter().enumerate() {
            match &line.kind {
                LineKind::SectionHeader { name } => {
                    if seen_sections.iter().any(|s| *s == name.as_str()) {
                        return Err(parse_error(
                            origin,
                            index + 1,
                            &format!("duplicate section '{}'", name),
                        ));
                    }
                    seen_sections.push(name);
                    current_section = name;
                    seen_keys.clear();
                }
                LineKind::KeyValue { key, .. } => {
                    let lowered = key.to_ascii_lowercase();
                    if seen_keys.contains(&lowered) {
                        return Err(parse_error(
                            origin,
                            index + 1,
                            &format!(
                                "duplicate option '{}' in section '{}'",
                                key, current_section
                            ),
                        ));
                    }
                    seen_keys.push(lowered);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Render the document back to text.
    ///
    /// For an unmodified document this is byte-identical to the parsed
    /// input.
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut output = self
            .lines
            .iter()
            .map(|line| line.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline {
            output.push('\n');
        }
        output
    }

    /// Names of all sections, in file order. The root section is not listed.
    pub fn sections(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match &line.kind {
                LineKind::SectionHeader { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether a `[section]` header with this name exists.
    pub fn has_section(&self, section: &str) -> bool {
        if section == ROOT_SECTION {
            return true;
        }
        self.sections().iter().any(|name| *name == section)
    }

    /// Whether the document holds nothing but blank lines.
    pub fn is_effectively_empty(&self) -> bool {
        self.lines
            .iter()
            .all(|line| matches!(line.kind, LineKind::Blank))
    }

    /// Index range `(start, end)` of a section: `start` is the header line,
    /// `end` is one past the last body line. The root section starts at
    /// index 0 with no header.
    fn section_range(&self, section: &str) -> Option<(usize, usize)> {
        if section == ROOT_SECTION {
            let end = self
                .lines
                .iter()
                .position(|line| matches!(line.kind, LineKind::SectionHeader { .. }))
                .unwrap_or(self.lines.len());
            return Some((0, end));
        }
        let start = self.lines.iter().position(|line| {
            matches!(&line.kind, LineKind::SectionHeader { name } if name == section)
        })?;
        let end = self.lines[start + 1..]
            .iter()
            .position(|line| matches!(line.kind, LineKind::SectionHeader { .. }))
            .map(|offset| start + 1 + offset)
            .unwrap_or(self.lines.len());
        Some((start, end))
    }

    /// Index of the `key = value` line for `key` within the line range.
    /// Key comparison ignores ASCII case, matching yum/dnf behavior.
    fn find_key(&self, start: usize, end: usize, key: &str) -> Option<usize> {
        self.lines[start..end]
            .iter()
            .position(|line| {
                matches!(&line.kind, LineKind::KeyValue { key: k, .. }
                    if k.eq_ignore_ascii_case(key))
            })
            .map(|offset| start + offset)
    }

    /// Number of continuation lines immediately following the key line at
    /// `index`, bounded by `end`.
    fn continuation_run(&self, index: usize, end: usize) -> usize {
        self.lines[index + 1..end]
            .iter()
            .take_while(|line| matches!(line.kind, LineKind::Continuation { .. }))
            .count()
    }

    /// Logical value of `key` in `section`, with continuation lines folded
    /// in (joined by newlines, like yum itself reads them).
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        let (start, end) = self.section_range(section)?;
        let index = self.find_key(start, end, key)?;

        let mut parts: Vec<&str> = Vec::new();
        if let LineKind::KeyValue { value, .. } = &self.lines[index].kind {
            if !value.is_empty() {
                parts.push(value);
            }
        }
        let run = self.continuation_run(index, end);
        for line in &self.lines[index + 1..index + 1 + run] {
            if let LineKind::Continuation { text } = &line.kind {
                parts.push(text);
            }
        }
        Some(parts.join("\n"))
    }

    /// All `(key, value)` pairs of a section, in file order, with logical
    /// (continuation-folded) values.
    pub fn entries(&self, section: &str) -> Vec<(String, String)> {
        let (start, end) = match self.section_range(section) {
            Some(range) => range,
            None => return Vec::new(),
        };
        self.lines[start..end]
            .iter()
            .filter_map(|line| match &line.kind {
                LineKind::KeyValue { key, .. } => {
                    self.get(section, key).map(|value| (key.clone(), value))
                }
                _ => None,
            })
            .collect()
    }

    /// Set `key` to `value` inside `section`.
    ///
    /// An existing key keeps its line position and spelling; only the value
    /// text changes, and stale continuation lines of the old value are
    /// dropped. A new key is appended after the section's last option; every
    /// other line is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the section does not exist.
    pub fn set_key(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        // values are stored trimmed, the way yum reads them back
        let value = value.trim();
        let (start, end) = self.section_range(section).ok_or_else(|| Error::NotFound {
            target: format!("section '{}'", section),
        })?;

        if let Some(index) = self.find_key(start, end, key) {
            let run = self.continuation_run(index, end);
            self.lines.drain(index + 1..index + 1 + run);

            let line = &mut self.lines[index];
            if let LineKind::KeyValue {
                value: old_value,
                value_start,
                ..
            } = &mut line.kind
            {
                line.raw.truncate(*value_start);
                line.raw.push_str(value);
                *old_value = value.to_string();
            }
            return Ok(());
        }

        // New key: insert after the last option line of the section so it
        // lands with the others, ahead of any trailing blanks or comments.
        let base = if section == ROOT_SECTION { start } else { start + 1 };
        let mut insert_at = base;
        for (offset, line) in self.lines[base..end].iter().enumerate() {
            if matches!(
                line.kind,
                LineKind::KeyValue { .. } | LineKind::Continuation { .. }
            ) {
                insert_at = base + offset + 1;
            }
        }
        self.lines.insert(insert_at, Line::key_value(key, value));
        Ok(())
    }

    /// Append an empty `[name]` section at the end of the document, with a
    /// separating blank line when the document does not already end in one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SectionExists`] with `origin` as the location when
    /// the section is already present.
    pub fn push_section(&mut self, name: &str, origin: &str) -> Result<()> {
        if self.has_section(name) {
            return Err(Error::SectionExists {
                section: name.to_string(),
                path: origin.to_string(),
            });
        }
        match self.lines.last() {
            Some(last) if !matches!(last.kind, LineKind::Blank) => {
                self.lines.push(Line {
                    raw: String::new(),
                    kind: LineKind::Blank,
                });
            }
            _ => {}
        }
        self.lines.push(Line::header(name));
        self.trailing_newline = true;
        Ok(())
    }

    /// Remove a section header and its whole body (options, continuations,
    /// comments and blanks up to the next header or end of file).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the section does not exist.
    pub fn remove_section(&mut self, section: &str) -> Result<()> {
        let (start, end) = self.section_range(section).ok_or_else(|| Error::NotFound {
            target: format!("section '{}'", section),
        })?;
        self.lines.drain(start..end);
        Ok(())
    }

    /// Apply `set_key` for every pair, against every section of the
    /// document (the root section excluded).
    pub fn set_all_sections(&mut self, pairs: &[(String, String)]) -> Result<()> {
        let names: Vec<String> = self
            .sections()
            .iter()
            .map(|name| name.to_string())
            .collect();
        for name in names {
            for (key, value) in pairs {
                self.set_key(&name, key, value)?;
            }
        }
        Ok(())
    }
}
