//! Sections and section deltas.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name of the single section a flat file is split into before its first delta.
pub const MAIN_SECTION: &str = "main_content";

/// Sections of one file version, keyed by section name.
pub type SectionMap = BTreeMap<String, SectionData>;

/// A named fragment of a file with the line range used to order it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionData {
    /// Free-form section type reported by the backend (e.g. "function").
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Section text.
    #[serde(default)]
    pub content: String,

    /// First line of the section; missing values sort as 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,

    /// Last line of the section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,

    /// Human readable description of what changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<String>,
}

impl SectionData {
    /// Create a section with content starting at `start_line`.
    pub fn new(content: impl Into<String>, start_line: u32) -> Self {
        let content = content.into();
        let extra = u32::try_from(content.lines().count().saturating_sub(1)).unwrap_or(u32::MAX);
        let end_line = start_line.saturating_add(extra);
        Self {
            kind: "content".to_string(),
            content,
            start_line: Some(start_line),
            end_line: Some(end_line),
            change_summary: None,
        }
    }

    /// Set the section type.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Attach a change summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.change_summary = Some(summary.into());
        self
    }

    /// Start line used for ordering.
    pub fn order_line(&self) -> u32 {
        self.start_line.unwrap_or(0)
    }
}

/// Split flat content into the initial section map.
///
/// Empty content yields no sections; anything else becomes a single
/// [`MAIN_SECTION`] starting at line 1.
pub fn sections_from_content(content: &str) -> SectionMap {
    let mut sections = SectionMap::new();
    if content.is_empty() {
        return sections;
    }
    let lines = u32::try_from(content.split('\n').count()).unwrap_or(u32::MAX);
    sections.insert(
        MAIN_SECTION.to_string(),
        SectionData {
            kind: "content".to_string(),
            content: content.to_string(),
            start_line: Some(1),
            end_line: Some(lines),
            change_summary: None,
        },
    );
    sections
}

/// The sections a partial update modifies, adds and removes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionDelta {
    #[serde(default)]
    pub modified: SectionMap,
    #[serde(default)]
    pub added: SectionMap,
    #[serde(default)]
    pub removed: BTreeSet<String>,
}

impl SectionDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite an existing section.
    pub fn modify(mut self, name: impl Into<String>, section: SectionData) -> Self {
        self.modified.insert(name.into(), section);
        self
    }

    /// Insert a new section.
    pub fn add(mut self, name: impl Into<String>, section: SectionData) -> Self {
        self.added.insert(name.into(), section);
        self
    }

    /// Delete a section by name.
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.removed.insert(name.into());
        self
    }

    /// Number of section changes carried by this delta.
    pub fn change_count(&self) -> usize {
        self.modified.len() + self.added.len() + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_from_content() {
        let sections = sections_from_content("a\nb\nc");
        let main = &sections[MAIN_SECTION];
        assert_eq!(main.start_line, Some(1));
        assert_eq!(main.end_line, Some(3));
        assert_eq!(main.content, "a\nb\nc");

        assert!(sections_from_content("").is_empty());
    }

    #[test]
    fn test_section_deserialize_defaults() {
        let section: SectionData = serde_json::from_str(r#"{"content": "X"}"#).unwrap();
        assert_eq!(section.content, "X");
        assert_eq!(section.start_line, None);
        assert_eq!(section.order_line(), 0);
        assert_eq!(section.kind, "");

        let typed: SectionData =
            serde_json::from_str(r#"{"type": "function", "content": "fn a() {}", "start_line": 4}"#)
                .unwrap();
        assert_eq!(typed.kind, "function");
        assert_eq!(typed.order_line(), 4);
    }

    #[test]
    fn test_end_line_saturates() {
        let section = SectionData::new("a\nb\nc", u32::MAX - 1);
        assert_eq!(section.start_line, Some(u32::MAX - 1));
        assert_eq!(section.end_line, Some(u32::MAX));

        assert_eq!(SectionData::new("a\nb", 4).end_line, Some(5));
    }

    #[test]
    fn test_delta_change_count() {
        let delta = SectionDelta::new()
            .modify("a", SectionData::new("A", 1))
            .add("b", SectionData::new("B", 2))
            .remove("c")
            .remove("c");
        assert_eq!(delta.change_count(), 3);
        assert!(SectionDelta::new().is_empty());
    }

    #[test]
    fn test_section_new_end_line() {
        let section = SectionData::new("one\ntwo\nthree", 10);
        assert_eq!(section.end_line, Some(12));
        assert_eq!(SectionData::new("", 5).end_line, Some(5));
    }
}
