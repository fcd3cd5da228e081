//! Version snapshot data structures.

use crate::reconstruct::reconstruct;
use crate::section::{SectionDelta, SectionMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Opaque identifier of a tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub String);

impl FileId {
    /// Create a new random file ID.
    pub fn new() -> Self {
        Self(format!("file_{}", Uuid::new_v4().simple()))
    }

    /// Create a file ID from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata recorded when a version is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub timestamp: DateTime<Utc>,
    /// True only for version 1.
    pub is_original: bool,
    /// Number of section changes in the delta that produced this version.
    pub change_count: usize,
}

/// One immutable version of a file.
///
/// Snapshots are shared as `Arc<VersionSnapshot>` and expose no mutating
/// methods, so a stored version can never change after it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSnapshot {
    version: u32,
    sections: SectionMap,
    metadata: VersionMetadata,
    changes: SectionDelta,
}

impl VersionSnapshot {
    pub(crate) fn new(version: u32, sections: SectionMap, changes: SectionDelta) -> Self {
        Self {
            version,
            sections,
            metadata: VersionMetadata {
                timestamp: Utc::now(),
                is_original: version == 1,
                change_count: changes.change_count(),
            },
            changes,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn sections(&self) -> &SectionMap {
        &self.sections
    }

    pub fn metadata(&self) -> &VersionMetadata {
        &self.metadata
    }

    /// The delta that produced this version from its predecessor.
    pub fn changes(&self) -> &SectionDelta {
        &self.changes
    }

    /// Flat file content of this version.
    pub fn content(&self) -> String {
        reconstruct(&self.sections)
    }

    /// Label shown in the version switcher.
    pub fn label(&self) -> String {
        if self.metadata.is_original {
            format!("v{} (Original)", self.version)
        } else {
            format!("v{} ({} changes)", self.version, self.metadata.change_count)
        }
    }

    /// Entries for the change-summary panel; empty for the original version.
    pub fn change_summary(&self, preview_chars: usize) -> Vec<ChangeEntry> {
        if self.metadata.is_original {
            return Vec::new();
        }
        summarize(&self.changes, preview_chars)
    }
}

/// Kind of a section change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Modified,
    Added,
    Removed,
}

/// One line of a change summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub kind: ChangeKind,
    pub name: String,
    pub description: String,
    /// Leading characters of the new content; empty for removals.
    pub preview: String,
}

/// Summarize a delta as modified, added and removed entries.
pub fn summarize(delta: &SectionDelta, preview_chars: usize) -> Vec<ChangeEntry> {
    let sections = delta
        .modified
        .iter()
        .map(|entry| (ChangeKind::Modified, entry))
        .chain(delta.added.iter().map(|entry| (ChangeKind::Added, entry)));

    let mut entries: Vec<ChangeEntry> = sections
        .map(|(kind, (name, section))| {
            let fallback = match kind {
                ChangeKind::Modified => "Modified content",
                _ => "New content",
            };
            ChangeEntry {
                kind,
                name: name.clone(),
                description: section
                    .change_summary
                    .clone()
                    .unwrap_or_else(|| fallback.to_string()),
                preview: preview(&section.content, preview_chars),
            }
        })
        .collect();

    entries.extend(delta.removed.iter().map(|name| ChangeEntry {
        kind: ChangeKind::Removed,
        name: name.clone(),
        description: "Section removed".to_string(),
        preview: String::new(),
    }));

    entries
}

fn preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Version history of one file.
#[derive(Debug, Clone)]
pub struct FileVersionRecord {
    filename: String,
    versions: BTreeMap<u32, Arc<VersionSnapshot>>,
    current_version: Option<u32>,
    /// Raw content seen by a complete update before any delta arrived.
    base_content: Option<String>,
    last_sequence: Option<u64>,
    /// Number the next version gets; never reused after eviction.
    next_version: u32,
}

impl FileVersionRecord {
    /// A record with no history yet, bound to the raw content of a complete file.
    pub(crate) fn placeholder(filename: impl Into<String>, base_content: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            versions: BTreeMap::new(),
            current_version: None,
            base_content,
            last_sequence: None,
            next_version: 1,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Current version, `None` while the record is still a placeholder.
    pub fn current_version(&self) -> Option<u32> {
        self.current_version
    }

    pub fn current_snapshot(&self) -> Option<&Arc<VersionSnapshot>> {
        self.current_version.and_then(|v| self.versions.get(&v))
    }

    pub fn get(&self, version: u32) -> Option<&Arc<VersionSnapshot>> {
        self.versions.get(&version)
    }

    pub fn contains(&self, version: u32) -> bool {
        self.versions.contains_key(&version)
    }

    /// Highest version number ever retained.
    pub fn latest_version(&self) -> Option<u32> {
        self.versions.keys().next_back().copied()
    }

    /// Retained version numbers in ascending order.
    pub fn version_numbers(&self) -> Vec<u32> {
        self.versions.keys().copied().collect()
    }

    pub fn versions(&self) -> impl DoubleEndedIterator<Item = &Arc<VersionSnapshot>> {
        self.versions.values()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn base_content(&self) -> Option<&str> {
        self.base_content.as_deref()
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// Number the next pushed version will get.
    pub fn next_version(&self) -> u32 {
        self.next_version
    }

    pub(crate) fn push(&mut self, snapshot: VersionSnapshot) -> Arc<VersionSnapshot> {
        let version = snapshot.version();
        self.next_version = self.next_version.max(version.saturating_add(1));
        let snapshot = Arc::new(snapshot);
        self.versions.insert(version, Arc::clone(&snapshot));
        self.current_version = Some(version);
        snapshot
    }

    pub(crate) fn set_current(&mut self, version: u32) {
        self.current_version = Some(version);
    }

    pub(crate) fn set_last_sequence(&mut self, sequence: u64) {
        self.last_sequence = Some(sequence);
    }

    /// Keep the `keep` newest versions plus version 1; returns removed numbers.
    pub(crate) fn retain_recent(&mut self, keep: usize) -> Vec<u32> {
        if self.versions.len() <= keep {
            return Vec::new();
        }

        let numbers = self.version_numbers();
        let cutoff = numbers.len() - keep;
        let removed: Vec<u32> = numbers[..cutoff]
            .iter()
            .copied()
            .filter(|&v| v != 1)
            .collect();

        for version in &removed {
            self.versions.remove(version);
        }

        if let Some(current) = self.current_version {
            if !self.versions.contains_key(&current) {
                self.current_version = self.latest_version();
            }
        }

        removed
    }
}
