//! Comparing adjacent versions.

use crate::error::{VersionError, VersionResult};
use crate::snapshot::{FileId, FileVersionRecord};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// Two versions of a file side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDiff {
    pub filename: String,
    pub old_version: u32,
    pub new_version: u32,
    pub old_text: String,
    pub new_text: String,
    /// Context lines around each hunk in [`VersionDiff::unified`].
    #[serde(skip)]
    context_lines: usize,
}

/// Line counts of a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub insertions: usize,
    pub deletions: usize,
}

impl VersionDiff {
    pub fn is_identical(&self) -> bool {
        self.old_text == self.new_text
    }

    /// Unified diff of the two texts.
    pub fn unified(&self) -> String {
        let diff = TextDiff::from_lines(&self.old_text, &self.new_text);
        let mut output = String::new();

        output.push_str(&format!("--- {} (v{})\n", self.filename, self.old_version));
        output.push_str(&format!("+++ {} (v{})\n", self.filename, self.new_version));

        for (idx, group) in diff.grouped_ops(self.context_lines).iter().enumerate() {
            if idx > 0 {
                output.push_str("...\n");
            }

            for op in group {
                for change in diff.iter_changes(op) {
                    let sign = match change.tag() {
                        ChangeTag::Delete => "-",
                        ChangeTag::Insert => "+",
                        ChangeTag::Equal => " ",
                    };

                    output.push_str(sign);
                    output.push_str(change.value());
                    if !change.value().ends_with('\n') {
                        output.push('\n');
                    }
                }
            }
        }

        output
    }

    /// Count inserted and deleted lines.
    pub fn stats(&self) -> DiffStats {
        let diff = TextDiff::from_lines(&self.old_text, &self.new_text);
        diff.iter_all_changes()
            .fold(DiffStats::default(), |mut stats, change| {
                match change.tag() {
                    ChangeTag::Insert => stats.insertions += 1,
                    ChangeTag::Delete => stats.deletions += 1,
                    ChangeTag::Equal => {}
                }
                stats
            })
    }
}

/// Builds comparisons between a file's current version and its predecessor.
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine {
    context_lines: usize,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self { context_lines: 3 }
    }
}

impl DiffEngine {
    pub fn new(context_lines: usize) -> Self {
        Self { context_lines }
    }

    /// Compare the current version with the nearest retained version below it.
    pub fn diff_latest(&self, file_id: &FileId, record: &FileVersionRecord) -> VersionResult<VersionDiff> {
        let current = record
            .current_snapshot()
            .ok_or_else(|| VersionError::file_not_found(file_id))?;

        let previous = record
            .versions()
            .rev()
            .find(|snapshot| snapshot.version() < current.version())
            .ok_or_else(|| VersionError::NoPreviousVersion {
                file: file_id.clone(),
                version: current.version(),
            })?;

        Ok(VersionDiff {
            filename: record.filename().to_string(),
            old_version: previous.version(),
            new_version: current.version(),
            old_text: previous.content(),
            new_text: current.content(),
            context_lines: self.context_lines,
        })
    }
}
