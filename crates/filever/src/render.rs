//! Terminal rendering of version events.

use filever_versions::{
    ChangeKind, ContentProvider, FileId, MemoryContentProvider, RendererSink, VersionDiff,
    VersionSnapshot,
};
use std::io::Write;

/// Prints created and switched versions to stdout.
///
/// In quiet mode nothing is printed; the replay summary is the only output.
pub struct ConsoleRenderer {
    files: MemoryContentProvider,
    preview_chars: usize,
    quiet: bool,
}

impl ConsoleRenderer {
    pub fn new(files: MemoryContentProvider, preview_chars: usize, quiet: bool) -> Self {
        Self {
            files,
            preview_chars,
            quiet,
        }
    }

    fn filename(&self, file_id: &FileId) -> String {
        self.files
            .current_content(file_id)
            .map(|file| file.filename)
            .unwrap_or_else(|| file_id.to_string())
    }

    fn print_version(&self, action: &str, file_id: &FileId, snapshot: &VersionSnapshot, content: &str) {
        if self.quiet {
            return;
        }

        let mut out = String::new();
        out.push_str(&format!(
            "== {} {} {} ==\n",
            self.filename(file_id),
            action,
            snapshot.label()
        ));
        for entry in snapshot.change_summary(self.preview_chars) {
            let marker = match entry.kind {
                ChangeKind::Modified => '~',
                ChangeKind::Added => '+',
                ChangeKind::Removed => '-',
            };
            out.push_str(&format!("  {} {}: {}\n", marker, entry.name, entry.description));
            if !entry.preview.is_empty() {
                out.push_str(&format!("      {}\n", entry.preview.replace('\n', "\n      ")));
            }
        }
        out.push_str(content);
        out.push('\n');
        emit(&out);
    }
}

impl RendererSink for ConsoleRenderer {
    fn on_version_created(&self, file_id: &FileId, snapshot: &VersionSnapshot, content: &str) {
        self.print_version("created", file_id, snapshot, content);
    }

    fn on_version_switched(&self, file_id: &FileId, snapshot: &VersionSnapshot, content: &str) {
        self.print_version("switched to", file_id, snapshot, content);
    }

    fn on_diff_requested(&self, _file_id: &FileId, diff: &VersionDiff) {
        if self.quiet {
            return;
        }
        let stats = diff.stats();
        emit(&format!(
            "{}{} insertion(s), {} deletion(s)\n",
            diff.unified(),
            stats.insertions,
            stats.deletions
        ));
    }
}

fn emit(text: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()) {
        tracing::debug!("Failed to write to stdout: {}", e);
    }
}
