//! Replaying a recorded update stream.
//!
//! Input is JSON Lines: one update message per line, exactly as the chat
//! transport delivered it. Complete files for names nobody has seen yet are
//! registered with the in-memory provider before they are dispatched, so
//! the replay behaves like a chat where the file was just rendered.

use crate::render::ConsoleRenderer;
use anyhow::Context;
use filever_versions::{
    ContentProvider, DispatchStats, FileId, MemoryContentProvider, MemoryStats, UpdateKind,
    UpdateMessage, UpdateQueue, VersionStore, VersionSummary, VersionsConfig,
};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Post-processing applied once the stream has been replayed.
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Switch every file to this version.
    pub switch_to: Option<u32>,
    /// Show the diff between the current version and its predecessor.
    pub diff: bool,
    /// Run cleanup keeping this many versions; `Some(None)` uses the
    /// configured `keep_versions`.
    pub cleanup: Option<Option<usize>>,
    /// Suppress per-version output.
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file_id: String,
    pub filename: String,
    pub current_version: Option<u32>,
    pub history: Vec<VersionSummary>,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub dispatch: DispatchStats,
    pub memory: MemoryStats,
    pub cleaned_up: usize,
    pub files: Vec<FileReport>,
}

impl ReplayReport {
    /// Human-readable summary.
    pub fn render_text(&self) -> String {
        let d = &self.dispatch;
        let mut out = format!(
            "Replayed {} update(s): {} versioned, {} tracked, {} unchanged, {} dropped\n",
            d.received, d.versioned, d.tracked, d.unchanged, d.dropped
        );

        for file in &self.files {
            let _ = writeln!(out, "\n{} ({})", file.filename, file.file_id);
            if file.history.is_empty() {
                out.push_str("  (no versions)\n");
            }
            for entry in &file.history {
                let marker = if entry.current { '*' } else { ' ' };
                let _ = writeln!(
                    out,
                    "  {} {}  {}",
                    marker,
                    entry.label,
                    entry.timestamp.format("%H:%M:%S")
                );
            }
        }

        if self.cleaned_up > 0 {
            let _ = writeln!(out, "\nCleaned up {} version(s)", self.cleaned_up);
        }
        let _ = writeln!(
            out,
            "\nMemory: {} file(s), {} version(s), {:.2} per file",
            self.memory.total_files, self.memory.total_versions, self.memory.average_versions_per_file
        );
        out
    }
}

/// Replay the update stream in `input`.
pub async fn replay(
    input: &Path,
    config: VersionsConfig,
    options: &ReplayOptions,
) -> anyhow::Result<ReplayReport> {
    let stream = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let provider = MemoryContentProvider::new();
    let renderer = ConsoleRenderer::new(provider.clone(), config.preview_chars, options.quiet);
    let store = VersionStore::new(config, Arc::new(provider.clone()), Arc::new(renderer));
    let (queue, worker) = UpdateQueue::spawn(store);

    for (idx, line) in stream.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let sent = match line.parse::<UpdateMessage>() {
            Ok(message) => {
                register_new_file(&provider, &message);
                queue.send(message)
            }
            Err(e) => {
                debug!(line = idx + 1, "Passing malformed update through: {}", e);
                queue.send_json(line)
            }
        };
        if !sent {
            anyhow::bail!("Update queue stopped at line {}", idx + 1);
        }
    }

    let dispatch = queue.flush().await.context("Update queue stopped")?;
    drop(queue);
    let mut store = worker.await?;

    let mut files: Vec<(String, FileId)> = store
        .files()
        .map(|(id, record)| (record.filename().to_string(), id.clone()))
        .collect();
    files.sort();

    if let Some(version) = options.switch_to {
        for (filename, id) in &files {
            if let Err(e) = store.switch_to_version(id, version) {
                warn!("Cannot switch {} to v{}: {}", filename, version, e);
            }
        }
    }

    if options.diff {
        for (filename, id) in &files {
            if let Err(e) = store.show_diff(id) {
                warn!("Cannot diff {}: {}", filename, e);
            }
        }
    }

    let cleaned_up = match options.cleanup {
        Some(keep) => {
            let keep = keep.unwrap_or(store.config().keep_versions);
            store.cleanup_all(keep)
        }
        None => 0,
    };

    let files = files
        .into_iter()
        .map(|(filename, id)| {
            let record = store.record(&id);
            Ok(FileReport {
                current_version: record.and_then(|r| r.current_version()),
                history: store.history(&id)?,
                file_id: id.to_string(),
                filename,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(ReplayReport {
        dispatch,
        memory: store.memory_stats(),
        cleaned_up,
        files,
    })
}

fn register_new_file(provider: &MemoryContentProvider, message: &UpdateMessage) {
    if let UpdateKind::Complete { content } = &message.kind {
        if provider.find_file(&message.filename).is_none() {
            let id = provider.register(message.filename.as_str(), content.as_str());
            debug!(file_id = %id, filename = %message.filename, "Registered file");
        }
    }
}
