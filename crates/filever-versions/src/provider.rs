//! Collaborators the version store talks to.
//!
//! The store never reaches into the chat or rendering layers directly: it
//! reads and writes live file content through a [`ContentProvider`] and
//! announces new versions, switches and diffs through a [`RendererSink`].

use crate::diff::VersionDiff;
use crate::snapshot::{FileId, VersionSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Live content of a file as the rest of the application sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub filename: String,
    pub content: String,
}

/// Source of truth for the live view of each file.
#[cfg_attr(test, mockall::automock)]
pub trait ContentProvider: Send + Sync {
    /// Locate a file by its display name.
    fn find_file(&self, filename: &str) -> Option<FileId>;

    /// Current flat content of a file.
    fn current_content(&self, file_id: &FileId) -> Option<FileContent>;

    /// Replace the cached flat content of a file.
    fn set_content(&self, file_id: &FileId, content: &str);
}

/// Receives display requests; calls are fire-and-forget.
#[cfg_attr(test, mockall::automock)]
pub trait RendererSink: Send + Sync {
    /// A new version was created and should get its own display block.
    fn on_version_created(&self, file_id: &FileId, snapshot: &VersionSnapshot, content: &str);

    /// The user switched to an existing version.
    fn on_version_switched(&self, file_id: &FileId, snapshot: &VersionSnapshot, content: &str);

    /// A comparison between two versions was requested.
    fn on_diff_requested(&self, file_id: &FileId, diff: &VersionDiff);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory content provider.
#[derive(Debug, Default, Clone)]
pub struct MemoryContentProvider {
    files: Arc<Mutex<HashMap<FileId, FileContent>>>,
}

impl MemoryContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its new identifier.
    pub fn register(&self, filename: impl Into<String>, content: impl Into<String>) -> FileId {
        let id = FileId::new();
        self.insert(id.clone(), filename, content);
        id
    }

    /// Register a file under a known identifier.
    pub fn insert(&self, id: FileId, filename: impl Into<String>, content: impl Into<String>) {
        lock(&self.files).insert(
            id,
            FileContent {
                filename: filename.into(),
                content: content.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        lock(&self.files).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentProvider for MemoryContentProvider {
    fn find_file(&self, filename: &str) -> Option<FileId> {
        lock(&self.files)
            .iter()
            .filter(|(_, file)| file.filename == filename)
            .map(|(id, _)| id.clone())
            .min()
    }

    fn current_content(&self, file_id: &FileId) -> Option<FileContent> {
        lock(&self.files).get(file_id).cloned()
    }

    fn set_content(&self, file_id: &FileId, content: &str) {
        if let Some(file) = lock(&self.files).get_mut(file_id) {
            file.content = content.to_string();
        }
    }
}

/// Renderer that ignores every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RendererSink for NullRenderer {
    fn on_version_created(&self, _: &FileId, _: &VersionSnapshot, _: &str) {}
    fn on_version_switched(&self, _: &FileId, _: &VersionSnapshot, _: &str) {}
    fn on_diff_requested(&self, _: &FileId, _: &VersionDiff) {}
}

/// A display request captured by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Created {
        file_id: FileId,
        version: u32,
        content: String,
    },
    Switched {
        file_id: FileId,
        version: u32,
        content: String,
    },
    Diff {
        file_id: FileId,
        diff: VersionDiff,
    },
}

/// Renderer that records every request, for tests and replays.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    events: Arc<Mutex<Vec<RenderEvent>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        lock(&self.events).clone()
    }

    /// Content of the most recent created or switched display.
    pub fn last_content(&self) -> Option<String> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            RenderEvent::Created { content, .. } | RenderEvent::Switched { content, .. } => {
                Some(content.clone())
            }
            RenderEvent::Diff { .. } => None,
        })
    }
}

impl RendererSink for RecordingRenderer {
    fn on_version_created(&self, file_id: &FileId, snapshot: &VersionSnapshot, content: &str) {
        lock(&self.events).push(RenderEvent::Created {
            file_id: file_id.clone(),
            version: snapshot.version(),
            content: content.to_string(),
        });
    }

    fn on_version_switched(&self, file_id: &FileId, snapshot: &VersionSnapshot, content: &str) {
        lock(&self.events).push(RenderEvent::Switched {
            file_id: file_id.clone(),
            version: snapshot.version(),
            content: content.to_string(),
        });
    }

    fn on_diff_requested(&self, file_id: &FileId, diff: &VersionDiff) {
        lock(&self.events).push(RenderEvent::Diff {
            file_id: file_id.clone(),
            diff: diff.clone(),
        });
    }
}
