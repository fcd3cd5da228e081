//! Per-file version history.

use crate::config::VersionsConfig;
use crate::diff::{DiffEngine, VersionDiff};
use crate::error::{VersionError, VersionResult};
use crate::message::{UpdateKind, UpdateMessage};
use crate::patch;
use crate::provider::{ContentProvider, RendererSink};
use crate::section::{sections_from_content, SectionDelta, SectionMap};
use crate::snapshot::{FileId, FileVersionRecord, VersionSnapshot};
use chrono::{DateTime, Utc};
use filever_util::TimingGuard;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const UPDATE_WARN_THRESHOLD: Duration = Duration::from_millis(100);
const CLEANUP_INFO_THRESHOLD: Duration = Duration::from_millis(5);

/// What applying an update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new version was stored.
    Versioned(Arc<VersionSnapshot>),
    /// A complete file started being tracked; no version yet.
    Tracked,
    /// A complete file arrived for a file that is already tracked.
    Unchanged,
}

/// Diagnostics about retained history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryStats {
    pub total_files: usize,
    pub total_versions: usize,
    pub average_versions_per_file: f64,
}

/// One row of the version switcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSummary {
    pub version: u32,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub change_count: usize,
    pub current: bool,
}

/// In-memory version history for every file seen in a session.
///
/// Each partial update produces a new immutable [`VersionSnapshot`]; the live
/// file content is kept in sync through the [`ContentProvider`] and every
/// new or switched version is announced to the [`RendererSink`].
pub struct VersionStore {
    records: HashMap<FileId, FileVersionRecord>,
    provider: Arc<dyn ContentProvider>,
    renderer: Arc<dyn RendererSink>,
    diff_engine: DiffEngine,
    config: VersionsConfig,
}

impl std::fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionStore")
            .field("files", &self.records.len())
            .field("config", &self.config)
            .finish()
    }
}

impl VersionStore {
    pub fn new(
        config: VersionsConfig,
        provider: Arc<dyn ContentProvider>,
        renderer: Arc<dyn RendererSink>,
    ) -> Self {
        Self {
            records: HashMap::new(),
            provider,
            renderer,
            diff_engine: DiffEngine::new(config.diff_context_lines),
            config,
        }
    }

    pub fn config(&self) -> &VersionsConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn ContentProvider> {
        &self.provider
    }

    /// Route an update for a resolved file.
    ///
    /// Partial updates for a known file (one with a record or live content)
    /// create a new version; everything else is treated as a complete file.
    pub fn handle_update(
        &mut self,
        file_id: &FileId,
        message: &UpdateMessage,
    ) -> VersionResult<UpdateOutcome> {
        if let Some(sequence) = message.sequence {
            self.check_sequence(file_id, sequence)?;
        }

        let known = self.records.contains_key(file_id)
            || self.provider.current_content(file_id).is_some();

        let outcome = match &message.kind {
            UpdateKind::Partial(delta) if known => UpdateOutcome::Versioned(
                self.apply_partial_update(file_id, &message.filename, delta)?,
            ),
            UpdateKind::Partial(_) => {
                self.complete_outcome(file_id, &message.filename, None)
            }
            UpdateKind::Complete { content } => {
                self.complete_outcome(file_id, &message.filename, Some(content.clone()))
            }
        };

        if let (Some(sequence), Some(record)) = (message.sequence, self.records.get_mut(file_id)) {
            record.set_last_sequence(sequence);
        }

        Ok(outcome)
    }

    fn complete_outcome(
        &mut self,
        file_id: &FileId,
        filename: &str,
        content: Option<String>,
    ) -> UpdateOutcome {
        if self.handle_complete_file(file_id, filename, content) {
            UpdateOutcome::Tracked
        } else {
            UpdateOutcome::Unchanged
        }
    }

    /// Reject updates that are not newer than the last accepted one.
    fn check_sequence(&self, file_id: &FileId, sequence: u64) -> VersionResult<()> {
        let Some(last) = self.records.get(file_id).and_then(|r| r.last_sequence()) else {
            return Ok(());
        };
        if sequence <= last {
            warn!(file_id = %file_id, sequence, last, "Dropping stale update");
            return Err(VersionError::StaleUpdate {
                file: file_id.clone(),
                sequence,
                last,
            });
        }
        Ok(())
    }

    /// Apply a section delta on top of the current version.
    ///
    /// The first delta for a file is applied to its live content (a single
    /// `main_content` section) and becomes version 1. Later deltas build on
    /// the current version and take the next number never issued for the file.
    pub fn apply_partial_update(
        &mut self,
        file_id: &FileId,
        filename: &str,
        delta: &SectionDelta,
    ) -> VersionResult<Arc<VersionSnapshot>> {
        let _timing = TimingGuard::update(file_id.as_str()).with_warn_threshold(UPDATE_WARN_THRESHOLD);

        let patched = self.records.get(file_id).and_then(|record| {
            let current = record.current_snapshot()?;
            let next = record.next_version();
            debug!(
                file_id = %file_id,
                base = current.version(),
                next,
                "Building version from current"
            );
            Some((patch::apply(current.sections(), delta), next))
        });

        let (sections, version) = match patched {
            Some(found) => found,
            None => {
                debug!(file_id = %file_id, "No version history, creating version 1");
                (patch::apply(&self.seed_sections(file_id), delta), 1)
            }
        };

        let record = self
            .records
            .entry(file_id.clone())
            .or_insert_with(|| FileVersionRecord::placeholder(filename, None));
        let snapshot = record.push(VersionSnapshot::new(version, sections, delta.clone()));

        let content = snapshot.content();
        info!(
            file_id = %file_id,
            version,
            changes = delta.change_count(),
            length = content.len(),
            "Partial update applied"
        );

        self.provider.set_content(file_id, &content);
        self.renderer.on_version_created(file_id, &snapshot, &content);

        if self.config.auto_cleanup {
            if let Err(e) = self.cleanup_default(file_id) {
                warn!("Version cleanup failed: {}", e);
            }
        }

        Ok(snapshot)
    }

    /// Sections version 1 is built from: live content, else the raw content
    /// of a tracked complete file, else nothing.
    fn seed_sections(&self, file_id: &FileId) -> SectionMap {
        let content = self
            .provider
            .current_content(file_id)
            .map(|file| file.content)
            .or_else(|| {
                self.records
                    .get(file_id)
                    .and_then(|record| record.base_content().map(str::to_string))
            })
            .unwrap_or_default();
        sections_from_content(&content)
    }

    /// Start tracking a complete file. Returns `true` if a record was created.
    ///
    /// The record has no versions until the first partial update arrives.
    pub fn handle_complete_file(
        &mut self,
        file_id: &FileId,
        filename: &str,
        content: Option<String>,
    ) -> bool {
        if self.records.contains_key(file_id) {
            debug!(file_id = %file_id, "Complete file for tracked file, history unchanged");
            return false;
        }

        self.records.insert(
            file_id.clone(),
            FileVersionRecord::placeholder(filename, content),
        );
        info!(file_id = %file_id, filename, "Tracking file");
        true
    }

    pub fn record(&self, file_id: &FileId) -> Option<&FileVersionRecord> {
        self.records.get(file_id)
    }

    pub fn files(&self) -> impl Iterator<Item = (&FileId, &FileVersionRecord)> {
        self.records.iter()
    }

    fn require(&self, file_id: &FileId) -> VersionResult<&FileVersionRecord> {
        self.records.get(file_id).ok_or_else(|| {
            warn!(file_id = %file_id, "No version history for file");
            VersionError::file_not_found(file_id)
        })
    }

    pub fn get_version(&self, file_id: &FileId, version: u32) -> VersionResult<Arc<VersionSnapshot>> {
        self.require(file_id)?.get(version).cloned().ok_or_else(|| {
            warn!(file_id = %file_id, version, "Version not found");
            VersionError::version_not_found(file_id, version)
        })
    }

    /// Flat content of the current version.
    pub fn current_content(&self, file_id: &FileId) -> VersionResult<String> {
        self.require(file_id)?
            .current_snapshot()
            .map(|snapshot| snapshot.content())
            .ok_or_else(|| VersionError::file_not_found(file_id))
    }

    /// Make `version` current and redisplay it.
    ///
    /// Fails without changing anything if the version is not retained.
    pub fn switch_to_version(
        &mut self,
        file_id: &FileId,
        version: u32,
    ) -> VersionResult<Arc<VersionSnapshot>> {
        let snapshot = self.get_version(file_id, version)?;

        if let Some(record) = self.records.get_mut(file_id) {
            record.set_current(version);
        }

        let content = snapshot.content();
        self.provider.set_content(file_id, &content);
        self.renderer.on_version_switched(file_id, &snapshot, &content);
        info!(file_id = %file_id, version, "Switched version");

        Ok(snapshot)
    }

    /// Compare the current version with the one before it.
    pub fn diff_latest(&self, file_id: &FileId) -> VersionResult<VersionDiff> {
        let record = self.require(file_id)?;
        self.diff_engine.diff_latest(file_id, record).map_err(|e| {
            warn!(file_id = %file_id, "Cannot diff: {}", e);
            e
        })
    }

    /// Build the latest diff and hand it to the renderer.
    pub fn show_diff(&self, file_id: &FileId) -> VersionResult<VersionDiff> {
        let diff = self.diff_latest(file_id)?;
        self.renderer.on_diff_requested(file_id, &diff);
        Ok(diff)
    }

    /// Keep the `keep_versions` newest versions plus version 1.
    ///
    /// If the current version is evicted the newest retained version becomes
    /// current and is pushed to the provider and renderer like a switch.
    /// Returns the number of versions removed.
    pub fn cleanup(&mut self, file_id: &FileId, keep_versions: usize) -> VersionResult<usize> {
        let _timing = TimingGuard::new("cleanup", file_id.as_str())
            .with_info_threshold(CLEANUP_INFO_THRESHOLD);
        let record = self
            .records
            .get_mut(file_id)
            .ok_or_else(|| VersionError::file_not_found(file_id))?;

        let before = record.current_version();
        let removed = record.retain_recent(keep_versions);
        for version in &removed {
            debug!(file_id = %file_id, version, "Cleaned up old version");
        }
        if !removed.is_empty() {
            info!(file_id = %file_id, removed = removed.len(), "Cleaned up versions");
        }

        let moved = record
            .current_snapshot()
            .filter(|snapshot| before != Some(snapshot.version()))
            .cloned();
        if let Some(snapshot) = moved {
            let content = snapshot.content();
            self.provider.set_content(file_id, &content);
            self.renderer.on_version_switched(file_id, &snapshot, &content);
            info!(
                file_id = %file_id,
                evicted = ?before,
                version = snapshot.version(),
                "Current version evicted, switched to latest"
            );
        }

        Ok(removed.len())
    }

    /// [`VersionStore::cleanup`] with the configured `keep_versions`.
    pub fn cleanup_default(&mut self, file_id: &FileId) -> VersionResult<usize> {
        self.cleanup(file_id, self.config.keep_versions)
    }

    /// Apply [`VersionStore::cleanup`] to every tracked file.
    pub fn cleanup_all(&mut self, keep_versions: usize) -> usize {
        let ids: Vec<FileId> = self.records.keys().cloned().collect();
        ids.iter()
            .filter_map(|id| self.cleanup(id, keep_versions).ok())
            .sum()
    }

    /// Retained versions, newest first.
    pub fn history(&self, file_id: &FileId) -> VersionResult<Vec<VersionSummary>> {
        let record = self.require(file_id)?;
        Ok(record
            .versions()
            .rev()
            .map(|snapshot| VersionSummary {
                version: snapshot.version(),
                label: snapshot.label(),
                timestamp: snapshot.metadata().timestamp,
                change_count: snapshot.metadata().change_count,
                current: record.current_version() == Some(snapshot.version()),
            })
            .collect())
    }

    /// Retained snapshots of a file as pretty JSON.
    pub fn export_history(&self, file_id: &FileId) -> VersionResult<String> {
        let record = self.require(file_id)?;
        let snapshots: Vec<&VersionSnapshot> = record.versions().map(|s| &**s).collect();
        Ok(serde_json::to_string_pretty(&snapshots)?)
    }

    pub fn memory_stats(&self) -> MemoryStats {
        let total_files = self.records.len();
        let total_versions = self.records.values().map(FileVersionRecord::len).sum();
        let average_versions_per_file = if total_files > 0 {
            total_versions as f64 / total_files as f64
        } else {
            0.0
        };
        MemoryStats {
            total_files,
            total_versions,
            average_versions_per_file,
        }
    }

    /// Drop every record; used when the session ends.
    pub fn clear(&mut self) {
        let stats = self.memory_stats();
        self.records.clear();
        debug!(
            files = stats.total_files,
            versions = stats.total_versions,
            "Version store cleared"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        FileContent, MemoryContentProvider, MockContentProvider, MockRendererSink, NullRenderer,
        RecordingRenderer, RenderEvent,
    };
    use crate::section::SectionData;

    fn setup() -> (VersionStore, MemoryContentProvider, RecordingRenderer, FileId) {
        let provider = MemoryContentProvider::new();
        let renderer = RecordingRenderer::new();
        let file_id = provider.register("app.js", "");
        let store = VersionStore::new(
            VersionsConfig::default(),
            Arc::new(provider.clone()),
            Arc::new(renderer.clone()),
        );
        (store, provider, renderer, file_id)
    }

    fn delta(name: &str, content: &str, line: u32) -> SectionDelta {
        SectionDelta::new().modify(name, SectionData::new(content, line))
    }

    #[test]
    fn test_first_partial_creates_version_one() {
        let (mut store, provider, renderer, id) = setup();

        let snapshot = store
            .apply_partial_update(&id, "app.js", &delta("f", "X", 1))
            .unwrap();

        assert_eq!(snapshot.version(), 1);
        assert!(snapshot.metadata().is_original);
        assert_eq!(snapshot.metadata().change_count, 1);
        assert_eq!(store.current_content(&id).unwrap(), "X");
        assert_eq!(provider.current_content(&id).unwrap().content, "X");
        assert_eq!(
            renderer.events(),
            vec![RenderEvent::Created {
                file_id: id.clone(),
                version: 1,
                content: "X".to_string()
            }]
        );
    }

    #[test]
    fn test_first_partial_builds_on_live_content() {
        let provider = MemoryContentProvider::new();
        let id = provider.register("notes.md", "# Title");
        let mut store = VersionStore::new(
            VersionsConfig::default(),
            Arc::new(provider.clone()),
            Arc::new(NullRenderer),
        );

        let snapshot = store
            .apply_partial_update(&id, "notes.md", &SectionDelta::new().add("footer", SectionData::new("bye", 10)))
            .unwrap();

        assert_eq!(snapshot.sections().len(), 2);
        assert_eq!(snapshot.content(), "# Title\nbye");
        assert_eq!(provider.current_content(&id).unwrap().content, "# Title\nbye");
    }

    #[test]
    fn test_placeholder_bootstraps_from_raw_content() {
        let (mut store, _, _, id) = setup();
        let other = FileId::from_string("detached");

        assert!(store.handle_complete_file(&other, "lib.rs", Some("mod a;".to_string())));
        assert!(!store.handle_complete_file(&other, "lib.rs", Some("ignored".to_string())));
        assert_eq!(store.record(&other).unwrap().current_version(), None);

        let snapshot = store
            .apply_partial_update(&other, "lib.rs", &delta("b", "mod b;", 2))
            .unwrap();
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.content(), "mod a;\nmod b;");

        // The registered file is unaffected.
        assert!(store.record(&id).is_none());
    }

    #[test]
    fn test_handle_update_routes_partial_and_complete() {
        let (mut store, _, _, id) = setup();

        let outcome = store
            .handle_update(&id, &UpdateMessage::partial("app.js", delta("f", "X", 1)))
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Versioned(ref s) if s.version() == 1));

        let outcome = store
            .handle_update(&id, &UpdateMessage::complete("app.js", "whole"))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);
        assert_eq!(store.current_content(&id).unwrap(), "X");

        let unknown = FileId::from_string("unknown");
        let outcome = store
            .handle_update(&unknown, &UpdateMessage::partial("x.js", delta("f", "X", 1)))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Tracked);
        assert!(store.record(&unknown).unwrap().is_empty());
    }

    #[test]
    fn test_versions_are_numbered_after_latest() {
        let (mut store, _, _, id) = setup();
        for i in 1..=3 {
            store
                .apply_partial_update(&id, "app.js", &delta("f", &format!("v{i}"), 1))
                .unwrap();
        }

        store.switch_to_version(&id, 1).unwrap();
        let snapshot = store
            .apply_partial_update(&id, "app.js", &SectionDelta::new().add("g", SectionData::new("G", 2)))
            .unwrap();

        assert_eq!(snapshot.version(), 4);
        assert_eq!(snapshot.content(), "v1\nG");
        assert_eq!(store.get_version(&id, 3).unwrap().content(), "v3");
    }

    #[test]
    fn test_switch_to_missing_version_changes_nothing() {
        let (mut store, provider, renderer, id) = setup();
        store.apply_partial_update(&id, "app.js", &delta("f", "X", 1)).unwrap();

        let err = store.switch_to_version(&id, 9).unwrap_err();
        assert!(matches!(err, VersionError::VersionNotFound { version: 9, .. }));
        assert_eq!(store.record(&id).unwrap().current_version(), Some(1));
        assert_eq!(provider.current_content(&id).unwrap().content, "X");
        assert_eq!(renderer.events().len(), 1);

        let err = store
            .switch_to_version(&FileId::from_string("nope"), 1)
            .unwrap_err();
        assert!(matches!(err, VersionError::FileNotFound(_)));
    }

    #[test]
    fn test_stale_sequence_dropped() {
        let (mut store, _, _, id) = setup();
        let first = UpdateMessage::partial("app.js", delta("f", "X", 1)).with_sequence(5);
        store.handle_update(&id, &first).unwrap();

        let stale = UpdateMessage::partial("app.js", delta("f", "old", 1)).with_sequence(4);
        let err = store.handle_update(&id, &stale).unwrap_err();
        assert!(matches!(err, VersionError::StaleUpdate { sequence: 4, last: 5, .. }));
        assert_eq!(store.current_content(&id).unwrap(), "X");

        let next = UpdateMessage::partial("app.js", delta("f", "Y", 1)).with_sequence(6);
        store.handle_update(&id, &next).unwrap();
        assert_eq!(store.current_content(&id).unwrap(), "Y");
    }

    #[test]
    fn test_auto_cleanup() {
        let provider = MemoryContentProvider::new();
        let id = provider.register("a.txt", "");
        let config = VersionsConfig {
            keep_versions: 2,
            auto_cleanup: true,
            ..Default::default()
        };
        let mut store = VersionStore::new(config, Arc::new(provider), Arc::new(NullRenderer));

        for i in 1..=6 {
            store
                .apply_partial_update(&id, "a.txt", &delta("f", &i.to_string(), 1))
                .unwrap();
        }
        assert_eq!(store.record(&id).unwrap().version_numbers(), vec![1, 5, 6]);
    }

    #[test]
    fn test_cleanup_evicting_current_resyncs_live_content() {
        let (mut store, provider, renderer, id) = setup();
        for i in 1..=6 {
            store
                .apply_partial_update(&id, "app.js", &delta("f", &format!("v{i}"), 1))
                .unwrap();
        }
        store.switch_to_version(&id, 3).unwrap();
        assert_eq!(provider.current_content(&id).unwrap().content, "v3");

        assert_eq!(store.cleanup(&id, 2).unwrap(), 3);

        assert_eq!(store.record(&id).unwrap().current_version(), Some(6));
        assert_eq!(store.current_content(&id).unwrap(), "v6");
        assert_eq!(provider.current_content(&id).unwrap().content, "v6");
        assert_eq!(
            renderer.events().last(),
            Some(&RenderEvent::Switched {
                file_id: id.clone(),
                version: 6,
                content: "v6".to_string()
            })
        );
    }

    #[test]
    fn test_cleanup_default_uses_configured_retention() {
        let provider = MemoryContentProvider::new();
        let id = provider.register("a.txt", "");
        let config = VersionsConfig {
            keep_versions: 2,
            ..Default::default()
        };
        let mut store = VersionStore::new(config, Arc::new(provider), Arc::new(NullRenderer));
        for i in 1..=5 {
            store
                .apply_partial_update(&id, "a.txt", &delta("f", &i.to_string(), 1))
                .unwrap();
        }

        assert_eq!(store.cleanup_default(&id).unwrap(), 2);
        assert_eq!(store.record(&id).unwrap().version_numbers(), vec![1, 4, 5]);
    }

    #[test]
    fn test_cleanup_keeping_current_is_silent() {
        let (mut store, provider, renderer, id) = setup();
        for i in 1..=6 {
            store
                .apply_partial_update(&id, "app.js", &delta("f", &format!("v{i}"), 1))
                .unwrap();
        }
        store.switch_to_version(&id, 5).unwrap();
        let events = renderer.events().len();

        store.cleanup(&id, 2).unwrap();

        assert_eq!(store.record(&id).unwrap().current_version(), Some(5));
        assert_eq!(provider.current_content(&id).unwrap().content, "v5");
        assert_eq!(renderer.events().len(), events);
    }

    #[test]
    fn test_auto_cleanup_after_switching_back() {
        let provider = MemoryContentProvider::new();
        let id = provider.register("a.txt", "");
        let config = VersionsConfig {
            keep_versions: 1,
            auto_cleanup: true,
            ..Default::default()
        };
        let mut store = VersionStore::new(config, Arc::new(provider.clone()), Arc::new(NullRenderer));

        for i in 1..=3 {
            store
                .apply_partial_update(&id, "a.txt", &delta("f", &i.to_string(), 1))
                .unwrap();
        }
        assert_eq!(store.record(&id).unwrap().version_numbers(), vec![1, 3]);

        store.switch_to_version(&id, 1).unwrap();
        let snapshot = store
            .apply_partial_update(&id, "a.txt", &SectionDelta::new().add("g", SectionData::new("G", 2)))
            .unwrap();

        assert_eq!(snapshot.version(), 4);
        let record = store.record(&id).unwrap();
        assert_eq!(record.version_numbers(), vec![1, 4]);
        assert_eq!(record.current_version(), Some(4));
        assert_eq!(provider.current_content(&id).unwrap().content, "1\nG");
    }

    #[test]
    fn test_auto_cleanup_keep_zero_never_reuses_numbers() {
        let provider = MemoryContentProvider::new();
        let id = provider.register("a.txt", "");
        let config = VersionsConfig {
            keep_versions: 0,
            auto_cleanup: true,
            ..Default::default()
        };
        let mut store = VersionStore::new(config, Arc::new(provider.clone()), Arc::new(NullRenderer));

        let issued: Vec<u32> = (1..=3)
            .map(|i| {
                store
                    .apply_partial_update(&id, "a.txt", &delta("f", &i.to_string(), 1))
                    .unwrap()
                    .version()
            })
            .collect();

        assert_eq!(issued, vec![1, 2, 3]);
        assert_eq!(store.record(&id).unwrap().version_numbers(), vec![1]);
        assert_eq!(store.current_content(&id).unwrap(), "1");
        assert_eq!(provider.current_content(&id).unwrap().content, "1");
    }

    #[test]
    fn test_history_and_stats() {
        let (mut store, _, _, id) = setup();
        store.apply_partial_update(&id, "app.js", &delta("f", "X", 1)).unwrap();
        store
            .apply_partial_update(
                &id,
                "app.js",
                &delta("f", "X2", 1).add("g", SectionData::new("Y", 5)),
            )
            .unwrap();
        store.handle_complete_file(&FileId::from_string("other"), "b.js", None);

        let history = store.history(&id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].label, "v2 (2 changes)");
        assert!(history[0].current);
        assert_eq!(history[1].label, "v1 (Original)");
        assert!(!history[1].current);

        let stats = store.memory_stats();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_versions, 2);
        assert!((stats.average_versions_per_file - 1.0).abs() < f64::EPSILON);

        let exported = store.export_history(&id).unwrap();
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["metadata"]["change_count"], 2);

        store.clear();
        assert_eq!(store.memory_stats().total_files, 0);
    }

    #[test]
    fn test_show_diff_notifies_renderer() {
        let (mut store, _, renderer, id) = setup();
        store.apply_partial_update(&id, "app.js", &delta("f", "X", 1)).unwrap();
        assert!(store.show_diff(&id).is_err());

        store.apply_partial_update(&id, "app.js", &delta("f", "X2", 1)).unwrap();
        let diff = store.show_diff(&id).unwrap();
        assert_eq!((diff.old_text.as_str(), diff.new_text.as_str()), ("X", "X2"));
        assert!(matches!(renderer.events().last(), Some(RenderEvent::Diff { .. })));
    }

    #[test]
    fn test_collaborators_called_once_per_version() {
        let id = FileId::from_string("file_1");

        let mut provider = MockContentProvider::new();
        provider
            .expect_current_content()
            .return_const(None::<FileContent>);
        provider.expect_set_content().times(1).return_const(());

        let mut renderer = MockRendererSink::new();
        renderer.expect_on_version_created().times(1).return_const(());
        renderer.expect_on_version_switched().never();

        let mut store = VersionStore::new(
            VersionsConfig::default(),
            Arc::new(provider),
            Arc::new(renderer),
        );
        store.apply_partial_update(&id, "a.rs", &delta("f", "X", 1)).unwrap();
    }

    #[test]
    fn test_cleanup_unknown_file() {
        let (mut store, _, _, _) = setup();
        assert!(store
            .cleanup(&FileId::from_string("missing"), 5)
            .unwrap_err()
            .is_not_found());
        assert_eq!(store.cleanup_all(5), 0);
    }
}
