//! Streaming file version store.
//!
//! AI-generated files arrive in a chat as a complete file followed by partial
//! updates that only name the sections that changed. This crate turns those
//! deltas into an ordered history of immutable snapshots:
//! - Apply section deltas without touching earlier versions
//! - Reconstruct flat file content from sections
//! - Switch between retained versions and diff adjacent ones
//! - Bound memory with retention that always keeps the original
//!
//! # Example
//!
//! ```
//! use filever_versions::{
//!     MemoryContentProvider, NullRenderer, SectionData, SectionDelta, UpdateDispatcher,
//!     UpdateMessage, VersionStore, VersionsConfig,
//! };
//! use std::sync::Arc;
//!
//! let provider = MemoryContentProvider::new();
//! let file_id = provider.register("app.js", "");
//! let mut store = VersionStore::new(
//!     VersionsConfig::default(),
//!     Arc::new(provider.clone()),
//!     Arc::new(NullRenderer),
//! );
//!
//! let mut dispatcher = UpdateDispatcher::new();
//! let delta = SectionDelta::new().modify("f", SectionData::new("X", 1));
//! dispatcher.dispatch(&mut store, &UpdateMessage::partial("app.js", delta));
//!
//! assert_eq!(store.current_content(&file_id).unwrap(), "X");
//! ```

pub mod config;
mod diff;
mod dispatcher;
mod error;
mod message;
pub mod patch;
mod provider;
mod queue;
pub mod reconstruct;
mod section;
mod snapshot;
mod store;

pub use config::{ConfigError, VersionsConfig};
pub use diff::{DiffEngine, DiffStats, VersionDiff};
pub use dispatcher::{DispatchOutcome, DispatchStats, DropReason, UpdateDispatcher};
pub use error::{VersionError, VersionResult};
pub use message::{RawUpdateMessage, UpdateKind, UpdateMessage};
pub use provider::{
    ContentProvider, FileContent, MemoryContentProvider, NullRenderer, RecordingRenderer,
    RenderEvent, RendererSink,
};
pub use queue::UpdateQueue;
pub use reconstruct::reconstruct;
pub use section::{sections_from_content, SectionData, SectionDelta, SectionMap, MAIN_SECTION};
pub use snapshot::{
    summarize, ChangeEntry, ChangeKind, FileId, FileVersionRecord, VersionMetadata,
    VersionSnapshot,
};
pub use store::{MemoryStats, UpdateOutcome, VersionStore, VersionSummary};
