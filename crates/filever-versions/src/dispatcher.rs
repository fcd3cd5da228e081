//! Routing inbound update messages to the version store.
//!
//! Every failure is handled here: the transport only ever sees a
//! [`DispatchOutcome`], never an error.

use crate::error::VersionError;
use crate::message::{RawUpdateMessage, UpdateMessage};
use crate::snapshot::FileId;
use crate::store::{UpdateOutcome, VersionStore};
use serde::Serialize;
use tracing::{debug, warn};

/// Why a message did not reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The message had no filename.
    MissingIdentifier,
    /// The payload was not a valid update message.
    Invalid(String),
    /// No file with this name is known to the content provider.
    UnknownFile(String),
    /// The message was older than one already applied.
    Stale { sequence: u64, last: u64 },
    /// The store rejected the update.
    Failed(String),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentifier => write!(f, "missing filename"),
            Self::Invalid(message) => write!(f, "invalid message: {message}"),
            Self::UnknownFile(name) => write!(f, "unknown file: {name}"),
            Self::Stale { sequence, last } => {
                write!(f, "stale update: sequence {sequence} <= {last}")
            }
            Self::Failed(message) => write!(f, "update failed: {message}"),
        }
    }
}

impl From<VersionError> for DropReason {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::MissingIdentifier => Self::MissingIdentifier,
            VersionError::InvalidMessage(message) => Self::Invalid(message),
            VersionError::StaleUpdate { sequence, last, .. } => Self::Stale { sequence, last },
            other => Self::Failed(other.to_string()),
        }
    }
}

/// Result of dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A new version was created.
    Versioned { file_id: FileId, version: u32 },
    /// The file is now tracked but has no versions yet.
    Tracked { file_id: FileId },
    /// The message was accepted without changing history.
    Unchanged { file_id: FileId },
    /// The message was dropped.
    Dropped(DropReason),
}

impl DispatchOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped(_))
    }

    pub fn version(&self) -> Option<u32> {
        match self {
            Self::Versioned { version, .. } => Some(*version),
            _ => None,
        }
    }
}

/// Counters kept by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub received: u64,
    pub versioned: u64,
    pub tracked: u64,
    pub unchanged: u64,
    pub dropped: u64,
}

/// Classifies update messages and hands them to a [`VersionStore`].
#[derive(Debug, Default)]
pub struct UpdateDispatcher {
    stats: DispatchStats,
}

impl UpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Dispatch a JSON payload from the transport.
    pub fn dispatch_json(&mut self, store: &mut VersionStore, json: &str) -> DispatchOutcome {
        match RawUpdateMessage::from_json(json) {
            Ok(raw) => self.dispatch_raw(store, raw),
            Err(e) => {
                self.stats.received += 1;
                self.drop_message(e.into())
            }
        }
    }

    /// Dispatch a loosely shaped message.
    pub fn dispatch_raw(&mut self, store: &mut VersionStore, raw: RawUpdateMessage) -> DispatchOutcome {
        match UpdateMessage::try_from(raw) {
            Ok(message) => self.dispatch(store, &message),
            Err(e) => {
                self.stats.received += 1;
                self.drop_message(e.into())
            }
        }
    }

    /// Locate the target file and apply the update.
    pub fn dispatch(&mut self, store: &mut VersionStore, message: &UpdateMessage) -> DispatchOutcome {
        self.stats.received += 1;
        debug!(
            filename = %message.filename,
            partial = message.is_partial(),
            "Handling file update"
        );

        let Some(file_id) = store.provider().find_file(&message.filename) else {
            return self.drop_message(DropReason::UnknownFile(message.filename.clone()));
        };

        match store.handle_update(&file_id, message) {
            Ok(UpdateOutcome::Versioned(snapshot)) => {
                self.stats.versioned += 1;
                DispatchOutcome::Versioned {
                    file_id,
                    version: snapshot.version(),
                }
            }
            Ok(UpdateOutcome::Tracked) => {
                self.stats.tracked += 1;
                DispatchOutcome::Tracked { file_id }
            }
            Ok(UpdateOutcome::Unchanged) => {
                self.stats.unchanged += 1;
                DispatchOutcome::Unchanged { file_id }
            }
            Err(e) => self.drop_message(e.into()),
        }
    }

    fn drop_message(&mut self, reason: DropReason) -> DispatchOutcome {
        self.stats.dropped += 1;
        warn!("Dropping file update: {}", reason);
        DispatchOutcome::Dropped(reason)
    }
}
