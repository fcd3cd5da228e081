//! Inbound update messages.
//!
//! The transport delivers loosely shaped JSON ([`RawUpdateMessage`]); it is
//! converted into the tagged [`UpdateMessage`] before anything is dispatched.

use crate::error::{VersionError, VersionResult};
use crate::section::{SectionDelta, SectionMap};
use serde::{Deserialize, Serialize};

/// Update message exactly as it arrives from the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUpdateMessage {
    #[serde(default)]
    pub filename: Option<String>,

    /// `"partial"` or `"complete"`; anything else counts as complete.
    #[serde(default)]
    pub update_type: Option<String>,

    #[serde(default)]
    pub sections_modified: Option<SectionMap>,

    #[serde(default)]
    pub sections_added: Option<SectionMap>,

    #[serde(default)]
    pub sections_removed: Option<Vec<String>>,

    #[serde(default)]
    pub content: Option<String>,

    /// Optional per-file monotonic sequence number.
    #[serde(default)]
    pub sequence: Option<u64>,
}

impl RawUpdateMessage {
    /// Parse a raw message from JSON.
    pub fn from_json(json: &str) -> VersionResult<Self> {
        serde_json::from_str(json).map_err(|e| VersionError::InvalidMessage(e.to_string()))
    }
}

/// What an update carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    /// Only the sections that changed.
    Partial(SectionDelta),
    /// The full file content.
    Complete { content: String },
}

/// A validated update for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMessage {
    pub filename: String,
    pub kind: UpdateKind,
    pub sequence: Option<u64>,
}

impl UpdateMessage {
    pub fn partial(filename: impl Into<String>, delta: SectionDelta) -> Self {
        Self {
            filename: filename.into(),
            kind: UpdateKind::Partial(delta),
            sequence: None,
        }
    }

    pub fn complete(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            kind: UpdateKind::Complete {
                content: content.into(),
            },
            sequence: None,
        }
    }

    /// Attach a per-file sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.kind, UpdateKind::Partial(_))
    }
}

impl TryFrom<RawUpdateMessage> for UpdateMessage {
    type Error = VersionError;

    fn try_from(raw: RawUpdateMessage) -> VersionResult<Self> {
        let filename = match raw.filename {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(VersionError::MissingIdentifier),
        };

        let kind = if raw.update_type.as_deref() == Some("partial") {
            // A partial message with none of the three fields is an empty delta.
            UpdateKind::Partial(SectionDelta {
                modified: raw.sections_modified.unwrap_or_default(),
                added: raw.sections_added.unwrap_or_default(),
                removed: raw
                    .sections_removed
                    .unwrap_or_default()
                    .into_iter()
                    .collect(),
            })
        } else {
            UpdateKind::Complete {
                content: raw.content.unwrap_or_default(),
            }
        };

        Ok(Self {
            filename,
            kind,
            sequence: raw.sequence,
        })
    }
}

impl std::str::FromStr for UpdateMessage {
    type Err = VersionError;

    fn from_str(json: &str) -> VersionResult<Self> {
        RawUpdateMessage::from_json(json)?.try_into()
    }
}
