use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Revision;

pub const LABEL_UNSAVED: &str = "Unsaved changes";
pub const LABEL_SAVING: &str = "Saving...";
pub const LABEL_SAVED: &str = "All changes saved";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    Clean,
    DirtyPending,
    Saving,
    SaveFailed(String),
}

impl SaveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveState::Clean => "clean",
            SaveState::DirtyPending => "dirty_pending",
            SaveState::Saving => "saving",
            SaveState::SaveFailed(_) => "save_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveEvent {
    Edited {
        revision: Revision,
    },
    SaveStarted {
        revision: Revision,
    },
    SaveSucceeded {
        revision: Revision,
        saved_at: Option<DateTime<Utc>>,
    },
    SaveFailed {
        revision: Revision,
        message: String,
    },
}

/// Folds edit and save events into the status shown to the user.
///
/// Revisions are the session's monotonically increasing edit counter. A save
/// is only known to cover the revision it was dispatched with, so the tracker
/// never reports clean while `latest_revision > last_saved_revision`.
#[derive(Debug, Clone)]
pub struct SaveTracker {
    state: SaveState,
    latest_revision: Revision,
    last_saved_revision: Revision,
    in_flight: Option<Revision>,
    last_saved_at: Option<DateTime<Utc>>,
}

/// Serializable view of the tracker for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SaveStatus {
    pub state: &'static str,
    pub error: Option<String>,
    pub label: String,
    pub revision: Revision,
    pub last_saved_revision: Revision,
    pub saving: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl SaveTracker {
    /// A freshly loaded document at `revision` is clean.
    pub fn new(revision: Revision) -> Self {
        Self {
            state: SaveState::Clean,
            latest_revision: revision,
            last_saved_revision: revision,
            in_flight: None,
            last_saved_at: None,
        }
    }

    pub fn apply(&mut self, event: SaveEvent) {
        match event {
            SaveEvent::Edited { revision } => {
                self.latest_revision = self.latest_revision.max(revision);
                self.state = SaveState::DirtyPending;
            }
            SaveEvent::SaveStarted { revision } => {
                self.in_flight = Some(revision);
                self.state = SaveState::Saving;
            }
            SaveEvent::SaveSucceeded { revision, saved_at } => {
                self.in_flight = None;
                if revision >= self.last_saved_revision {
                    self.last_saved_revision = revision;
                    self.last_saved_at = saved_at.or(self.last_saved_at);
                }
                self.state = if self.has_unsaved_changes() {
                    SaveState::DirtyPending
                } else {
                    SaveState::Clean
                };
            }
            SaveEvent::SaveFailed { message, .. } => {
                self.in_flight = None;
                self.state = SaveState::SaveFailed(message);
            }
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &SaveState {
        &self.state
    }

    pub fn label(&self) -> &str {
        match &self.state {
            SaveState::Clean => LABEL_SAVED,
            SaveState::DirtyPending => LABEL_UNSAVED,
            SaveState::Saving => LABEL_SAVING,
            SaveState::SaveFailed(message) => message,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.latest_revision > self.last_saved_revision
    }

    #[cfg(test)]
    pub fn latest_revision(&self) -> Revision {
        self.latest_revision
    }

    #[cfg(test)]
    pub fn last_saved_revision(&self) -> Revision {
        self.last_saved_revision
    }

    pub fn status(&self) -> SaveStatus {
        SaveStatus {
            state: self.state.as_str(),
            error: match &self.state {
                SaveState::SaveFailed(message) => Some(message.clone()),
                _ => None,
            },
            label: self.label().to_string(),
            revision: self.latest_revision,
            last_saved_revision: self.last_saved_revision,
            saving: self.in_flight.is_some(),
            last_saved_at: self.last_saved_at,
        }
    }
}
