// Autosave engine: debounce + single-flight persistence and save-state tracking.
// The state machine and tracker are pure; only the worker touches timers and the gateway.

pub mod machine;
pub mod tracker;
pub mod worker;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::models::{Document, SectionName};

pub use tracker::{SaveEvent, SaveStatus, SaveTracker};
pub use worker::{spawn_worker, AutosaveHandle, PendingSave};

/// Session-local edit counter. Revision 0 is the document as loaded.
pub type Revision = u64;

/// The full document captured at one revision for persisting.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub revision: Revision,
    pub document: Arc<Document>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Section(SectionName),
    Title,
}

/// A change not yet handed to the gateway.
#[derive(Debug, Clone)]
pub struct EditIntent {
    pub target: EditTarget,
    pub revision: Revision,
    pub at: Instant,
}

#[derive(Debug, Clone, Error)]
pub enum SaveError {
    #[error("Failed to save changes: {message}")]
    Failed { message: String, fatal: bool },

    #[error("Editor session is closed")]
    Closed,
}

impl SaveError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SaveError::Failed { fatal: true, .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient user-facing message. Never stored in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// The session cannot continue (e.g. expired credentials).
    pub fatal: bool,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            fatal: false,
        }
    }

    pub fn error(message: impl Into<String>, fatal: bool) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            fatal,
        }
    }
}
