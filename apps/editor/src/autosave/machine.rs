//! Debounce and single-flight state machine for document persistence.
//!
//! Pure: no timers, no I/O. Callers pass the current instant in and get back
//! the save to dispatch, if any. The async driver lives in
//! [`super::worker`].
//!
//! ```text
//! Idle --schedule--> Armed --deadline | flush--> Sending
//!                    ^   |                        |
//!                    +---+ schedule               +--complete--> Idle
//!                                                 +--complete, newer edit--> Armed
//!                                                 +--complete, resend pending--> Sending
//! ```
//!
//! While `Sending`, new edits keep their own debounce deadline. When that
//! deadline passes, or a manual flush arrives, the machine only records that
//! a resend is pending; the resend is dispatched once the in-flight call
//! resolves, carrying whatever snapshot is newest at that moment.

use std::time::Duration;

use tokio::time::Instant;

use super::{EditIntent, Revision, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Armed {
        deadline: Instant,
    },
    Sending {
        in_flight: Revision,
        /// Debounce deadline of edits made after the in-flight dispatch.
        deadline: Option<Instant>,
        resend_pending: bool,
    },
}

/// A persistence attempt the driver must start now.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub snapshot: Snapshot,
    /// Edits coalesced into this attempt, oldest first.
    pub intents: Vec<EditIntent>,
}

#[derive(Debug)]
pub struct AutosaveMachine {
    delay: Duration,
    phase: Phase,
    latest: Option<Snapshot>,
    intents: Vec<EditIntent>,
}

impl AutosaveMachine {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            phase: Phase::Idle,
            latest: None,
            intents: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn latest_revision(&self) -> Option<Revision> {
        self.latest.as_ref().map(|s| s.revision)
    }

    /// Instant at which [`poll_timer`](Self::poll_timer) has work to do.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Idle => None,
            Phase::Armed { deadline } => Some(deadline),
            Phase::Sending { deadline, .. } => deadline,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Records an edit and restarts the quiet-period timer.
    pub fn schedule(&mut self, snapshot: Snapshot, intent: EditIntent, now: Instant) {
        self.observe(snapshot);
        self.intents.push(intent);
        let deadline = now + self.delay;
        self.phase = match self.phase {
            Phase::Idle | Phase::Armed { .. } => Phase::Armed { deadline },
            Phase::Sending {
                in_flight,
                resend_pending,
                ..
            } => Phase::Sending {
                in_flight,
                // A queued resend already carries the newest snapshot.
                deadline: (!resend_pending).then_some(deadline),
                resend_pending,
            },
        };
    }

    /// Cancels any pending timer and dispatches `snapshot` immediately, or
    /// queues a resend when a call is already in flight.
    pub fn flush_now(&mut self, snapshot: Snapshot) -> Option<Dispatch> {
        self.observe(snapshot);
        match self.phase {
            Phase::Idle | Phase::Armed { .. } => self.dispatch(),
            Phase::Sending { in_flight, .. } => {
                self.phase = Phase::Sending {
                    in_flight,
                    deadline: None,
                    resend_pending: true,
                };
                None
            }
        }
    }

    /// Fires the debounce timer if its deadline has passed.
    pub fn poll_timer(&mut self, now: Instant) -> Option<Dispatch> {
        match self.phase {
            Phase::Armed { deadline } if now >= deadline => self.dispatch(),
            Phase::Sending {
                in_flight,
                deadline: Some(deadline),
                ..
            } if now >= deadline => {
                self.phase = Phase::Sending {
                    in_flight,
                    deadline: None,
                    resend_pending: true,
                };
                None
            }
            _ => None,
        }
    }

    /// The in-flight call resolved, successfully or not.
    ///
    /// A failed call is never retried here. A resend is only dispatched when
    /// something newer than the in-flight snapshot was requested after it
    /// left.
    pub fn complete(&mut self) -> Option<Dispatch> {
        let Phase::Sending {
            in_flight,
            deadline,
            resend_pending,
        } = self.phase
        else {
            return None;
        };

        let newer = self.latest_revision().is_some_and(|r| r > in_flight);
        if resend_pending && newer {
            return self.dispatch();
        }
        self.phase = match deadline {
            Some(deadline) if newer => Phase::Armed { deadline },
            _ => Phase::Idle,
        };
        None
    }

    /// Keeps the newest snapshot; an older one arriving late is ignored.
    fn observe(&mut self, snapshot: Snapshot) {
        let stale = self
            .latest
            .as_ref()
            .is_some_and(|current| current.revision > snapshot.revision);
        if !stale {
            self.latest = Some(snapshot);
        }
    }

    fn dispatch(&mut self) -> Option<Dispatch> {
        let snapshot = self.latest.clone()?;
        self.phase = Phase::Sending {
            in_flight: snapshot.revision,
            deadline: None,
            resend_pending: false,
        };
        Some(Dispatch {
            snapshot,
            intents: std::mem::take(&mut self.intents),
        })
    }
}
