//! Async driver for [`AutosaveMachine`].
//!
//! One task per editing session owns the machine, the debounce timer and the
//! single in-flight gateway call. Edits reach it over a command channel in
//! the order they were applied; gateway results come back over a second
//! channel, so every state transition happens on the worker task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::machine::{AutosaveMachine, Dispatch};
use super::{
    EditIntent, EditTarget, Notification, Revision, SaveError, SaveEvent, SaveStatus,
    SaveTracker, Snapshot,
};
use crate::gateway::{DocumentGateway, GatewayError};
use crate::models::resume::parse_timestamp;
use crate::models::{Document, DocumentId};

const NOTIFICATION_CAPACITY: usize = 32;
pub const SAVED_MESSAGE: &str = "Resume saved successfully";

enum Command {
    Schedule {
        snapshot: Snapshot,
        intent: EditIntent,
    },
    Flush {
        snapshot: Snapshot,
        reply: oneshot::Sender<Result<Revision, SaveError>>,
    },
    Close {
        snapshot: Snapshot,
        reply: oneshot::Sender<Result<(), SaveError>>,
    },
}

enum Reply {
    Save(oneshot::Sender<Result<Revision, SaveError>>),
    Close(oneshot::Sender<Result<(), SaveError>>),
}

/// Someone waiting for a save that covers `revision`.
struct Waiter {
    revision: Revision,
    reply: Reply,
}

struct Completion {
    revision: Revision,
    result: Result<Document, GatewayError>,
}

/// Session-side handle to the autosave worker.
///
/// Dropping the handle without [`close`](Self::close) still flushes pending
/// edits: the worker sees the command channel close and sends whatever is
/// unsaved before exiting.
pub struct AutosaveHandle {
    commands: mpsc::UnboundedSender<Command>,
    tracker: Arc<watch::Sender<SaveTracker>>,
    notifications: broadcast::Sender<Notification>,
    task: Option<JoinHandle<()>>,
}

/// A manual save that has been handed to the worker.
pub struct PendingSave {
    reply: oneshot::Receiver<Result<Revision, SaveError>>,
    notifications: broadcast::Sender<Notification>,
}

impl PendingSave {
    /// Resolves once a save covering the requested revision has completed.
    pub async fn wait(self) -> Result<Revision, SaveError> {
        let revision = self.reply.await.map_err(|_| SaveError::Closed)??;
        let _ = self.notifications.send(Notification::success(SAVED_MESSAGE));
        Ok(revision)
    }
}

/// Starts the autosave worker for one document.
///
/// `revision` is the revision of the document as loaded; it starts clean.
pub fn spawn_worker(
    document_id: DocumentId,
    gateway: Arc<dyn DocumentGateway>,
    delay: Duration,
    revision: Revision,
) -> AutosaveHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (completions_tx, completions_rx) = mpsc::unbounded_channel();
    let (tracker, _) = watch::channel(SaveTracker::new(revision));
    let tracker = Arc::new(tracker);
    let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

    let worker = Worker {
        document_id,
        gateway,
        machine: AutosaveMachine::new(delay),
        tracker: tracker.clone(),
        notifications: notifications.clone(),
        commands: commands_rx,
        completions_tx,
        completions: completions_rx,
        waiters: Vec::new(),
        detached: false,
        finished: false,
    };
    let task = tokio::spawn(worker.run());

    AutosaveHandle {
        commands: commands_tx,
        tracker,
        notifications,
        task: Some(task),
    }
}

impl AutosaveHandle {
    /// Marks the tracker dirty and restarts the debounce timer.
    pub fn record_edit(&self, snapshot: Snapshot, target: EditTarget) -> Result<(), SaveError> {
        let revision = snapshot.revision;
        self.tracker
            .send_modify(|t| t.apply(SaveEvent::Edited { revision }));
        let intent = EditIntent {
            target,
            revision,
            at: Instant::now(),
        };
        self.commands
            .send(Command::Schedule { snapshot, intent })
            .map_err(|_| SaveError::Closed)
    }

    /// Bypasses the debounce timer. The returned [`PendingSave`] can be
    /// awaited without holding on to the session.
    pub fn request_save(&self, snapshot: Snapshot) -> Result<PendingSave, SaveError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Flush { snapshot, reply })
            .map_err(|_| SaveError::Closed)?;
        Ok(PendingSave {
            reply: rx,
            notifications: self.notifications.clone(),
        })
    }

    /// Flushes unsaved edits and stops the worker.
    ///
    /// On failure the worker keeps running, so the caller still owns the
    /// unsaved edits and may retry.
    pub async fn close(&mut self, snapshot: Snapshot) -> Result<(), SaveError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Close { snapshot, reply })
            .map_err(|_| SaveError::Closed)?;
        rx.await.map_err(|_| SaveError::Closed)??;

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Autosave worker ended abnormally: {e}");
            }
        }
        Ok(())
    }

    pub fn status(&self) -> SaveStatus {
        self.tracker.borrow().status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveTracker> {
        self.tracker.subscribe()
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }
}

struct Worker {
    document_id: DocumentId,
    gateway: Arc<dyn DocumentGateway>,
    machine: AutosaveMachine,
    tracker: Arc<watch::Sender<SaveTracker>>,
    notifications: broadcast::Sender<Notification>,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    waiters: Vec<Waiter>,
    /// The handle was dropped; flush and exit.
    detached: bool,
    /// An explicit close succeeded.
    finished: bool,
}

impl Worker {
    async fn run(mut self) {
        debug!("Autosave worker started for resume {}", self.document_id);
        loop {
            let deadline = self.machine.deadline();
            tokio::select! {
                command = self.commands.recv(), if !self.detached => match command {
                    Some(command) => self.handle(command),
                    None => self.detach(),
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(dispatch) = self.machine.poll_timer(Instant::now()) {
                        self.dispatch(dispatch);
                    }
                }
                Some(completion) = self.completions.recv() => self.complete(completion),
            }

            if self.finished || (self.detached && self.machine.is_idle()) {
                break;
            }
        }
        debug!("Autosave worker stopped for resume {}", self.document_id);
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Schedule { snapshot, intent } => {
                self.machine.schedule(snapshot, intent, Instant::now());
            }
            Command::Flush { snapshot, reply } => {
                self.waiters.push(Waiter {
                    revision: snapshot.revision,
                    reply: Reply::Save(reply),
                });
                if let Some(dispatch) = self.machine.flush_now(snapshot) {
                    self.dispatch(dispatch);
                }
            }
            Command::Close { snapshot, reply } => {
                if !self.tracker.borrow().has_unsaved_changes() && self.machine.is_idle() {
                    let _ = reply.send(Ok(()));
                    self.finished = true;
                    return;
                }
                info!(
                    "Closing editor for resume {}; flushing revision {}",
                    self.document_id, snapshot.revision
                );
                self.waiters.push(Waiter {
                    revision: snapshot.revision,
                    reply: Reply::Close(reply),
                });
                if let Some(dispatch) = self.machine.flush_now(snapshot) {
                    self.dispatch(dispatch);
                }
            }
        }
    }

    fn detach(&mut self) {
        self.detached = true;
        if !self.tracker.borrow().has_unsaved_changes() {
            return;
        }
        let Some(snapshot) = self.machine.latest().cloned() else {
            return;
        };
        info!(
            "Editor for resume {} dropped with unsaved edits; flushing revision {}",
            self.document_id, snapshot.revision
        );
        if let Some(dispatch) = self.machine.flush_now(snapshot) {
            self.dispatch(dispatch);
        }
    }

    fn dispatch(&mut self, dispatch: Dispatch) {
        let Dispatch { snapshot, intents } = dispatch;
        let revision = snapshot.revision;

        let mut targets: Vec<&'static str> = intents
            .iter()
            .map(|i| match i.target {
                EditTarget::Section(name) => name.as_str(),
                EditTarget::Title => "title",
            })
            .collect();
        targets.sort_unstable();
        targets.dedup();
        let waited = intents
            .first()
            .map(|i| i.at.elapsed().as_millis())
            .unwrap_or_default();
        let first = intents.first().map_or(revision, |i| i.revision);
        info!(
            "Saving resume {} at revision {revision} ({} edits since revision {first} to [{}], oldest {waited}ms ago)",
            self.document_id,
            intents.len(),
            targets.join(", ")
        );

        self.tracker
            .send_modify(|t| t.apply(SaveEvent::SaveStarted { revision }));

        let gateway = self.gateway.clone();
        let document_id = self.document_id.clone();
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = gateway
                .update_document(&document_id, &snapshot.document)
                .await;
            let _ = completions.send(Completion { revision, result });
        });
    }

    fn complete(&mut self, completion: Completion) {
        let Completion { revision, result } = completion;
        let outcome = match result {
            Ok(saved) => {
                debug!("Saved resume {} at revision {revision}", self.document_id);
                self.tracker.send_modify(|t| {
                    t.apply(SaveEvent::SaveSucceeded {
                        revision,
                        saved_at: saved.updated_at.as_deref().and_then(parse_timestamp),
                    })
                });
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Saving resume {} at revision {revision} failed: {e}",
                    self.document_id
                );
                let error = SaveError::Failed {
                    message: e.to_string(),
                    fatal: e.is_fatal(),
                };
                let message = error.to_string();
                let _ = self
                    .notifications
                    .send(Notification::error(message.clone(), e.is_fatal()));
                self.tracker
                    .send_modify(|t| t.apply(SaveEvent::SaveFailed { revision, message }));
                Err(error)
            }
        };

        self.resolve_waiters(revision, outcome);

        if let Some(dispatch) = self.machine.complete() {
            self.dispatch(dispatch);
        }
        debug!(
            "Autosave for resume {} now {:?}",
            self.document_id,
            self.machine.phase()
        );
    }

    fn resolve_waiters(&mut self, revision: Revision, outcome: Result<(), SaveError>) {
        let (ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.waiters)
            .into_iter()
            .partition(|w| w.revision <= revision);
        self.waiters = pending;

        for waiter in ready {
            match waiter.reply {
                Reply::Save(reply) => {
                    let _ = reply.send(outcome.clone().map(|_| revision));
                }
                Reply::Close(reply) => {
                    if outcome.is_ok() {
                        self.finished = true;
                    }
                    let _ = reply.send(outcome.clone());
                }
            }
        }
    }
}
