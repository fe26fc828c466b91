use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::info;
use uuid::Uuid;

use crate::autosave::{
    spawn_worker, AutosaveHandle, EditTarget, Notification, PendingSave, Revision, SaveError,
    SaveStatus, SaveTracker, Snapshot,
};
use crate::editor::validation::{validate_section, validate_title, SectionError};
use crate::gateway::{DocumentGateway, GatewayError};
use crate::models::{Document, DocumentId, SectionValue};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Invalid(#[from] SectionError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

/// What an editing session needs from its surroundings, passed in
/// explicitly rather than read from globals.
#[derive(Clone)]
pub struct EditorContext {
    pub gateway: Arc<dyn DocumentGateway>,
    pub debounce: Duration,
}

/// One open document: the in-memory copy, its revision counter and the
/// autosave worker persisting it.
pub struct EditorSession {
    session_id: Uuid,
    document: Arc<Document>,
    revision: Revision,
    autosave: AutosaveHandle,
}

impl EditorSession {
    /// Loads `id` from the gateway and starts autosaving it.
    pub async fn open(ctx: &EditorContext, id: &DocumentId) -> Result<Self, EditorError> {
        let document = ctx.gateway.get_document(id).await?;
        Ok(Self::start(ctx, document))
    }

    /// Starts a session over an already loaded document.
    pub fn start(ctx: &EditorContext, document: Document) -> Self {
        let session_id = Uuid::new_v4();
        info!(
            "Opened editor session {session_id} for resume {} ({})",
            document.id, document.title
        );
        let autosave = spawn_worker(document.id.clone(), ctx.gateway.clone(), ctx.debounce, 0);
        Self {
            session_id,
            document: Arc::new(document),
            revision: 0,
            autosave,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document.id
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Validates a whole-section replacement and applies it.
    pub fn edit_section(&mut self, value: SectionValue) -> Result<Revision, EditorError> {
        let value = validate_section(value)?;
        Ok(self.apply_edit(value)?)
    }

    /// Applies an already validated section value and schedules a save.
    pub fn apply_edit(&mut self, value: SectionValue) -> Result<Revision, SaveError> {
        let target = EditTarget::Section(value.name());
        let next = self.document.apply(value);
        self.commit(next, target)
    }

    pub fn rename(&mut self, title: &str) -> Result<Revision, EditorError> {
        let title = validate_title(title)?;
        let next = self.document.retitle(title);
        Ok(self.commit(next, EditTarget::Title)?)
    }

    /// Hands the current snapshot to the worker, skipping the debounce.
    pub fn request_save(&self) -> Result<PendingSave, SaveError> {
        self.autosave.request_save(self.snapshot())
    }

    /// Flushes unsaved edits and stops autosaving. The session stays usable
    /// if the flush fails.
    pub async fn close(&mut self) -> Result<(), SaveError> {
        let snapshot = self.snapshot();
        self.autosave.close(snapshot).await?;
        info!(
            "Closed editor session {} for resume {}",
            self.session_id, self.document.id
        );
        Ok(())
    }

    pub fn status(&self) -> SaveStatus {
        self.autosave.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveTracker> {
        self.autosave.subscribe_status()
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.autosave.subscribe_notifications()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            document: self.document.clone(),
        }
    }

    fn commit(&mut self, next: Document, target: EditTarget) -> Result<Revision, SaveError> {
        self.document = Arc::new(next);
        self.revision += 1;
        self.autosave.record_edit(self.snapshot(), target)?;
        Ok(self.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::tracker::SaveState;
    use crate::autosave::NotificationLevel;
    use crate::gateway::testing::RecordingGateway;
    use crate::models::resume::{sample_document, ContactInfo, ProfileInfo, Skill};
    use tokio::time::{sleep, Instant};

    const DEBOUNCE: Duration = Duration::from_millis(1500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    async fn open_session() -> (Arc<RecordingGateway>, EditorSession) {
        let gateway = Arc::new(RecordingGateway::with_document(sample_document("r1")));
        let ctx = EditorContext {
            gateway: gateway.clone(),
            debounce: DEBOUNCE,
        };
        let session = EditorSession::open(&ctx, &DocumentId::from("r1"))
            .await
            .unwrap();
        (gateway, session)
    }

    async fn save_now(session: &EditorSession) -> Result<Revision, SaveError> {
        session.request_save()?.wait().await
    }

    fn state(session: &EditorSession) -> SaveState {
        session.subscribe_status().borrow().state().clone()
    }

    fn profile(name: &str) -> SectionValue {
        SectionValue::Profile(ProfileInfo {
            full_name: name.to_string(),
            designation: "Engineer".to_string(),
            summary: String::new(),
            profile_preview_url: None,
        })
    }

    fn contact(email: &str) -> SectionValue {
        SectionValue::Contact(ContactInfo {
            email: email.to_string(),
            ..Default::default()
        })
    }

    fn skills(n: u8) -> SectionValue {
        SectionValue::Skills(vec![Skill {
            name: "Rust".to_string(),
            progress: f64::from(n),
        }])
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_missing_document_is_not_found() {
        let gateway = Arc::new(RecordingGateway::default());
        let ctx = EditorContext {
            gateway,
            debounce: DEBOUNCE,
        };
        let err = EditorSession::open(&ctx, &DocumentId::from("nope"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, EditorError::Gateway(GatewayError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_edits_in_window_save_once_with_both() {
        let (gateway, mut session) = open_session().await;
        let t0 = Instant::now();
        assert_eq!(state(&session), SaveState::Clean);

        session.apply_edit(profile("Ada King")).unwrap();
        assert_eq!(state(&session), SaveState::DirtyPending);

        sleep(ms(200)).await;
        session.apply_edit(contact("ada@engines.org")).unwrap();
        assert_eq!(state(&session), SaveState::DirtyPending);

        gateway.set_latency(ms(100));
        sleep(ms(1450)).await;
        assert_eq!(gateway.update_count(), 0);

        sleep(ms(100)).await;
        assert_eq!(state(&session), SaveState::Saving);
        let updates = gateway.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].at - t0, ms(1700));
        assert_eq!(updates[0].document.profile_info.full_name, "Ada King");
        assert_eq!(updates[0].document.contact_info.email, "ada@engines.org");

        sleep(ms(200)).await;
        assert_eq!(state(&session), SaveState::Clean);
        assert_eq!(session.status().label, "All changes saved");
        assert_eq!(gateway.update_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_n_edits_carry_latest_snapshot() {
        let (gateway, mut session) = open_session().await;
        for n in 1..=10 {
            session.apply_edit(skills(n * 5)).unwrap();
            sleep(ms(100)).await;
        }
        sleep(ms(3000)).await;

        let updates = gateway.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].document.skill[0].progress, 50.0);
        assert_eq!(state(&session), SaveState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_during_flight_sends_exactly_one_more() {
        let (gateway, mut session) = open_session().await;
        gateway.set_latency(ms(3000));

        session.apply_edit(skills(10)).unwrap();
        sleep(ms(1600)).await;
        assert_eq!(gateway.update_count(), 1);

        // Quiet period elapses while the first call is still in flight.
        session.apply_edit(skills(20)).unwrap();
        sleep(ms(100)).await;
        session.apply_edit(skills(30)).unwrap();
        sleep(ms(2000)).await;
        assert_eq!(gateway.update_count(), 1);
        assert_eq!(state(&session), SaveState::DirtyPending);

        // First call resolves at 4500; the resend goes out immediately.
        sleep(ms(900)).await;
        let updates = gateway.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].document.skill[0].progress, 30.0);
        assert_eq!(updates[1].at - updates[0].at, ms(3000));

        sleep(ms(10_000)).await;
        assert_eq!(gateway.update_count(), 2);
        assert_eq!(gateway.max_in_flight(), 1);
        assert_eq!(state(&session), SaveState::Clean);
        let stored = gateway.stored(session.document_id()).unwrap();
        assert_eq!(stored.skill[0].progress, 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_saved_while_newer_edit_unflushed() {
        let (gateway, mut session) = open_session().await;
        gateway.set_latency(ms(500));

        session.apply_edit(skills(10)).unwrap();
        sleep(ms(1600)).await;
        assert_eq!(state(&session), SaveState::Saving);

        session.apply_edit(skills(20)).unwrap();
        sleep(ms(500)).await;
        // The first save resolved but does not include revision 2.
        assert_eq!(state(&session), SaveState::DirtyPending);
        assert_ne!(session.status().label, "All changes saved");

        sleep(ms(2000)).await;
        assert_eq!(state(&session), SaveState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_save_cancels_timer() {
        let (gateway, mut session) = open_session().await;
        let mut notifications = session.subscribe_notifications();
        let t0 = Instant::now();

        session.apply_edit(profile("Ada")).unwrap();
        sleep(ms(500)).await;
        let revision = save_now(&session).await.unwrap();
        assert_eq!(revision, 1);

        let updates = gateway.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].at - t0, ms(500));
        assert_eq!(state(&session), SaveState::Clean);

        sleep(ms(5000)).await;
        assert_eq!(gateway.update_count(), 1);

        let notification = notifications.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Success);
        assert_eq!(notification.message, "Resume saved successfully");
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_save_during_flight_waits_for_resend() {
        let (gateway, mut session) = open_session().await;
        gateway.set_latency(ms(1000));

        session.apply_edit(skills(10)).unwrap();
        sleep(ms(1600)).await;
        session.apply_edit(skills(20)).unwrap();

        let revision = save_now(&session).await.unwrap();
        assert_eq!(revision, 2);
        let updates = gateway.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].document.skill[0].progress, 20.0);
        assert_eq!(gateway.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_leaves_save_failed_until_next_edit() {
        let (gateway, mut session) = open_session().await;
        let mut notifications = session.subscribe_notifications();
        gateway.fail_next_update(GatewayError::Timeout);

        session.apply_edit(skills(10)).unwrap();
        sleep(ms(1600)).await;
        assert!(matches!(state(&session), SaveState::SaveFailed(_)));
        let notification = notifications.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(!notification.fatal);

        // No automatic retry.
        sleep(ms(30_000)).await;
        assert_eq!(gateway.update_count(), 1);
        assert!(matches!(state(&session), SaveState::SaveFailed(_)));
        // Local edits survive the failure.
        assert_eq!(session.document().skill[0].progress, 10.0);

        session.apply_edit(skills(15)).unwrap();
        assert_eq!(state(&session), SaveState::DirtyPending);
        sleep(ms(1600)).await;
        assert_eq!(gateway.update_count(), 2);
        assert_eq!(state(&session), SaveState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_save_retries_after_failure() {
        let (gateway, mut session) = open_session().await;
        gateway.fail_next_update(GatewayError::Network("connection reset".into()));

        session.apply_edit(skills(10)).unwrap();
        let err = save_now(&session).await.unwrap_err();
        assert!(matches!(err, SaveError::Failed { .. }));
        assert!(matches!(state(&session), SaveState::SaveFailed(_)));

        save_now(&session).await.unwrap();
        assert_eq!(state(&session), SaveState::Clean);
        assert_eq!(gateway.update_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_section_rejects_invalid_value() {
        let (gateway, mut session) = open_session().await;
        let err = session.edit_section(skills(150)).unwrap_err();
        assert!(matches!(err, EditorError::Invalid(_)));
        assert_eq!(session.revision(), 0);
        assert_eq!(state(&session), SaveState::Clean);
        sleep(ms(3000)).await;
        assert_eq!(gateway.update_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rename_autosaves_title() {
        let (gateway, mut session) = open_session().await;
        session.rename("  Staff Engineer  ").unwrap();
        assert!(session.rename("   ").is_err());
        sleep(ms(1600)).await;
        let stored = gateway.stored(session.document_id()).unwrap();
        assert_eq!(stored.title, "Staff Engineer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_and_rejects_further_saves() {
        let (gateway, mut session) = open_session().await;
        session.apply_edit(contact("new@example.com")).unwrap();
        session.close().await.unwrap();

        assert_eq!(gateway.update_count(), 1);
        let stored = gateway.stored(session.document_id()).unwrap();
        assert_eq!(stored.contact_info.email, "new@example.com");
        assert!(matches!(save_now(&session).await, Err(SaveError::Closed)));
    }
}
