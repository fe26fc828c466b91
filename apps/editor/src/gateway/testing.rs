//! In-memory gateway double for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;

use super::{DocumentGateway, EmailReceipt, GatewayError, ResumeEmail};
use crate::models::{Document, DocumentId};

#[derive(Debug, Clone)]
pub struct RecordedUpdate {
    /// Clock instant at which the call was dispatched.
    pub at: Instant,
    pub document: Document,
}

/// Stores documents in memory and records every `update_document` call.
///
/// Update latency and queued failures let tests hold a save in flight or
/// make it fail.
#[derive(Default)]
pub struct RecordingGateway {
    documents: Mutex<HashMap<DocumentId, Document>>,
    updates: Mutex<Vec<RecordedUpdate>>,
    emails: Mutex<Vec<(DocumentId, ResumeEmail)>>,
    latency: Mutex<Duration>,
    fetch_latency: Mutex<Duration>,
    failures: Mutex<VecDeque<GatewayError>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_id: AtomicUsize,
}

impl RecordingGateway {
    pub fn with_document(document: Document) -> Self {
        let gateway = Self::default();
        gateway.insert(document);
        gateway
    }

    pub fn insert(&self, document: Document) {
        self.documents
            .lock()
            .unwrap()
            .insert(document.id.clone(), document);
    }

    pub fn stored(&self, id: &DocumentId) -> Option<Document> {
        self.documents.lock().unwrap().get(id).cloned()
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Delay applied to every `get_document` call.
    pub fn set_fetch_latency(&self, latency: Duration) {
        *self.fetch_latency.lock().unwrap() = latency;
    }

    /// The next `update_document` call fails with `error`.
    pub fn fail_next_update(&self, error: GatewayError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn sent_emails(&self) -> Vec<(DocumentId, ResumeEmail)> {
        self.emails.lock().unwrap().clone()
    }

    /// Highest number of concurrently running update calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentGateway for RecordingGateway {
    async fn get_document(&self, id: &DocumentId) -> Result<Document, GatewayError> {
        let latency = *self.fetch_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.stored(id)
            .ok_or_else(|| GatewayError::NotFound(format!("Resume {id} not found")))
    }

    async fn update_document(
        &self,
        id: &DocumentId,
        document: &Document,
    ) -> Result<Document, GatewayError> {
        self.updates.lock().unwrap().push(RecordedUpdate {
            at: Instant::now(),
            document: document.clone(),
        });
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let mut saved = document.clone();
        saved.id = id.clone();
        saved.updated_at = Some(Utc::now().to_rfc3339());
        self.insert(saved.clone());
        Ok(saved)
    }

    async fn create_document(&self, title: &str) -> Result<Document, GatewayError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now().to_rfc3339();
        let mut document = crate::models::resume::sample_document(&format!("new-{n}"));
        document.title = title.to_string();
        document.created_at = Some(now.clone());
        document.updated_at = Some(now);
        self.insert(document.clone());
        Ok(document)
    }

    async fn delete_document(&self, id: &DocumentId) -> Result<(), GatewayError> {
        self.documents
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| GatewayError::NotFound(format!("Resume {id} not found")))
    }

    async fn list_documents(&self) -> Result<Vec<Document>, GatewayError> {
        let mut documents: Vec<Document> =
            self.documents.lock().unwrap().values().cloned().collect();
        documents.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(documents)
    }

    async fn send_resume_email(
        &self,
        id: &DocumentId,
        email: &ResumeEmail,
    ) -> Result<EmailReceipt, GatewayError> {
        if self.stored(id).is_none() {
            return Err(GatewayError::NotFound(format!("Resume {id} not found")));
        }
        self.emails.lock().unwrap().push((id.clone(), email.clone()));
        Ok(EmailReceipt {
            success: Some(true),
            message: format!("Email sent to {}", email.recipient),
        })
    }
}
