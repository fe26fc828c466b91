//! Axum route handlers for the resume list and the editor session.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::{Stream, StreamExt};
use tracing::info;
use uuid::Uuid;

use crate::autosave::{worker::SAVED_MESSAGE, Revision, SaveStatus};
use crate::editor::export::render_markdown;
use crate::editor::session::EditorSession;
use crate::editor::validation::{validate_recipient, validate_title};
use crate::errors::AppError;
use crate::gateway::ResumeEmail;
use crate::models::section::UnknownSection;
use crate::models::{Document, DocumentId, SectionName, SectionValue};
use crate::state::AppState;

pub const DEFAULT_EMAIL_SUBJECT: &str = "Resume Application";
pub const DEFAULT_EMAIL_MESSAGE: &str = "Please find my resume attached.\n\nBest Regards";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateResumeRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResumeRequest {
    pub recipient_email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResumeSummary {
    pub id: DocumentId,
    pub title: String,
    pub thumbnail_link: Option<String>,
    pub updated_at: Option<String>,
}

impl From<Document> for ResumeSummary {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            thumbnail_link: doc.thumbnail_link,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EditorView {
    pub session_id: Uuid,
    pub revision: Revision,
    pub document: Document,
    pub status: SaveStatus,
}

impl EditorView {
    fn of(session: &EditorSession) -> Self {
        Self {
            session_id: session.session_id(),
            revision: session.revision(),
            document: session.document().as_ref().clone(),
            status: session.status(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub message: &'static str,
    pub revision: Revision,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Resume list
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let documents = state.gateway.list_documents().await?;
    Ok(Json(documents.into_iter().map(ResumeSummary::from).collect()))
}

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let title = validate_title(&req.title)?;
    let document = state.gateway.create_document(&title).await?;
    info!("Created resume {} ({})", document.id, document.title);
    Ok((StatusCode::CREATED, Json(document)))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = DocumentId(id);
    {
        let mut editor = state.editor.lock().await;
        if let Some(session) = editor.as_mut().filter(|s| s.document_id() == &id) {
            session.close().await?;
            *editor = None;
        }
    }
    state.gateway.delete_document(&id).await?;
    info!("Deleted resume {id}");
    Ok(Json(MessageResponse {
        message: "Resume deleted successfully".to_string(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Editor session
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/editor/open/:id
///
/// Opens `id` for editing. The document is fetched without holding the
/// editor lock, so the current session keeps serving requests meanwhile.
/// The current session is then flushed and closed under the lock; if that
/// flush fails it stays open and the new one is discarded.
pub async fn handle_open_editor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EditorView>, AppError> {
    let id = DocumentId(id);
    {
        let editor = state.editor.lock().await;
        if let Some(current) = editor.as_ref().filter(|s| s.document_id() == &id) {
            return Ok(Json(EditorView::of(current)));
        }
    }

    let session = EditorSession::open(&state.editor_context(), &id).await?;

    let mut editor = state.editor.lock().await;
    if let Some(current) = editor.as_mut() {
        // Another request opened the same document first.
        if current.document_id() == &id {
            return Ok(Json(EditorView::of(current)));
        }
        current.close().await?;
        *editor = None;
    }
    let view = EditorView::of(&session);
    *editor = Some(session);
    Ok(Json(view))
}

/// GET /api/v1/editor
pub async fn handle_get_editor(
    State(state): State<AppState>,
) -> Result<Json<EditorView>, AppError> {
    let editor = state.editor.lock().await;
    let session = editor.as_ref().ok_or(AppError::NoSession)?;
    Ok(Json(EditorView::of(session)))
}

/// GET /api/v1/editor/status
pub async fn handle_editor_status(
    State(state): State<AppState>,
) -> Result<Json<SaveStatus>, AppError> {
    let editor = state.editor.lock().await;
    let session = editor.as_ref().ok_or(AppError::NoSession)?;
    Ok(Json(session.status()))
}

/// GET /api/v1/editor/sections/:section
pub async fn handle_get_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<SectionValue>, AppError> {
    let name = parse_section(&section)?;
    let editor = state.editor.lock().await;
    let session = editor.as_ref().ok_or(AppError::NoSession)?;
    Ok(Json(session.document().section(name)))
}

/// PUT /api/v1/editor/sections/:section
///
/// The body is the full replacement value of that one section.
pub async fn handle_put_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SaveStatus>, AppError> {
    let name = parse_section(&section)?;
    let value = SectionValue::from_json(name, body)
        .map_err(|e| AppError::Validation(format!("{name}: {e}")))?;

    let mut editor = state.editor.lock().await;
    let session = editor.as_mut().ok_or(AppError::NoSession)?;
    session.edit_section(value)?;
    Ok(Json(session.status()))
}

/// PUT /api/v1/editor/title
pub async fn handle_put_title(
    State(state): State<AppState>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<SaveStatus>, AppError> {
    let mut editor = state.editor.lock().await;
    let session = editor.as_mut().ok_or(AppError::NoSession)?;
    session.rename(&req.title)?;
    Ok(Json(session.status()))
}

/// POST /api/v1/editor/save
///
/// Waits for the save without holding the editor lock, so edits keep
/// flowing while the request is in flight.
pub async fn handle_save(State(state): State<AppState>) -> Result<Json<SaveResponse>, AppError> {
    let pending = {
        let editor = state.editor.lock().await;
        let session = editor.as_ref().ok_or(AppError::NoSession)?;
        session.request_save()?
    };
    let revision = pending.wait().await?;
    Ok(Json(SaveResponse {
        message: SAVED_MESSAGE,
        revision,
    }))
}

/// GET /api/v1/editor/export
pub async fn handle_export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let editor = state.editor.lock().await;
    let session = editor.as_ref().ok_or(AppError::NoSession)?;
    let body = render_markdown(session.document());
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        body,
    ))
}

/// DELETE /api/v1/editor
pub async fn handle_close_editor(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let mut editor = state.editor.lock().await;
    let session = editor.as_mut().ok_or(AppError::NoSession)?;
    session.close().await?;
    *editor = None;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/editor/events
///
/// Server-sent events for the open session: a `status` event whenever the
/// save status changes (starting with the current one) and a
/// `notification` event for each save success or failure message.
pub async fn handle_editor_events(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let (statuses, notifications) = {
        let editor = state.editor.lock().await;
        let session = editor.as_ref().ok_or(AppError::NoSession)?;
        (session.subscribe_status(), session.subscribe_notifications())
    };

    let statuses = WatchStream::new(statuses)
        .map(|tracker| Event::default().event("status").json_data(tracker.status()));
    let notifications = BroadcastStream::new(notifications)
        // A lagging client skips what it missed.
        .filter_map(|notification| notification.ok())
        .map(|notification| {
            Event::default()
                .event("notification")
                .json_data(notification)
        });

    Ok(Sse::new(statuses.merge(notifications)).keep_alive(KeepAlive::default()))
}

/// POST /api/v1/editor/send
///
/// Emails the open document, rendered as markdown, to a recipient.
pub async fn handle_send_resume(
    State(state): State<AppState>,
    Json(req): Json<SendResumeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let recipient = validate_recipient(&req.recipient_email)?;
    let (id, email) = {
        let editor = state.editor.lock().await;
        let session = editor.as_ref().ok_or(AppError::NoSession)?;
        let document = session.document();
        let file_stem = match document.title.trim() {
            "" => "resume",
            title => title,
        };
        let email = ResumeEmail {
            recipient,
            subject: non_blank(req.subject).unwrap_or_else(|| DEFAULT_EMAIL_SUBJECT.to_string()),
            message: non_blank(req.message).unwrap_or_else(|| DEFAULT_EMAIL_MESSAGE.to_string()),
            file_name: format!("{file_stem}.md"),
            attachment: render_markdown(document),
        };
        (session.document_id().clone(), email)
    };

    let receipt = state.gateway.send_resume_email(&id, &email).await?;
    if receipt.success == Some(false) {
        return Err(AppError::Gateway(receipt.message));
    }
    info!("Sent resume {id} to {}", email.recipient);
    Ok(Json(MessageResponse {
        message: format!("Resume sent successfully to {}", email.recipient),
    }))
}

fn parse_section(raw: &str) -> Result<SectionName, AppError> {
    raw.parse()
        .map_err(|e: UnknownSection| AppError::NotFound(e.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
