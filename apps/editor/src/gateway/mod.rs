//! Remote Document Gateway: the single point of entry for all calls to the
//! remote resume API.
//!
//! No other module may talk to the remote API directly. The gateway attaches
//! the bearer token and normalizes every failure into a [`GatewayError`].
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Document, DocumentId};

#[cfg(test)]
pub mod testing;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Resume not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rejected by server: {0}")]
    Validation(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Parse(String),
}

impl GatewayError {
    /// Authorization failures end the editing session; everything else is
    /// recoverable by the next edit or a manual save.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::Unauthorized(_))
    }

    fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 | 403 => GatewayError::Unauthorized(message),
            404 => GatewayError::NotFound(message),
            400 | 422 => GatewayError::Validation(message),
            408 | 504 => GatewayError::Timeout,
            code => GatewayError::Api {
                status: code,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if e.is_decode() {
            GatewayError::Parse(e.to_string())
        } else {
            GatewayError::Network(e.to_string())
        }
    }
}

/// The operations the editor needs from the remote API.
///
/// Carried as `Arc<dyn DocumentGateway>` so tests can swap in a recording
/// double without touching the session or the autosave worker.
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    async fn get_document(&self, id: &DocumentId) -> Result<Document, GatewayError>;

    async fn update_document(
        &self,
        id: &DocumentId,
        document: &Document,
    ) -> Result<Document, GatewayError>;

    async fn create_document(&self, title: &str) -> Result<Document, GatewayError>;

    async fn delete_document(&self, id: &DocumentId) -> Result<(), GatewayError>;

    async fn list_documents(&self) -> Result<Vec<Document>, GatewayError>;

    /// Emails a rendered resume as a file attachment.
    async fn send_resume_email(
        &self,
        id: &DocumentId,
        email: &ResumeEmail,
    ) -> Result<EmailReceipt, GatewayError>;
}

/// One outgoing resume email.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeEmail {
    pub recipient: String,
    pub subject: String,
    pub message: String,
    pub file_name: String,
    pub attachment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailReceipt {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
struct CreateDocumentRequest<'a> {
    title: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// reqwest-backed gateway for the remote resume API.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        // Error bodies carry `{ "message": ... }`; fall back to the raw text.
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.is_empty() {
                    format!("HTTP error! status: {}", status.as_u16())
                } else {
                    body
                }
            });
        warn!("Remote API returned {}: {}", status, message);
        Err(GatewayError::from_status(status, message))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

#[async_trait]
impl DocumentGateway for HttpGateway {
    async fn get_document(&self, id: &DocumentId) -> Result<Document, GatewayError> {
        debug!("GET /resumes/{id}");
        self.json(self.request(Method::GET, &format!("/resumes/{id}")))
            .await
    }

    async fn update_document(
        &self,
        id: &DocumentId,
        document: &Document,
    ) -> Result<Document, GatewayError> {
        debug!("PUT /resumes/{id}");
        self.json(
            self.request(Method::PUT, &format!("/resumes/{id}"))
                .json(document),
        )
        .await
    }

    async fn create_document(&self, title: &str) -> Result<Document, GatewayError> {
        debug!("POST /resumes");
        self.json(
            self.request(Method::POST, "/resumes")
                .json(&CreateDocumentRequest { title }),
        )
        .await
    }

    async fn delete_document(&self, id: &DocumentId) -> Result<(), GatewayError> {
        debug!("DELETE /resumes/{id}");
        self.send(self.request(Method::DELETE, &format!("/resumes/{id}")))
            .await?;
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<Document>, GatewayError> {
        debug!("GET /resumes");
        self.json(self.request(Method::GET, "/resumes")).await
    }

    async fn send_resume_email(
        &self,
        id: &DocumentId,
        email: &ResumeEmail,
    ) -> Result<EmailReceipt, GatewayError> {
        debug!("POST /email/send-resume ({id})");
        let file = Part::text(email.attachment.clone())
            .file_name(email.file_name.clone())
            .mime_str("text/markdown")?;
        let form = Form::new()
            .text("recipientEmail", email.recipient.clone())
            .text("subject", email.subject.clone())
            .text("message", email.message.clone())
            .part("pdfFile", file);
        self.json(
            self.request(Method::POST, "/email/send-resume")
                .multipart(form),
        )
        .await
    }
}
