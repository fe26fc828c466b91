pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::editor::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume list
        .route(
            "/api/v1/resumes",
            get(handlers::handle_list_resumes).post(handlers::handle_create_resume),
        )
        .route(
            "/api/v1/resumes/:id",
            axum::routing::delete(handlers::handle_delete_resume),
        )
        // Editor session
        .route(
            "/api/v1/editor",
            get(handlers::handle_get_editor).delete(handlers::handle_close_editor),
        )
        .route("/api/v1/editor/status", get(handlers::handle_editor_status))
        .route(
            "/api/v1/editor/sections/:section",
            get(handlers::handle_get_section).put(handlers::handle_put_section),
        )
        .route("/api/v1/editor/title", put(handlers::handle_put_title))
        .route("/api/v1/editor/save", post(handlers::handle_save))
        .route("/api/v1/editor/export", get(handlers::handle_export))
        .route("/api/v1/editor/send", post(handlers::handle_send_resume))
        .route("/api/v1/editor/events", get(handlers::handle_editor_events))
        .route("/api/v1/editor/open/:id", post(handlers::handle_open_editor))
        .with_state(state)
}
