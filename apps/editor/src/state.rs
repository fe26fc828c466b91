use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::editor::session::{EditorContext, EditorSession};
use crate::gateway::DocumentGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// The only path to the remote resume API.
    pub gateway: Arc<dyn DocumentGateway>,
    /// At most one open document per editing context.
    pub editor: Arc<Mutex<Option<EditorSession>>>,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn DocumentGateway>) -> Self {
        Self {
            config,
            gateway,
            editor: Arc::new(Mutex::new(None)),
        }
    }

    pub fn editor_context(&self) -> EditorContext {
        EditorContext {
            gateway: self.gateway.clone(),
            debounce: self.config.debounce(),
        }
    }
}
