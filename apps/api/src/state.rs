use std::sync::Arc;

use crate::config::Config;
use crate::pagination::session::PreviewRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Open live-preview sessions, each with its own measure surface.
    pub previews: Arc<PreviewRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            previews: Arc::new(PreviewRegistry::new()),
        }
    }
}
