pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::pagination::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless layout API
        .route("/api/v1/layout/estimate", post(handlers::handle_estimate))
        .route("/api/v1/layout/paginate", post(handlers::handle_paginate))
        .route("/api/v1/layout/render", post(handlers::handle_render))
        // Live preview sessions
        .route("/api/v1/previews", post(handlers::handle_create_preview))
        .route(
            "/api/v1/previews/:id",
            get(handlers::handle_get_preview).delete(handlers::handle_delete_preview),
        )
        .route(
            "/api/v1/previews/:id/pages",
            get(handlers::handle_preview_pages),
        )
        .route(
            "/api/v1/previews/:id/document",
            put(handlers::handle_update_document),
        )
        .route(
            "/api/v1/previews/:id/sections",
            patch(handlers::handle_update_sections),
        )
        .with_state(state)
}
