use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::models::sections::SectionOrder;
use crate::models::theme::Theme;
use crate::pagination::content::ensure_unique_item_ids;
use crate::pagination::measurer::SurfaceMeasurer;
use crate::pagination::page_setup::{PageOptions, PageSetup};
use crate::pagination::pipeline::{estimate_preview, paginate, EstimateReport, LayoutSnapshot, Pagination};
use crate::pagination::renderer::{render_document, RenderedDocument};
use crate::pagination::session::{PassOutcome, PreviewView, SectionChange};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    pub document: ResumeDocument,
    /// Falls back to every section in the standard order.
    #[serde(default)]
    pub sections: Option<SectionOrder>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub page: PageOptions,
}

impl LayoutRequest {
    pub fn into_snapshot(self, defaults: &PageSetup) -> Result<LayoutSnapshot, AppError> {
        ensure_unique_item_ids(&self.document)?;
        Ok(LayoutSnapshot {
            document: Arc::new(self.document),
            sections: self.sections.unwrap_or_default(),
            theme: self.theme,
            setup: self.page.resolve(defaults),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentUpdate {
    pub document: ResumeDocument,
    #[serde(default)]
    pub theme: Option<Theme>,
}

#[derive(Serialize)]
pub struct PreviewCreated {
    pub id: Uuid,
    pub outcome: PassOutcome,
}

/// POST /api/v1/layout/estimate
pub async fn handle_estimate(
    State(state): State<AppState>,
    Json(req): Json<LayoutRequest>,
) -> Result<Json<EstimateReport>, AppError> {
    let snapshot = req.into_snapshot(&state.config.page_defaults)?;
    Ok(Json(estimate_preview(&snapshot)))
}

/// POST /api/v1/layout/paginate
pub async fn handle_paginate(
    State(state): State<AppState>,
    Json(req): Json<LayoutRequest>,
) -> Result<Json<Pagination>, AppError> {
    let snapshot = req.into_snapshot(&state.config.page_defaults)?;
    let pagination = paginate(&SurfaceMeasurer::new(), &snapshot).await?;
    Ok(Json(pagination))
}

/// POST /api/v1/layout/render
pub async fn handle_render(
    State(state): State<AppState>,
    Json(req): Json<LayoutRequest>,
) -> Result<Json<RenderedDocument>, AppError> {
    let snapshot = req.into_snapshot(&state.config.page_defaults)?;
    let pagination = paginate(&SurfaceMeasurer::new(), &snapshot).await?;
    Ok(Json(render_document(&pagination, &snapshot)?))
}

/// POST /api/v1/previews
pub async fn handle_create_preview(
    State(state): State<AppState>,
    Json(req): Json<LayoutRequest>,
) -> Result<(StatusCode, Json<PreviewCreated>), AppError> {
    let snapshot = req.into_snapshot(&state.config.page_defaults)?;
    let session = state.previews.create(snapshot).await;
    let outcome = session.refresh().await?;
    Ok((
        StatusCode::CREATED,
        Json(PreviewCreated {
            id: session.id(),
            outcome,
        }),
    ))
}

/// GET /api/v1/previews/:id
pub async fn handle_get_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewView>, AppError> {
    let session = state.previews.get(id).await?;
    Ok(Json(session.view().await))
}

/// GET /api/v1/previews/:id/pages
pub async fn handle_preview_pages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderedDocument>, AppError> {
    let session = state.previews.get(id).await?;
    Ok(Json(session.render_committed().await?))
}

/// PUT /api/v1/previews/:id/document
pub async fn handle_update_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DocumentUpdate>,
) -> Result<Json<PassOutcome>, AppError> {
    let session = state.previews.get(id).await?;
    Ok(Json(session.submit_document(req.document, req.theme).await?))
}

/// PATCH /api/v1/previews/:id/sections
pub async fn handle_update_sections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(change): Json<SectionChange>,
) -> Result<Json<PassOutcome>, AppError> {
    let session = state.previews.get(id).await?;
    Ok(Json(session.update_sections(change).await?))
}

/// DELETE /api/v1/previews/:id
pub async fn handle_delete_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.previews.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
