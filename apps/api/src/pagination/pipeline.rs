//! Pagination pipeline: snapshot → heights → packed pages.
//!
//! Two entry points share the packer:
//! - [`estimate_preview`] is synchronous and instant (heuristic heights).
//! - [`paginate`] runs a full measured pass and is the only source of
//!   paginations the renderer will export.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::models::sections::SectionOrder;
use crate::models::theme::Theme;
use crate::pagination::estimator::{estimate, estimate_header, estimate_measurements, SectionEstimate};
use crate::pagination::measurer::Measure;
use crate::pagination::packer::{pack, PageLayout};
use crate::pagination::page_setup::PageSetup;

/// One immutable revision of everything pagination depends on.
#[derive(Debug, Clone)]
pub struct LayoutSnapshot {
    pub document: Arc<ResumeDocument>,
    pub sections: SectionOrder,
    pub theme: Theme,
    pub setup: PageSetup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Heuristic heights. Preview only, never exported.
    Estimated,
    /// Heights read back from a completed layout pass.
    Measured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub fidelity: Fidelity,
    pub page: PageSetup,
    pub header_height: f32,
    pub usable_height: f32,
    pub pages: Vec<PageLayout>,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateReport {
    pub sections: Vec<SectionEstimate>,
    pub header_height: f32,
    /// Header plus every visible section, as if printed on one endless page.
    pub total_height: f32,
    pub estimated_pages: usize,
    pub pagination: Pagination,
}

/// Instant, layout-free pagination for the live preview and length indicator.
pub fn estimate_preview(snapshot: &LayoutSnapshot) -> EstimateReport {
    let doc = snapshot.document.as_ref();
    let header_height = estimate_header(doc);
    let measurements = estimate_measurements(&snapshot.sections, doc);
    let limits = snapshot.setup.pack_limits(header_height);
    let pages = pack(&measurements, &limits);

    let sections: Vec<SectionEstimate> = snapshot
        .sections
        .visible()
        .into_iter()
        .map(|key| SectionEstimate {
            section_id: key,
            estimated_height: estimate(key, doc),
        })
        .collect();
    let total_height = header_height + measurements.iter().map(|m| m.height).sum::<f32>();

    EstimateReport {
        sections,
        header_height,
        total_height,
        estimated_pages: pages.len(),
        pagination: Pagination {
            fidelity: Fidelity::Estimated,
            page: snapshot.setup.clone(),
            header_height,
            usable_height: limits.usable_height,
            pages,
        },
    }
}

/// Measured pagination: one full layout pass, then the packer.
pub async fn paginate(measurer: &dyn Measure, snapshot: &LayoutSnapshot) -> Result<Pagination, AppError> {
    let measurements = measurer.measure(snapshot).await?;
    let ordered = measurements.in_order(&snapshot.sections.visible());
    let limits = snapshot.setup.pack_limits(measurements.header_height);
    let pages = pack(&ordered, &limits);

    info!(
        sections = ordered.len(),
        pages = pages.len(),
        paper = ?snapshot.setup.paper,
        "Measured pagination complete"
    );

    Ok(Pagination {
        fidelity: Fidelity::Measured,
        page: snapshot.setup.clone(),
        header_height: measurements.header_height,
        usable_height: limits.usable_height,
        pages,
    })
}
