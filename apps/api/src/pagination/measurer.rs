//! Layout measurer — exact section and entry heights from a real layout pass.
//!
//! # Pass structure
//! 1. Lock the offscreen [`MeasureSurface`] (one pass at a time per measurer)
//!    and mount it at the page's content width with the page's type family.
//! 2. Build the header and section markup from the snapshot, exactly as the
//!    page renderer will paint it.
//! 3. Run the whole layout on the blocking pool via `spawn_blocking` and await
//!    its completion before reading any geometry.
//! 4. Read the header height, each section's height and, for splittable
//!    sections, every entry's height.
//! 5. Unmount the surface (guard drop), leaving it clean for the next pass.
//!
//! A section the engine cannot lay out degrades to height 0 with a warning;
//! its entries keep their ids so nothing disappears from the printed pages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::sections::SectionKey;
use crate::pagination::engine::{LayoutEngine, LayoutError, MetricLayoutEngine};
use crate::pagination::font_metrics::FontFamily;
use crate::pagination::markup::{
    header_markup, section_markup, HeaderMarkup, SectionBody, SectionMarkup,
};
use crate::pagination::packer::{ItemMeasurement, SectionMeasurement};
use crate::pagination::pipeline::LayoutSnapshot;

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurements {
    pub header_height: f32,
    pub sections: HashMap<SectionKey, SectionMeasurement>,
}

impl Measurements {
    /// Measured sections in the given display order; sections that were not
    /// measured (hidden or empty) are skipped.
    pub fn in_order(&self, keys: &[SectionKey]) -> Vec<SectionMeasurement> {
        keys.iter()
            .filter_map(|k| self.sections.get(k).cloned())
            .collect()
    }
}

/// Anything that can turn a snapshot into measured heights.
///
/// Preview sessions and HTTP handlers hold an `Arc<dyn Measure>`.
#[async_trait]
pub trait Measure: Send + Sync {
    async fn measure(&self, snapshot: &LayoutSnapshot) -> Result<Measurements, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Measure surface
// ────────────────────────────────────────────────────────────────────────────

pub type EngineFactory = fn(FontFamily) -> Arc<dyn LayoutEngine>;

fn metric_engine(family: FontFamily) -> Arc<dyn LayoutEngine> {
    Arc::new(MetricLayoutEngine::new(family))
}

/// The offscreen container content is laid out in. Exclusive to one pass.
#[derive(Default)]
pub struct MeasureSurface {
    width: f32,
    engine: Option<Arc<dyn LayoutEngine>>,
    passes_completed: u64,
}

impl MeasureSurface {
    fn mount(&mut self, width: f32, engine: Arc<dyn LayoutEngine>) -> MountedSurface<'_> {
        self.width = width;
        self.engine = Some(engine.clone());
        MountedSurface {
            surface: self,
            engine,
        }
    }

    #[cfg(test)]
    fn is_mounted(&self) -> bool {
        self.engine.is_some()
    }

    #[cfg(test)]
    fn passes_completed(&self) -> u64 {
        self.passes_completed
    }
}

/// A mounted surface; dropping it tears the surface down.
struct MountedSurface<'a> {
    surface: &'a mut MeasureSurface,
    engine: Arc<dyn LayoutEngine>,
}

impl MountedSurface<'_> {
    fn width(&self) -> f32 {
        self.surface.width
    }

    fn engine(&self) -> Arc<dyn LayoutEngine> {
        self.engine.clone()
    }

    /// Marks the pass done and returns how many passes the surface has run.
    fn complete(self) -> u64 {
        self.surface.passes_completed += 1;
        self.surface.passes_completed
    }
}

impl Drop for MountedSurface<'_> {
    fn drop(&mut self) {
        self.surface.engine = None;
        self.surface.width = 0.0;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Surface measurer
// ────────────────────────────────────────────────────────────────────────────

/// Default [`Measure`] implementation backed by a [`LayoutEngine`].
pub struct SurfaceMeasurer {
    surface: Mutex<MeasureSurface>,
    engine_factory: EngineFactory,
}

impl SurfaceMeasurer {
    pub fn new() -> Self {
        Self::with_engine(metric_engine)
    }

    pub fn with_engine(engine_factory: EngineFactory) -> Self {
        Self {
            surface: Mutex::new(MeasureSurface::default()),
            engine_factory,
        }
    }

    #[cfg(test)]
    async fn passes_completed(&self) -> u64 {
        self.surface.lock().await.passes_completed()
    }

    #[cfg(test)]
    async fn is_idle(&self) -> bool {
        !self.surface.lock().await.is_mounted()
    }
}

impl Default for SurfaceMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Measure for SurfaceMeasurer {
    async fn measure(&self, snapshot: &LayoutSnapshot) -> Result<Measurements, AppError> {
        let mut surface = self.surface.lock().await;
        let mounted = surface.mount(
            snapshot.setup.content_width(),
            (self.engine_factory)(snapshot.setup.font),
        );

        let job = LayoutJob::build(snapshot);
        let engine = mounted.engine();
        let width = mounted.width();

        // The layout pass must finish before any geometry is read.
        let measurements = tokio::task::spawn_blocking(move || job.run(engine.as_ref(), width))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("layout pass failed to complete: {e}")))?;

        let pass = mounted.complete();
        debug!(
            pass,
            sections = measurements.sections.len(),
            header_height = measurements.header_height,
            "Layout pass complete"
        );
        Ok(measurements)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout job (runs on the blocking pool)
// ────────────────────────────────────────────────────────────────────────────

/// Owned markup for one pass; `spawn_blocking` needs `'static` data.
struct LayoutJob {
    header: HeaderMarkup,
    sections: Vec<SectionMarkup>,
}

impl LayoutJob {
    fn build(snapshot: &LayoutSnapshot) -> Self {
        let doc = snapshot.document.as_ref();
        let sections = snapshot
            .sections
            .visible()
            .into_iter()
            .filter_map(|key| section_markup(key, snapshot.sections.title_of(key), doc))
            .collect();
        Self {
            header: header_markup(doc),
            sections,
        }
    }

    fn run(self, engine: &dyn LayoutEngine, width: f32) -> Measurements {
        let header_height = engine
            .stack_height(&self.header.blocks, width)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Header could not be measured; using 0");
                0.0
            });

        let sections = self
            .sections
            .iter()
            .map(|markup| (markup.key, measure_section(engine, markup, width)))
            .collect();

        Measurements {
            header_height,
            sections,
        }
    }
}

fn measure_section(engine: &dyn LayoutEngine, markup: &SectionMarkup, width: f32) -> SectionMeasurement {
    match try_measure_section(engine, markup, width) {
        Ok(measurement) => measurement,
        Err(e) => {
            warn!(section = %markup.key, error = %e, "Section could not be measured; using 0");
            SectionMeasurement {
                section_id: markup.key,
                height: 0.0,
                can_split: markup.key.can_split(),
                items: markup
                    .items()
                    .iter()
                    .map(|item| ItemMeasurement {
                        id: item.id,
                        height: 0.0,
                    })
                    .collect(),
            }
        }
    }
}

fn try_measure_section(
    engine: &dyn LayoutEngine,
    markup: &SectionMarkup,
    width: f32,
) -> Result<SectionMeasurement, LayoutError> {
    let title = engine.block_height(&markup.title, width)?;

    let (height, items) = match &markup.body {
        SectionBody::Text(blocks) => (title + engine.stack_height(blocks, width)?, Vec::new()),
        SectionBody::Items(entries) => {
            let items = entries
                .iter()
                .map(|entry| {
                    Ok(ItemMeasurement {
                        id: entry.id,
                        height: engine.item_height(&entry.blocks, width)?,
                    })
                })
                .collect::<Result<Vec<_>, LayoutError>>()?;
            let body: f32 = items.iter().map(|i| i.height).sum();
            (title + body, items)
        }
    };

    Ok(SectionMeasurement {
        section_id: markup.key,
        height,
        can_split: markup.key.can_split(),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{ExperienceItem, ResumeDocument};
    use crate::models::sections::SectionOrder;
    use crate::models::theme::Theme;
    use crate::pagination::markup::{Block, BlockKind};
    use crate::pagination::page_setup::PageSetup;

    fn make_snapshot(doc: ResumeDocument) -> LayoutSnapshot {
        LayoutSnapshot {
            document: Arc::new(doc),
            sections: SectionOrder::default(),
            theme: Theme::default(),
            setup: PageSetup::default(),
        }
    }

    fn make_document() -> ResumeDocument {
        ResumeDocument {
            summary: "Backend engineer focused on storage systems and latency.".to_string(),
            experience: (0..3)
                .map(|i| ExperienceItem {
                    position: format!("Engineer {i}"),
                    company: "Acme".to_string(),
                    description: "Owned the ingestion pipeline end to end.".to_string(),
                    achievements: vec!["Cut p99 latency by 40%".to_string()],
                    ..Default::default()
                })
                .collect(),
            skills: vec!["Rust".to_string(), "Postgres".to_string()],
            ..Default::default()
        }
    }

    /// Engine that refuses to lay out paragraphs, standing in for a detached node.
    struct NoParagraphs(MetricLayoutEngine);

    impl LayoutEngine for NoParagraphs {
        fn block_height(&self, block: &Block, width: f32) -> Result<f32, LayoutError> {
            if block.kind == BlockKind::Paragraph {
                return Err(LayoutError::ZeroWidthContainer { width: 0.0 });
            }
            self.0.block_height(block, width)
        }
    }

    fn no_paragraphs(family: FontFamily) -> Arc<dyn LayoutEngine> {
        Arc::new(NoParagraphs(MetricLayoutEngine::new(family)))
    }

    #[tokio::test]
    async fn test_measures_only_sections_with_content() {
        let measurer = SurfaceMeasurer::new();
        let m = measurer.measure(&make_snapshot(make_document())).await.unwrap();
        let mut keys: Vec<SectionKey> = m.sections.keys().copied().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![SectionKey::Summary, SectionKey::Experience, SectionKey::Skills]
        );
        assert!(m.header_height > 0.0);
    }

    #[tokio::test]
    async fn test_hidden_sections_are_not_measured() {
        let mut snapshot = make_snapshot(make_document());
        snapshot.sections.set_visible(SectionKey::Skills, false).unwrap();
        let m = SurfaceMeasurer::new().measure(&snapshot).await.unwrap();
        assert!(!m.sections.contains_key(&SectionKey::Skills));
    }

    #[tokio::test]
    async fn test_splittable_section_has_entry_heights() {
        let doc = make_document();
        let ids: Vec<_> = doc.experience.iter().map(|e| e.id).collect();
        let m = SurfaceMeasurer::new().measure(&make_snapshot(doc)).await.unwrap();

        let exp = &m.sections[&SectionKey::Experience];
        assert!(exp.can_split);
        assert_eq!(exp.items.iter().map(|i| i.id).collect::<Vec<_>>(), ids);
        assert!(exp.items.iter().all(|i| i.height > 0.0));
        // Overhead is exactly the title block: 22px line + 10px margin.
        assert!((exp.overhead() - 32.0).abs() < 1e-3);

        let skills = &m.sections[&SectionKey::Skills];
        assert!(!skills.can_split);
        assert!(skills.items.is_empty());
    }

    #[tokio::test]
    async fn test_measurement_is_idempotent() {
        let measurer = SurfaceMeasurer::new();
        let snapshot = make_snapshot(make_document());
        let first = measurer.measure(&snapshot).await.unwrap();
        let second = measurer.measure(&snapshot).await.unwrap();
        for (key, a) in &first.sections {
            let b = &second.sections[key];
            assert!((a.height - b.height).abs() <= 1.0);
        }
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unmeasurable_section_degrades_to_zero() {
        let measurer = SurfaceMeasurer::with_engine(no_paragraphs);
        let doc = make_document();
        let ids: Vec<_> = doc.experience.iter().map(|e| e.id).collect();
        let m = measurer.measure(&make_snapshot(doc)).await.unwrap();

        assert_eq!(m.sections[&SectionKey::Summary].height, 0.0);
        let exp = &m.sections[&SectionKey::Experience];
        assert_eq!(exp.height, 0.0);
        // Entries are kept so the renderer still paints them.
        assert_eq!(exp.items.iter().map(|i| i.id).collect::<Vec<_>>(), ids);
        // Unaffected sections still measure normally.
        assert!(m.sections[&SectionKey::Skills].height > 0.0);
    }

    #[tokio::test]
    async fn test_wider_paper_never_increases_heights() {
        use crate::pagination::page_setup::MarginPreset;
        let doc = make_document();
        let mut narrow = make_snapshot(doc.clone());
        narrow.setup.margin = MarginPreset::Large;
        let mut wide = make_snapshot(doc);
        wide.setup.margin = MarginPreset::None;

        let measurer = SurfaceMeasurer::new();
        let n = measurer.measure(&narrow).await.unwrap();
        let w = measurer.measure(&wide).await.unwrap();
        for (key, section) in &w.sections {
            assert!(section.height <= n.sections[key].height);
        }
    }

    #[tokio::test]
    async fn test_concurrent_passes_share_surface_exclusively() {
        let measurer = Arc::new(SurfaceMeasurer::new());
        let snapshot = make_snapshot(make_document());
        let (a, b) = tokio::join!(measurer.measure(&snapshot), measurer.measure(&snapshot));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(measurer.passes_completed().await, 2);
        assert!(measurer.is_idle().await);
    }

    #[test]
    fn test_in_order_skips_unmeasured() {
        let mut sections = HashMap::new();
        sections.insert(
            SectionKey::Skills,
            SectionMeasurement {
                section_id: SectionKey::Skills,
                height: 40.0,
                can_split: false,
                items: vec![],
            },
        );
        let m = Measurements {
            header_height: 0.0,
            sections,
        };
        let ordered = m.in_order(&[SectionKey::Summary, SectionKey::Skills]);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].section_id, SectionKey::Skills);
    }
}
