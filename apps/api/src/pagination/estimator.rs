//! Heuristic height estimator — instant, layout-free section heights.
//!
//! Used for the live length indicator and the first preview while a measured
//! pass is still running. Estimates are one scalar per section (no item
//! granularity) and never reach the export path: paginations built from them
//! carry `Fidelity::Estimated`.
//!
//! # Formula
//! `base + Σ per-entry height + Σ ceil(chars / LINE_CHARS) × LINE_HEIGHT`
//! Every term is non-negative, so estimates grow monotonically with item count
//! and text length.

use serde::{Deserialize, Serialize};

use crate::models::resume::ResumeDocument;
use crate::models::sections::{SectionKey, SectionOrder};
use crate::pagination::content::{has_content, non_blank};
use crate::pagination::packer::SectionMeasurement;

/// Section title, rule and spacing.
const SECTION_BASE_PX: f32 = 48.0;
/// Approximate characters per printed line at body size.
const LINE_CHARS: usize = 95;
const LINE_HEIGHT_PX: f32 = 20.0;

const EXPERIENCE_ENTRY_PX: f32 = 60.0;
const EDUCATION_ENTRY_PX: f32 = 56.0;
const PROJECT_ENTRY_PX: f32 = 52.0;
const SIMPLE_ENTRY_PX: f32 = 34.0;
const REFERENCE_ENTRY_PX: f32 = 58.0;
const BULLET_PX: f32 = 22.0;
const TAG_CHARS_PER_LINE: usize = 80;

const HEADER_BASE_PX: f32 = 60.0;
const HEADER_LINE_PX: f32 = 22.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionEstimate {
    pub section_id: SectionKey,
    pub estimated_height: f32,
}

/// Estimated height of a section in px. Sections without content estimate to 0.
pub fn estimate(key: SectionKey, doc: &ResumeDocument) -> f32 {
    if !has_content(key, doc) {
        return 0.0;
    }

    let body = match key {
        SectionKey::Summary => text_lines(&doc.summary),
        SectionKey::PersonalStatement => text_lines(&doc.personal_statement),
        SectionKey::Skills => tag_lines(&doc.skills),
        SectionKey::Interests => tag_lines(&doc.interests),
        SectionKey::Languages => {
            let chars: usize = doc.languages.iter().map(|l| l.name.len() + l.proficiency.len() + 5).sum();
            chars.div_ceil(TAG_CHARS_PER_LINE) as f32 * LINE_HEIGHT_PX
        }
        SectionKey::Experience => doc
            .experience
            .iter()
            .map(|e| {
                EXPERIENCE_ENTRY_PX
                    + text_lines(&e.description)
                    + non_blank(&e.achievements).count() as f32 * BULLET_PX
            })
            .sum(),
        SectionKey::Education => doc
            .education
            .iter()
            .map(|e| EDUCATION_ENTRY_PX + text_lines(&e.description))
            .sum(),
        SectionKey::Projects => doc
            .projects
            .iter()
            .map(|p| {
                let tech = if non_blank(&p.technologies).next().is_some() {
                    LINE_HEIGHT_PX
                } else {
                    0.0
                };
                PROJECT_ENTRY_PX + text_lines(&p.description) + tech
            })
            .sum(),
        SectionKey::Achievements => doc
            .achievements
            .iter()
            .map(|a| SIMPLE_ENTRY_PX + text_lines(&a.description))
            .sum(),
        SectionKey::Certifications => doc.certifications.len() as f32 * (SIMPLE_ENTRY_PX + 18.0),
        SectionKey::Volunteer => doc
            .volunteer
            .iter()
            .map(|v| EDUCATION_ENTRY_PX + text_lines(&v.description))
            .sum(),
        SectionKey::Publications => doc
            .publications
            .iter()
            .map(|p| SIMPLE_ENTRY_PX + 18.0 + text_lines(&p.description))
            .sum(),
        SectionKey::References => doc.references.len() as f32 * REFERENCE_ENTRY_PX,
    };

    SECTION_BASE_PX + body
}

/// Estimated height of the personal-info header in px.
pub fn estimate_header(doc: &ResumeDocument) -> f32 {
    let info = &doc.personal_info;
    let mut height = HEADER_BASE_PX;
    if !info.headline.trim().is_empty() {
        height += HEADER_LINE_PX;
    }
    if !info.contact_fields().is_empty() {
        height += HEADER_LINE_PX;
    }
    height
}

/// Estimates every visible section with content, in display order.
///
/// Estimates carry no item heights, so the packer never splits them; they are
/// deferred whole, which is good enough for a preview hint.
pub fn estimate_measurements(order: &SectionOrder, doc: &ResumeDocument) -> Vec<SectionMeasurement> {
    order
        .visible()
        .into_iter()
        .filter(|&key| has_content(key, doc))
        .map(|key| SectionMeasurement {
            section_id: key,
            height: estimate(key, doc),
            can_split: key.can_split(),
            items: Vec::new(),
        })
        .collect()
}

fn text_lines(text: &str) -> f32 {
    let chars = text.trim().chars().count();
    chars.div_ceil(LINE_CHARS) as f32 * LINE_HEIGHT_PX
}

fn tag_lines(tags: &[String]) -> f32 {
    // Tags are joined with a 3-char separator.
    let chars: usize = non_blank(tags).map(|t| t.chars().count() + 3).sum();
    chars.div_ceil(TAG_CHARS_PER_LINE) as f32 * LINE_HEIGHT_PX
}
