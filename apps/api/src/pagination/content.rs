//! Section content predicate and item-id helpers.
//!
//! `has_content` is the single answer to "would rendering this section paint
//! anything". The estimator, the measurer and the renderer all consult it, so
//! layout and visual output never disagree about which sections exist.

use std::collections::HashSet;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::models::sections::SectionKey;

/// Returns `true` when the section would render at least one visible element.
pub fn has_content(key: SectionKey, doc: &ResumeDocument) -> bool {
    match key {
        SectionKey::Summary => !doc.summary.trim().is_empty(),
        SectionKey::PersonalStatement => !doc.personal_statement.trim().is_empty(),
        SectionKey::Skills => non_blank(&doc.skills).next().is_some(),
        SectionKey::Interests => non_blank(&doc.interests).next().is_some(),
        // Languages paint as a tag line, so nameless entries paint nothing.
        SectionKey::Languages => doc.languages.iter().any(|l| !l.name.trim().is_empty()),
        _ => !item_ids(key, doc).is_empty(),
    }
}

/// First entry id that appears more than once in the document, with the
/// section it repeats in. Pages own entries by id, so ids must be unique.
pub fn duplicate_item_id(doc: &ResumeDocument) -> Option<(SectionKey, Uuid)> {
    let mut seen = HashSet::new();
    SectionKey::ALL.into_iter().find_map(|key| {
        item_ids(key, doc)
            .into_iter()
            .find(|id| !seen.insert(*id))
            .map(|id| (key, id))
    })
}

/// Rejects a document whose entries share an id.
pub fn ensure_unique_item_ids(doc: &ResumeDocument) -> Result<(), AppError> {
    match duplicate_item_id(doc) {
        Some((key, id)) => Err(AppError::Validation(format!(
            "entry id {id} appears more than once (in section '{key}')"
        ))),
        None => Ok(()),
    }
}

/// String-keyed variant for callers holding a raw section id. Unknown ids have no content.
#[cfg(test)]
pub fn has_content_by_id(id: &str, doc: &ResumeDocument) -> bool {
    SectionKey::from_id(id).is_some_and(|key| has_content(key, doc))
}

/// Ordered ids of a list section's items. Scalar and tag sections have none.
pub fn item_ids(key: SectionKey, doc: &ResumeDocument) -> Vec<Uuid> {
    match key {
        SectionKey::Experience => doc.experience.iter().map(|i| i.id).collect(),
        SectionKey::Education => doc.education.iter().map(|i| i.id).collect(),
        SectionKey::Projects => doc.projects.iter().map(|i| i.id).collect(),
        SectionKey::Achievements => doc.achievements.iter().map(|i| i.id).collect(),
        SectionKey::Certifications => doc.certifications.iter().map(|i| i.id).collect(),
        SectionKey::Languages => doc.languages.iter().map(|i| i.id).collect(),
        SectionKey::Volunteer => doc.volunteer.iter().map(|i| i.id).collect(),
        SectionKey::Publications => doc.publications.iter().map(|i| i.id).collect(),
        SectionKey::References => doc.references.iter().map(|i| i.id).collect(),
        SectionKey::Summary
        | SectionKey::PersonalStatement
        | SectionKey::Skills
        | SectionKey::Interests => Vec::new(),
    }
}

/// Iterates trimmed, non-empty tags.
pub fn non_blank(tags: &[String]) -> impl Iterator<Item = &str> {
    tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty())
}
