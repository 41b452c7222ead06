//! Page packer — assigns measured sections (and, when needed, slices of their
//! entries) to fixed-height print pages.
//!
//! # Algorithm
//! Greedy, single pass, in display order, no backtracking:
//! - Page 1 starts at `header_height + spacing` and is the only page with a header.
//! - A section fits when `total + height + spacing <= usable_height`.
//! - A splittable section with at least two entries that does not fit is split
//!   at the remaining height; if not a single entry fits, the whole section is
//!   deferred to a new page.
//! - Anything else that does not fit starts a new page.
//! - A remainder that still overflows the new page is split again, so one
//!   section may span several pages.
//!
//! A page that holds no sections always accepts the next content, even when it
//! overflows. That keeps the packer total: it terminates for any input and
//! accepts an overfull page as a visual defect instead of looping.
//!
//! Page 1 is never blank: the header occupies it. Content that misses page 1
//! moves to page 2 whenever a blank page would hold it, leaving page 1 with the
//! header alone. It is forced onto page 1 only when it would overflow a blank
//! page as well.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::sections::SectionKey;
use crate::pagination::splitter::{fit_count, split};

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMeasurement {
    pub id: Uuid,
    pub height: f32,
}

/// The unit the packer consumes: one visible section with content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMeasurement {
    pub section_id: SectionKey,
    /// Full height in px: title overhead plus every entry (or the text body).
    pub height: f32,
    pub can_split: bool,
    /// Per-entry heights, in document order. Empty for text/tag sections and for estimates.
    #[serde(default)]
    pub items: Vec<ItemMeasurement>,
}

impl SectionMeasurement {
    /// Height repeated by every fragment of the section (title, rule, spacing).
    pub fn overhead(&self) -> f32 {
        let items: f32 = self.items.iter().map(|i| i.height).sum();
        (self.height - items).max(0.0)
    }

    fn fragment_height(&self, start: usize, end: usize) -> f32 {
        if start == 0 && end == self.items.len() {
            return self.height;
        }
        self.overhead() + self.items[start..end].iter().map(|i| i.height).sum::<f32>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSection {
    pub section_id: SectionKey,
    pub height: f32,
    /// Ids of the entries painted on this page, in document order.
    #[serde(default)]
    pub items: Vec<Uuid>,
    #[serde(default)]
    pub is_partial: bool,
    /// Inclusive index range into the section's full entry list (partial sections only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_number: usize,
    pub sections: Vec<PageSection>,
    pub total_height: f32,
    pub has_header: bool,
}

impl PageLayout {
    /// Whether the page holds no sections. On its own this is page 1 of an
    /// empty document; in a longer layout it is a page 1 holding only the
    /// header.
    pub fn is_placeholder(&self) -> bool {
        self.sections.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackLimits {
    pub usable_height: f32,
    pub header_height: f32,
    pub section_spacing: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Page builder
// ────────────────────────────────────────────────────────────────────────────

struct PageBuilder {
    page_number: usize,
    sections: Vec<PageSection>,
    total_height: f32,
    has_header: bool,
}

impl PageBuilder {
    fn first(limits: &PackLimits) -> Self {
        Self {
            page_number: 1,
            sections: Vec::new(),
            total_height: limits.header_height + limits.section_spacing,
            has_header: true,
        }
    }

    fn blank(page_number: usize) -> Self {
        Self {
            page_number,
            sections: Vec::new(),
            total_height: 0.0,
            has_header: false,
        }
    }

    fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Whether content that misses this page should move on to the next one.
    /// `fits_blank` says whether a blank page would take (some of) it.
    fn should_close(&self, fits_blank: bool) -> bool {
        !self.is_empty() || (self.has_header && fits_blank)
    }

    fn fits(&self, height: f32, limits: &PackLimits) -> bool {
        self.total_height + height + limits.section_spacing <= limits.usable_height
    }

    fn remaining(&self, limits: &PackLimits) -> f32 {
        (limits.usable_height - self.total_height - limits.section_spacing).max(0.0)
    }

    fn push(&mut self, section: PageSection, limits: &PackLimits) {
        self.total_height += section.height + limits.section_spacing;
        self.sections.push(section);
    }

    fn finish(self) -> PageLayout {
        PageLayout {
            page_number: self.page_number,
            sections: self.sections,
            total_height: self.total_height,
            has_header: self.has_header,
        }
    }
}

/// Room for content on a page without a header or sections.
fn blank_room(limits: &PackLimits) -> f32 {
    (limits.usable_height - limits.section_spacing).max(0.0)
}

/// Closes the current page and opens the next blank one in its place.
fn close_page(current: &mut PageBuilder, pages: &mut Vec<PageLayout>) {
    let next = PageBuilder::blank(current.page_number + 1);
    pages.push(std::mem::replace(current, next).finish());
}

// ────────────────────────────────────────────────────────────────────────────
// Packing
// ────────────────────────────────────────────────────────────────────────────

/// Packs sections, in order, onto pages. Always returns at least one page.
pub fn pack(sections: &[SectionMeasurement], limits: &PackLimits) -> Vec<PageLayout> {
    let mut pages = Vec::new();
    let mut current = PageBuilder::first(limits);

    for section in sections {
        place_section(section, limits, &mut current, &mut pages);
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current.finish());
    }
    pages
}

fn place_section(
    section: &SectionMeasurement,
    limits: &PackLimits,
    current: &mut PageBuilder,
    pages: &mut Vec<PageLayout>,
) {
    let total = section.items.len();
    let mut start = 0usize;

    loop {
        let height = section.fragment_height(start, total);
        if current.fits(height, limits) {
            current.push(fragment(section, start, total), limits);
            return;
        }

        let rest = &section.items[start..];
        if section.can_split && rest.len() >= 2 {
            match split(section, rest, current.remaining(limits)) {
                Some(s) => {
                    let end = start + s.split_index;
                    current.push(fragment(section, start, end), limits);
                    close_page(current, pages);
                    start = end;
                    continue;
                }
                None if current.should_close(
                    fit_count(section.overhead(), rest, blank_room(limits)) > 0,
                ) =>
                {
                    close_page(current, pages);
                    continue;
                }
                None => {
                    // Not one entry fits here or on a blank page: force a
                    // single entry out so the remainder can make progress.
                    if fit_count(section.overhead(), rest, current.remaining(limits)) == 0 {
                        let end = start + 1;
                        current.push(fragment(section, start, end), limits);
                        close_page(current, pages);
                        start = end;
                        continue;
                    }
                }
            }
        } else if current.should_close(height <= blank_room(limits)) {
            close_page(current, pages);
            continue;
        }

        // Oversized content on a page with no other sections on it.
        current.push(fragment(section, start, total), limits);
        return;
    }
}

/// Builds the page entry for items `start..end` of `section`.
fn fragment(section: &SectionMeasurement, start: usize, end: usize) -> PageSection {
    let total = section.items.len();
    let ids = section.items[start..end].iter().map(|i| i.id).collect();
    let is_partial = !(start == 0 && end == total);
    PageSection {
        section_id: section.section_id,
        height: section.fragment_height(start, end),
        items: ids,
        is_partial,
        start_index: is_partial.then_some(start),
        end_index: is_partial.then(|| end.saturating_sub(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn limits(usable_height: f32, header_height: f32, section_spacing: f32) -> PackLimits {
        PackLimits {
            usable_height,
            header_height,
            section_spacing,
        }
    }

    fn text_section(key: SectionKey, height: f32) -> SectionMeasurement {
        SectionMeasurement {
            section_id: key,
            height,
            can_split: false,
            items: vec![],
        }
    }

    fn list_section(key: SectionKey, overhead: f32, heights: &[f32]) -> SectionMeasurement {
        let items: Vec<ItemMeasurement> = heights
            .iter()
            .map(|&height| ItemMeasurement {
                id: Uuid::new_v4(),
                height,
            })
            .collect();
        SectionMeasurement {
            section_id: key,
            height: overhead + heights.iter().sum::<f32>(),
            can_split: true,
            items,
        }
    }

    fn scaled(sections: &[SectionMeasurement], factor: f32) -> Vec<SectionMeasurement> {
        sections
            .iter()
            .map(|s| SectionMeasurement {
                height: s.height * factor,
                items: s
                    .items
                    .iter()
                    .map(|i| ItemMeasurement {
                        id: i.id,
                        height: i.height * factor,
                    })
                    .collect(),
                ..s.clone()
            })
            .collect()
    }

    /// Concatenated entry ids per section across every page.
    fn ids_by_section(pages: &[PageLayout]) -> HashMap<SectionKey, Vec<Uuid>> {
        let mut map: HashMap<SectionKey, Vec<Uuid>> = HashMap::new();
        for page in pages {
            for section in &page.sections {
                map.entry(section.section_id)
                    .or_default()
                    .extend(section.items.iter().copied());
            }
        }
        map
    }

    fn assert_page_invariants(sections: &[SectionMeasurement], pages: &[PageLayout]) {
        assert!(!pages.is_empty(), "packer must emit at least one page");
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.page_number, i + 1);
            assert_eq!(page.has_header, i == 0, "only page 1 carries the header");
            // Page 1 may hold only the header when its first section moved on.
            if !sections.is_empty() && (i > 0 || pages.len() == 1) {
                assert!(!page.sections.is_empty(), "page {} is empty", page.page_number);
            }
        }
        let by_section = ids_by_section(pages);
        for section in sections {
            let expected: Vec<Uuid> = section.items.iter().map(|i| i.id).collect();
            let got = by_section.get(&section.section_id).cloned().unwrap_or_default();
            assert_eq!(got, expected, "entries of {} lost or reordered", section.section_id);
        }
    }

    // ── reference scenario ──────────────────────────────────────────────────

    #[test]
    fn test_summary_and_six_experience_entries() {
        let sections = vec![
            text_section(SectionKey::Summary, 80.0),
            list_section(SectionKey::Experience, 60.0, &[150.0; 6]),
        ];
        let pages = pack(&sections, &limits(900.0, 200.0, 0.0));

        assert_eq!(pages.len(), 2);
        assert_page_invariants(&sections, &pages);

        let first = &pages[0].sections[1];
        assert_eq!(first.section_id, SectionKey::Experience);
        assert!(first.is_partial);
        assert_eq!(first.start_index, Some(0));
        assert_eq!(first.end_index, Some(2));
        assert_eq!(first.height, 60.0 + 450.0);

        let second = &pages[1].sections[0];
        assert!(second.is_partial);
        assert_eq!(second.start_index, Some(3));
        assert_eq!(second.end_index, Some(5));
        assert_eq!(second.height, 60.0 + 450.0);
        assert!(!pages[1].has_header);
    }

    // ── edge cases ──────────────────────────────────────────────────────────

    #[test]
    fn test_empty_document_yields_single_placeholder_page() {
        let pages = pack(&[], &limits(900.0, 200.0, 16.0));
        assert_eq!(pages.len(), 1);
        assert!(pages[0].has_header);
        assert!(pages[0].is_placeholder());
    }

    #[test]
    fn test_everything_fits_on_one_page() {
        let sections = vec![
            text_section(SectionKey::Summary, 100.0),
            list_section(SectionKey::Education, 50.0, &[60.0, 60.0]),
        ];
        let pages = pack(&sections, &limits(900.0, 200.0, 16.0));
        assert_eq!(pages.len(), 1);
        assert!(pages[0].sections.iter().all(|s| !s.is_partial));
        // 200 + 16 + (100 + 16) + (170 + 16)
        assert_eq!(pages[0].total_height, 518.0);
    }

    #[test]
    fn test_unsplittable_section_moves_to_next_page() {
        let sections = vec![
            text_section(SectionKey::Summary, 500.0),
            text_section(SectionKey::Skills, 300.0),
        ];
        let pages = pack(&sections, &limits(900.0, 200.0, 0.0));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].sections[0].section_id, SectionKey::Skills);
        assert!(!pages[1].sections[0].is_partial);
    }

    #[test]
    fn test_single_entry_list_is_deferred_whole() {
        let sections = vec![
            text_section(SectionKey::Summary, 500.0),
            list_section(SectionKey::Experience, 60.0, &[300.0]),
        ];
        let pages = pack(&sections, &limits(900.0, 200.0, 0.0));
        assert_eq!(pages.len(), 2);
        let moved = &pages[1].sections[0];
        assert!(!moved.is_partial);
        assert_eq!(moved.items.len(), 1);
    }

    #[test]
    fn test_zero_fit_defers_whole_section() {
        // 200 header + 600 summary leaves 100px: the 60px title fits but no 150px entry.
        let sections = vec![
            text_section(SectionKey::Summary, 600.0),
            list_section(SectionKey::Experience, 60.0, &[150.0, 150.0, 150.0]),
        ];
        let pages = pack(&sections, &limits(900.0, 200.0, 0.0));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].sections.len(), 1);
        assert!(!pages[1].sections[0].is_partial);
    }

    #[test]
    fn test_long_section_spans_many_pages() {
        let sections = vec![list_section(SectionKey::Projects, 40.0, &[100.0; 30])];
        let pages = pack(&sections, &limits(900.0, 200.0, 16.0));
        assert!(pages.len() >= 4);
        assert_page_invariants(&sections, &pages);
        let middle = &pages[1].sections[0];
        assert!(middle.is_partial);
        assert!(middle.start_index.unwrap() > 0);
        assert!(middle.end_index.unwrap() < 29);
    }

    #[test]
    fn test_oversized_unsplittable_section_is_placed_not_dropped() {
        let sections = vec![
            text_section(SectionKey::Summary, 100.0),
            text_section(SectionKey::PersonalStatement, 2500.0),
            text_section(SectionKey::Skills, 50.0),
        ];
        let pages = pack(&sections, &limits(900.0, 200.0, 0.0));
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].sections.len(), 1);
        assert!(pages[1].total_height > 900.0);
        assert_page_invariants(&sections, &pages);
    }

    #[test]
    fn test_oversized_header_moves_first_section_on() {
        let sections = vec![text_section(SectionKey::Summary, 100.0)];
        let pages = pack(&sections, &limits(300.0, 400.0, 0.0));
        assert_eq!(pages.len(), 2);
        assert!(pages[0].sections.is_empty());
        assert_eq!(pages[1].sections[0].section_id, SectionKey::Summary);
        assert_page_invariants(&sections, &pages);
    }

    #[test]
    fn test_section_that_fits_a_blank_page_is_not_forced_under_the_header() {
        // 100 + 16 + 900 + 16 overflows 989, but 900 + 16 fits a fresh page.
        let sections = vec![text_section(SectionKey::PersonalStatement, 900.0)];
        let pages = pack(&sections, &limits(989.0, 100.0, 16.0));
        assert_eq!(pages.len(), 2);
        assert!(pages[0].has_header);
        assert!(pages[0].sections.is_empty());
        assert_eq!(pages[1].sections[0].section_id, SectionKey::PersonalStatement);
        assert!(pages[1].total_height <= 989.0);
        assert_page_invariants(&sections, &pages);
    }

    #[test]
    fn test_list_with_no_entry_fitting_under_header_moves_whole() {
        // 857px left under the header: 40 + 900 misses, but the whole list fits page 2.
        let sections = vec![list_section(SectionKey::Experience, 40.0, &[900.0, 20.0])];
        let pages = pack(&sections, &limits(989.0, 100.0, 16.0));
        assert_eq!(pages.len(), 2);
        assert!(pages[0].sections.is_empty());
        assert!(!pages[1].sections[0].is_partial);
        assert!(pages[1].total_height <= 989.0);
        assert_page_invariants(&sections, &pages);
    }

    #[test]
    fn test_content_taller_than_any_page_stays_under_the_header() {
        let sections = vec![text_section(SectionKey::Summary, 500.0)];
        let pages = pack(&sections, &limits(300.0, 400.0, 0.0));
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].sections.len(), 1);
    }

    #[test]
    fn test_entry_taller_than_page_is_forced_through() {
        let sections = vec![list_section(SectionKey::Experience, 50.0, &[2000.0, 100.0])];
        let pages = pack(&sections, &limits(900.0, 200.0, 0.0));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].sections[0].end_index, Some(0));
        assert_eq!(pages[1].sections[0].start_index, Some(1));
        assert_page_invariants(&sections, &pages);
    }

    // ── properties ──────────────────────────────────────────────────────────

    fn mixed_document() -> Vec<SectionMeasurement> {
        vec![
            text_section(SectionKey::Summary, 90.0),
            list_section(SectionKey::Experience, 48.0, &[140.0, 220.0, 95.0, 180.0, 160.0]),
            list_section(SectionKey::Education, 48.0, &[70.0, 70.0]),
            text_section(SectionKey::Skills, 64.0),
            list_section(SectionKey::Projects, 48.0, &[120.0, 60.0, 310.0, 80.0]),
            list_section(SectionKey::References, 48.0, &[58.0]),
        ]
    }

    #[test]
    fn test_completeness_and_no_blank_pages_for_any_height() {
        let sections = mixed_document();
        let mut usable = 150.0;
        while usable <= 2400.0 {
            let pages = pack(&sections, &limits(usable, 120.0, 12.0));
            assert_page_invariants(&sections, &pages);
            usable += 25.0;
        }
    }

    #[test]
    fn test_packing_is_deterministic() {
        let sections = mixed_document();
        let l = limits(700.0, 150.0, 16.0);
        assert_eq!(pack(&sections, &l), pack(&sections, &l));
    }

    #[test]
    fn test_scaling_heights_never_reduces_page_count() {
        let sections = vec![
            text_section(SectionKey::Summary, 200.0),
            list_section(SectionKey::Experience, 50.0, &[100.0; 8]),
            text_section(SectionKey::Skills, 300.0),
        ];
        let l = limits(1000.0, 100.0, 0.0);
        let counts: Vec<usize> = [1.0, 1.5, 2.0, 3.0]
            .iter()
            .map(|&f| pack(&scaled(&sections, f), &l).len())
            .collect();
        assert_eq!(counts, vec![2, 3, 4, 6]);
        assert!(counts.windows(2).all(|w| w[1] >= w[0]));
    }
}
