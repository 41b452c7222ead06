//! Section splitter — decides which entries of a list section stay on the
//! current page and which move on, purely from item ids and heights.
//!
//! The split is computed on data, never on rendered markup: each resulting
//! fragment is re-rendered from the model by the page renderer.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::pagination::packer::{ItemMeasurement, SectionMeasurement};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// Number of items (from the front of the slice) that stay on the current page.
    pub split_index: usize,
    pub first_part_ids: Vec<Uuid>,
    pub remaining_ids: Vec<Uuid>,
}

/// Splits `items` so that the section overhead plus the first part fit in
/// `available_height`.
///
/// Returns `None` (do not split, defer the whole section) when
/// there are fewer than two items, when not even the first item fits after the
/// overhead, or when everything fits (no split needed). Forward-fill only: the
/// first item that would overflow ends the first part.
pub fn split(
    section: &SectionMeasurement,
    items: &[ItemMeasurement],
    available_height: f32,
) -> Option<Split> {
    if items.len() < 2 {
        return None;
    }

    let k = fit_count(section.overhead(), items, available_height);
    if k == 0 || k == items.len() {
        return None;
    }

    let first_part_ids: Vec<Uuid> = items[..k].iter().map(|i| i.id).collect();
    let remaining_ids: Vec<Uuid> = items[k..].iter().map(|i| i.id).collect();

    if !is_partition(items, &first_part_ids, &remaining_ids) {
        warn!(
            section = %section.section_id,
            items = items.len(),
            "Split would not partition the entry list; deferring section unsplit"
        );
        return None;
    }

    Some(Split {
        split_index: k,
        first_part_ids,
        remaining_ids,
    })
}

/// Number of leading items that fit in `available_height` after reserving `overhead`.
pub fn fit_count(overhead: f32, items: &[ItemMeasurement], available_height: f32) -> usize {
    let mut used = overhead;
    if used > available_height {
        return 0;
    }
    let mut count = 0;
    for item in items {
        if used + item.height > available_height {
            break;
        }
        used += item.height;
        count += 1;
    }
    count
}

/// `first ++ remaining` must reproduce `items` exactly, with every id unique.
pub fn is_partition(items: &[ItemMeasurement], first: &[Uuid], remaining: &[Uuid]) -> bool {
    if first.len() + remaining.len() != items.len() {
        return false;
    }
    let in_order = items
        .iter()
        .map(|i| &i.id)
        .eq(first.iter().chain(remaining.iter()));
    let mut seen = HashSet::with_capacity(items.len());
    in_order && items.iter().all(|i| seen.insert(i.id))
}
