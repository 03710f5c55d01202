//! Page-range reconciliation.
//!
//! Outer-joins annotation rows and extracted token rows on
//! `(original_volume_id, sequence)`, so every page known to either side appears
//! exactly once, then propagates issue metadata across each volume's page
//! sequence with a forward fill followed by a back-fill.

/// Generic nearest-neighbor fill.
pub mod fill;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::constants::columns::{LINK, MAGAZINE_TITLE, TITLE, VOLUME_ID};
use crate::data::{AnnotationRow, IssueMeta, MergedPageRow, PageTokenRow, PageType, TokenEntry};
use crate::errors::JoinConflict;
use crate::types::{Sequence, VolumeId};

pub use fill::{FillDirection, Overlay, fill_both, fill_nearest};

/// Merged pages plus the join conflicts resolved in favor of the annotation side.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reconciliation {
    /// One row per distinct `(original_volume_id, sequence)`, sorted by that key.
    pub pages: Vec<MergedPageRow>,
    /// Fields where both sides disagreed.
    pub conflicts: Vec<JoinConflict>,
}

#[derive(Default)]
struct PageSlot<'a> {
    annotation: Option<&'a AnnotationRow>,
    token_meta: Option<&'a PageTokenRow>,
    tokens: Vec<TokenEntry>,
}

/// Merge annotation and token rows page by page.
///
/// Pages without an annotation become `content` with empty notes; pages without
/// tokens carry no token entries. Issue metadata is filled per volume in
/// sequence order. Where both sides define the same metadata field with
/// different values, the annotation value wins and a [`JoinConflict`] is
/// recorded.
pub fn reconcile(annotations: &[AnnotationRow], tokens: &[PageTokenRow]) -> Reconciliation {
    let mut slots: BTreeMap<(VolumeId, Sequence), PageSlot<'_>> = BTreeMap::new();

    for row in tokens {
        let slot = slots
            .entry((row.original_volume_id.clone(), row.sequence))
            .or_default();
        slot.token_meta.get_or_insert(row);
        slot.tokens.push(TokenEntry {
            token: row.token.clone(),
            part_of_speech: row.part_of_speech.clone(),
            count: row.count,
            section: row.section.clone(),
        });
    }

    for row in annotations {
        let slot = slots
            .entry((row.original_volume_id.clone(), row.page_number))
            .or_default();
        if slot.annotation.is_some() {
            warn!(
                "[serials:reconcile] volume '{}' page {} annotated twice; keeping the later row",
                row.original_volume_id, row.page_number
            );
        }
        slot.annotation = Some(row);
    }

    let mut conflicts = Vec::new();
    let mut pages: Vec<MergedPageRow> = slots
        .into_iter()
        .map(|((volume, sequence), slot)| merge_slot(volume, sequence, slot, &mut conflicts))
        .collect();

    for conflict in &conflicts {
        warn!(
            "[serials:reconcile] volume '{}' page {}: {} differs (annotation '{}', tokens '{}'); keeping annotation",
            conflict.volume,
            conflict.sequence,
            conflict.field,
            conflict.annotation_value,
            conflict.token_value
        );
    }

    let mut start = 0;
    while start < pages.len() {
        let volume = pages[start].original_volume_id.clone();
        let end = pages[start..]
            .iter()
            .position(|page| page.original_volume_id != volume)
            .map(|offset| start + offset)
            .unwrap_or(pages.len());
        fill_both(&mut pages[start..end], |page| &mut page.meta);
        debug!(
            "[serials:reconcile] volume '{}' merged {} pages",
            volume,
            end - start
        );
        start = end;
    }

    Reconciliation { pages, conflicts }
}

fn merge_slot(
    volume: VolumeId,
    sequence: Sequence,
    slot: PageSlot<'_>,
    conflicts: &mut Vec<JoinConflict>,
) -> MergedPageRow {
    let mut meta = slot
        .token_meta
        .map(|row| IssueMeta {
            volume_id: non_empty(&row.volume_id),
            link: non_empty(&row.link),
            magazine_title: non_empty(&row.magazine_title),
            title: non_empty(&row.title),
            ..IssueMeta::default()
        })
        .unwrap_or_default();

    let (type_of_page, notes) = match slot.annotation {
        Some(annotation) => {
            let annotated = annotation_meta(annotation);
            record_conflicts(&volume, sequence, &annotated, &meta, conflicts);
            meta.overlay(&annotated);
            (
                annotation.type_of_page.clone().unwrap_or_default(),
                annotation.notes.clone(),
            )
        }
        None => (PageType::Content, String::new()),
    };

    MergedPageRow {
        original_volume_id: volume,
        sequence,
        type_of_page,
        notes,
        tokens: slot.tokens,
        meta,
    }
}

/// Issue metadata contributed by an annotation row.
///
/// Annotation columns named like token-side fields are folded into those fields.
fn annotation_meta(annotation: &AnnotationRow) -> IssueMeta {
    let mut meta = IssueMeta {
        dates: Some(annotation.dates.clone()),
        start_issue: Some(annotation.start_issue),
        end_issue: Some(annotation.end_issue),
        ..IssueMeta::default()
    };
    for (column, value) in &annotation.extra {
        let value = value.as_deref().and_then(non_empty);
        match column.as_str() {
            VOLUME_ID => meta.volume_id = value,
            LINK => meta.link = value,
            MAGAZINE_TITLE => meta.magazine_title = value,
            TITLE => meta.title = value,
            _ => {
                meta.extra.insert(column.clone(), value);
            }
        }
    }
    meta
}

fn record_conflicts(
    volume: &str,
    sequence: Sequence,
    annotated: &IssueMeta,
    token_side: &IssueMeta,
    conflicts: &mut Vec<JoinConflict>,
) {
    let pairs = [
        (VOLUME_ID, &annotated.volume_id, &token_side.volume_id),
        (LINK, &annotated.link, &token_side.link),
        (MAGAZINE_TITLE, &annotated.magazine_title, &token_side.magazine_title),
        (TITLE, &annotated.title, &token_side.title),
    ];
    for (field, annotation_value, token_value) in pairs {
        if let (Some(annotation_value), Some(token_value)) = (annotation_value, token_value) {
            if annotation_value != token_value {
                conflicts.push(JoinConflict {
                    volume: volume.to_string(),
                    sequence,
                    field: field.to_string(),
                    annotation_value: annotation_value.clone(),
                    token_value: token_value.clone(),
                });
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
