//! Issue boundary cutting.
//!
//! Trims a reconciled volume to the pages that belong to its issue(s), using the
//! annotated boundary markers. Which markers are consulted depends on the
//! title's [`BoundaryVariant`].

use std::ops::RangeInclusive;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::BoundaryVariant;
use crate::data::{MergedPageRow, PageType};
use crate::errors::CorpusError;
use crate::types::Sequence;

/// Cut one volume's pages with the given variant.
///
/// `pages` must belong to a single volume and be sorted by sequence, as
/// produced by [`crate::reconcile::reconcile`].
pub fn cut_issue(
    volume: &str,
    pages: Vec<MergedPageRow>,
    variant: BoundaryVariant,
) -> Result<Vec<MergedPageRow>, CorpusError> {
    let before = pages.len();
    let cut = match variant {
        BoundaryVariant::CoverToc => cut_cover_toc(volume, pages)?,
        BoundaryVariant::SplitMarker => cut_split_marker(volume, pages)?,
    };
    debug!(
        "[serials:boundary] volume '{}' kept {} of {} pages ({})",
        volume,
        cut.len(),
        before,
        variant.label()
    );
    Ok(cut)
}

/// Keep from one page before the first cover (or TOC) through the last `end_of_issue`,
/// then drop every `duplicates` range.
pub fn cut_cover_toc(
    volume: &str,
    pages: Vec<MergedPageRow>,
) -> Result<Vec<MergedPageRow>, CorpusError> {
    let last_page = last_sequence_of(&pages, &PageType::EndOfIssue);
    if last_page.is_none() {
        warn!(
            "[serials:boundary] volume '{}' has no end_of_issue marker; keeping trailing pages",
            volume
        );
    }
    let pages: Vec<MergedPageRow> = match last_page {
        Some(last) => pages.into_iter().filter(|page| page.sequence <= last).collect(),
        None => pages,
    };

    let first_page = first_sequence_of(&pages, &PageType::CoverPage)
        .or_else(|| first_sequence_of(&pages, &PageType::Toc))
        .ok_or_else(|| CorpusError::MissingBoundary {
            volume: volume.to_string(),
            variant: BoundaryVariant::CoverToc.label().to_string(),
        })?;
    let keep_from = first_page.saturating_sub(1);
    let pages = pages
        .into_iter()
        .filter(|page| page.sequence >= keep_from)
        .collect();

    remove_duplicates(volume, pages)
}

/// Per issue (`start_issue`), keep only pages after the first `split_issue` marker.
///
/// Issues without a marker keep every page. A volume with no boundary marker of
/// any kind is rejected, since its issues cannot be told apart.
pub fn cut_split_marker(
    volume: &str,
    pages: Vec<MergedPageRow>,
) -> Result<Vec<MergedPageRow>, CorpusError> {
    if !pages.iter().any(|page| page.type_of_page.is_boundary_marker()) {
        return Err(CorpusError::MissingBoundary {
            volume: volume.to_string(),
            variant: BoundaryVariant::SplitMarker.label().to_string(),
        });
    }

    let mut issues: IndexMap<_, Vec<MergedPageRow>> = IndexMap::new();
    for page in pages {
        issues.entry(page.meta.start_issue).or_default().push(page);
    }

    let mut kept = Vec::new();
    for (_, issue_pages) in issues {
        match first_sequence_of(&issue_pages, &PageType::SplitIssue) {
            Some(split) => kept.extend(issue_pages.into_iter().filter(|page| page.sequence > split)),
            None => kept.extend(issue_pages),
        }
    }
    Ok(kept)
}

/// Drop pages inside every `duplicates` range (`notes` = `<start>-<end>`, inclusive).
///
/// Only `duplicates` rows with notes carry a range. Blank-noted rows are the
/// forward-filled continuation of a marked row, but at least one row must carry one.
pub fn remove_duplicates(
    volume: &str,
    pages: Vec<MergedPageRow>,
) -> Result<Vec<MergedPageRow>, CorpusError> {
    let marked: Vec<&MergedPageRow> = pages
        .iter()
        .filter(|page| page.type_of_page == PageType::Duplicates)
        .collect();
    if marked.is_empty() {
        return Ok(pages);
    }
    let ranges = marked
        .iter()
        .filter(|page| !page.notes.trim().is_empty())
        .map(|page| {
            parse_duplicate_range(&page.notes).ok_or_else(|| CorpusError::MalformedDuplicateRange {
                volume: volume.to_string(),
                notes: page.notes.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ranges.is_empty() {
        return Err(CorpusError::MalformedDuplicateRange {
            volume: volume.to_string(),
            notes: String::new(),
        });
    }
    Ok(pages
        .into_iter()
        .filter(|page| !ranges.iter().any(|range| range.contains(&page.sequence)))
        .collect())
}

/// Parse `"<start>-<end>"` into an inclusive range; surrounding whitespace is ignored.
pub fn parse_duplicate_range(notes: &str) -> Option<RangeInclusive<Sequence>> {
    let (start, end) = notes.trim().split_once('-')?;
    let start = start.trim().parse::<Sequence>().ok()?;
    let end = end.trim().parse::<Sequence>().ok()?;
    (start <= end).then_some(start..=end)
}

fn first_sequence_of(pages: &[MergedPageRow], page_type: &PageType) -> Option<Sequence> {
    pages
        .iter()
        .find(|page| &page.type_of_page == page_type)
        .map(|page| page.sequence)
}

fn last_sequence_of(pages: &[MergedPageRow], page_type: &PageType) -> Option<Sequence> {
    pages
        .iter()
        .rev()
        .find(|page| &page.type_of_page == page_type)
        .map(|page| page.sequence)
}
