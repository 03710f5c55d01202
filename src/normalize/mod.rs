//! Annotation normalization.
//!
//! Turns a hand-curated annotation table (one row per physical page, arbitrary
//! header casing) into typed [`AnnotationRow`]s:
//!
//! 1. Headers become snake_case (`Type of Page` -> `type_of_page`).
//! 2. Missing `notes` become empty strings; every other missing cell inherits
//!    the value above it.
//! 3. Every distinct `dates` string is parsed once into `start_issue` /
//!    `end_issue`, so all pages of an issue carry identical dates.

/// Issue date-range parsing.
pub mod date_helpers;

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::DateReplacement;
use crate::constants::columns::{
    DATES, NOTES, ORIGINAL_VOLUME_ID_ALIASES, PAGE_NUMBER_ALIASES, TYPE_OF_PAGE,
};
use crate::data::{AnnotationRow, PageType};
use crate::errors::CorpusError;
use crate::table::RawTable;
use crate::utils::snake_case_header;

pub use date_helpers::{IssueDates, parse_issue_dates};

/// Apply literal replacements to the raw dates column (e.g. `Summer` -> `July`).
///
/// Runs before [`clean_annotations`]; the header may still be in its original casing.
pub fn prenormalize_dates(table: &mut RawTable, replacements: &[DateReplacement]) {
    let Some(col) = table
        .headers
        .iter()
        .position(|header| snake_case_header(header) == DATES)
    else {
        return;
    };
    for row in &mut table.rows {
        if let Some(value) = row[col].as_mut() {
            for replacement in replacements {
                if value.contains(&replacement.from) {
                    *value = value.replace(&replacement.from, &replacement.to);
                }
            }
        }
    }
}

/// Clean an annotation table and derive issue dates.
///
/// Rows whose `dates` is still missing after forward fill (leading rows above
/// the first dated page) carry no issue and are dropped.
pub fn clean_annotations(mut table: RawTable) -> Result<Vec<AnnotationRow>, CorpusError> {
    table.normalize_headers();
    let dates_col = table.require_column(&[DATES])?;
    let volume_col = table.require_column(ORIGINAL_VOLUME_ID_ALIASES)?;
    let page_col = table.require_column(PAGE_NUMBER_ALIASES)?;
    let type_col = table.column_index_any(&[TYPE_OF_PAGE]);
    let notes_col = table.column_index_any(&[NOTES]);

    if let Some(col) = notes_col {
        table.fill_missing(col, "");
    }
    let skip: Vec<usize> = notes_col.into_iter().collect();
    table.forward_fill_except(&skip);

    let known = [Some(dates_col), Some(volume_col), Some(page_col), type_col, notes_col];
    let extra_cols: Vec<usize> = (0..table.headers.len())
        .filter(|col| !known.contains(&Some(*col)))
        .collect();

    let mut parsed_dates: HashMap<String, IssueDates> = HashMap::new();
    let mut rows = Vec::with_capacity(table.rows.len());
    let mut undated = 0usize;

    for idx in 0..table.rows.len() {
        let Some(dates) = table.cell(idx, dates_col) else {
            undated += 1;
            continue;
        };
        let dates = dates.trim().to_string();
        let issue = match parsed_dates.get(&dates) {
            Some(issue) => *issue,
            None => {
                let issue = parse_issue_dates(&dates)?;
                debug!(
                    "[serials:normalize] '{}' -> {} .. {}",
                    dates, issue.start_issue, issue.end_issue
                );
                parsed_dates.insert(dates.clone(), issue);
                issue
            }
        };

        let original_volume_id = table
            .cell(idx, volume_col)
            .map(|value| value.trim().to_string())
            .ok_or_else(|| CorpusError::InvalidField {
                table: table.name.clone(),
                column: table.headers[volume_col].clone(),
                row: idx,
                value: String::new(),
            })?;
        let page_number = table.parse_u32(idx, page_col)?;
        let type_of_page = type_col
            .and_then(|col| table.cell(idx, col))
            .map(PageType::parse);
        let notes = notes_col
            .and_then(|col| table.cell(idx, col))
            .unwrap_or_default()
            .to_string();
        let extra: IndexMap<_, _> = extra_cols
            .iter()
            .map(|&col| {
                (
                    table.headers[col].clone(),
                    table.cell(idx, col).map(str::to_string),
                )
            })
            .collect();

        rows.push(AnnotationRow {
            original_volume_id,
            page_number,
            type_of_page,
            dates,
            notes,
            start_issue: issue.start_issue,
            end_issue: issue.end_issue,
            extra,
        });
    }

    if undated > 0 {
        warn!(
            "[serials:normalize] dropped {} undated rows from '{}'",
            undated, table.name
        );
    }
    Ok(rows)
}

/// Pre-normalize dates, then clean the table.
pub fn normalize_annotations(
    mut table: RawTable,
    replacements: &[DateReplacement],
) -> Result<Vec<AnnotationRow>, CorpusError> {
    prenormalize_dates(&mut table, replacements);
    clean_annotations(table)
}
