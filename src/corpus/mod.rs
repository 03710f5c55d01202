//! Corpus assembly.
//!
//! Concatenates cut volumes into one page table under canonical corpus column
//! names, applies the declarative corrections, derives `datetime`, and rolls
//! pages up into issues.

/// Known annotation corrections.
pub mod corrections;
/// Page-to-issue rollup.
pub mod rollup;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use tracing::info;

use crate::constants::columns::{ISSUE_NUMBER, VOLUMES};
use crate::constants::dates::{ISO_DATE, ISO_DATETIME};
use crate::data::{CorpusPageRow, MergedPageRow};
use crate::errors::CorpusError;

pub use corrections::{Correction, CorrectionMatch, FieldOverrides, apply_corrections, known_corrections};
pub use rollup::{IssueKey, rollup_issues};

impl From<MergedPageRow> for CorpusPageRow {
    fn from(page: MergedPageRow) -> Self {
        let mut extra = page.meta.extra;
        let volume_number = extra.shift_remove(VOLUMES).flatten().unwrap_or_default();
        let issue_number = extra.shift_remove(ISSUE_NUMBER).flatten().unwrap_or_default();
        let start_issue = format_date(page.meta.start_issue);
        let datetime = derive_datetime(&start_issue);
        Self {
            cleaned_magazine_title: page.meta.magazine_title.unwrap_or_default(),
            ht_generated_title: page.meta.title.unwrap_or_default(),
            volume_number,
            volume_id: page.meta.volume_id.unwrap_or_default(),
            hdl_link: page.meta.link.unwrap_or_default(),
            cleaned_volume: page.original_volume_id,
            dates: page.meta.dates.unwrap_or_default(),
            issue_number,
            start_issue,
            end_issue: format_date(page.meta.end_issue),
            datetime,
            type_of_page: page.type_of_page,
            sequence: page.sequence,
            notes: page.notes,
            tokens: page.tokens,
            extra: extra
                .into_iter()
                .map(|(column, value)| (column, value.unwrap_or_default()))
                .collect::<IndexMap<_, _>>(),
        }
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format(ISO_DATE).to_string())
        .unwrap_or_default()
}

/// Parse an ISO `start_issue` (optionally with a midnight time part).
///
/// Unparseable values yield `None` instead of an error.
pub fn derive_datetime(start_issue: &str) -> Option<NaiveDate> {
    let value = start_issue.trim();
    NaiveDate::parse_from_str(value, ISO_DATE)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, ISO_DATETIME)
                .ok()
                .map(|datetime| datetime.date())
        })
}

/// Concatenate cut volumes, apply corrections, and derive `datetime`.
///
/// Fails with `EmptyCorpus` when no volume contributed any page.
pub fn assemble_corpus(
    volumes: Vec<Vec<MergedPageRow>>,
    corrections: &[Correction],
) -> Result<Vec<CorpusPageRow>, CorpusError> {
    let volume_count = volumes.len();
    let pages: Vec<CorpusPageRow> = volumes
        .into_iter()
        .flatten()
        .map(CorpusPageRow::from)
        .collect();
    finish_corpus(pages, corrections, volume_count)
}

/// Apply corrections to an already-concatenated page table and re-derive `datetime`.
pub fn finish_corpus(
    mut pages: Vec<CorpusPageRow>,
    corrections: &[Correction],
    volume_count: usize,
) -> Result<Vec<CorpusPageRow>, CorpusError> {
    if pages.is_empty() {
        return Err(CorpusError::EmptyCorpus(format!(
            "{} volumes contributed no pages",
            volume_count
        )));
    }
    apply_corrections(&mut pages, corrections);
    for page in &mut pages {
        page.datetime = derive_datetime(&page.start_issue);
    }
    let undated = pages.iter().filter(|page| page.datetime.is_none()).count();
    info!(
        "[serials:corpus] assembled {} pages from {} volumes ({} without datetime)",
        pages.len(),
        volume_count,
        undated
    );
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{IssueMeta, PageType};

    fn merged(volume: &str, sequence: u32, start: Option<NaiveDate>) -> MergedPageRow {
        let mut extra = IndexMap::new();
        extra.insert("volumes".to_string(), Some("3".to_string()));
        extra.insert("issue_number".to_string(), None);
        extra.insert("editor".to_string(), Some("Lutfi".to_string()));
        MergedPageRow {
            original_volume_id: volume.into(),
            sequence,
            type_of_page: PageType::Content,
            notes: String::new(),
            tokens: Vec::new(),
            meta: IssueMeta {
                volume_id: Some("mdp.1".into()),
                link: Some("https://hdl.handle.net/2027/mdp.1".into()),
                magazine_title: Some("arab_observer".into()),
                title: Some("arab_observer_v.3".into()),
                dates: Some("June 1965".into()),
                start_issue: start,
                end_issue: start,
                extra,
            },
        }
    }

    #[test]
    fn derive_datetime_tolerates_bad_values() {
        assert_eq!(derive_datetime("1965-06-07"), NaiveDate::from_ymd_opt(1965, 6, 7));
        assert_eq!(
            derive_datetime("1965-06-07 00:00:00"),
            NaiveDate::from_ymd_opt(1965, 6, 7)
        );
        assert_eq!(derive_datetime(""), None);
        assert_eq!(derive_datetime("June 1965"), None);
    }

    #[test]
    fn merged_pages_take_canonical_names() {
        let page = CorpusPageRow::from(merged("v.3", 1, NaiveDate::from_ymd_opt(1965, 6, 1)));
        assert_eq!(page.cleaned_magazine_title, "arab_observer");
        assert_eq!(page.ht_generated_title, "arab_observer_v.3");
        assert_eq!(page.hdl_link, "https://hdl.handle.net/2027/mdp.1");
        assert_eq!(page.cleaned_volume, "v.3");
        assert_eq!(page.volume_number, "3");
        assert_eq!(page.issue_number, "");
        assert_eq!(page.start_issue, "1965-06-01");
        assert_eq!(page.extra.get("editor").map(String::as_str), Some("Lutfi"));
        assert!(!page.extra.contains_key("volumes"));
    }

    #[test]
    fn assembly_concatenates_and_tolerates_missing_dates() {
        let corpus = assemble_corpus(
            vec![
                vec![merged("v.3", 1, NaiveDate::from_ymd_opt(1965, 6, 1))],
                vec![merged("v.4", 1, None), merged("v.4", 2, None)],
            ],
            &[],
        )
        .unwrap();
        assert_eq!(corpus.len(), 3);
        assert!(corpus[0].datetime.is_some());
        assert!(corpus[1].datetime.is_none());
    }

    #[test]
    fn empty_assembly_is_fatal() {
        assert!(matches!(
            assemble_corpus(vec![Vec::new()], &[]),
            Err(CorpusError::EmptyCorpus(_))
        ));
    }

    #[test]
    fn corrected_start_issue_updates_datetime() {
        let page = merged("v.3", 328, NaiveDate::from_ymd_opt(1965, 6, 7));
        let corpus = assemble_corpus(vec![vec![page]], &known_corrections()).unwrap();
        assert_eq!(corpus[0].start_issue, "1965-06-14");
        assert_eq!(corpus[0].datetime, NaiveDate::from_ymd_opt(1965, 6, 14));
        assert_eq!(corpus[0].type_of_page, PageType::CoverPage);
    }
}
