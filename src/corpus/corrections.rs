//! Declarative corrections for known annotation data-entry errors.
//!
//! Each [`Correction`] names the page it fixes by exact key (title, start
//! issue, sequence) and the fields to overwrite there.

use serde::Deserialize;
use tracing::info;

use crate::constants::corrections::NOT_A_COVER_NOTE;
use crate::data::{CorpusPageRow, PageType};
use crate::types::{Sequence, TitleKey};
use crate::utils::title_matches;

/// Exact keys identifying the page a correction applies to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CorrectionMatch {
    /// Matched against `cleaned_magazine_title` (case- and separator-insensitive).
    pub title_key: TitleKey,
    /// ISO `start_issue` as recorded before correction.
    pub start_issue: String,
    /// Page position within the volume.
    pub sequence: Sequence,
}

/// Field values written onto a matched page; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldOverrides {
    /// New page type.
    pub type_of_page: Option<PageType>,
    /// New annotator notes.
    pub notes: Option<String>,
    /// New ISO start date; `datetime` is re-derived from it.
    pub start_issue: Option<String>,
}

/// One `{match_keys, field_overrides}` correction record.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Correction {
    /// Keys the page must match.
    #[serde(rename = "match")]
    pub match_keys: CorrectionMatch,
    /// Values written onto the matched page.
    #[serde(default)]
    pub overrides: FieldOverrides,
}

impl Correction {
    /// Re-label a page as a cover, optionally moving it to the next issue.
    pub fn relabel_cover(
        title_key: impl Into<TitleKey>,
        start_issue: impl Into<String>,
        sequence: Sequence,
        next_issue: Option<&str>,
    ) -> Self {
        Self {
            match_keys: CorrectionMatch {
                title_key: title_key.into(),
                start_issue: start_issue.into(),
                sequence,
            },
            overrides: FieldOverrides {
                type_of_page: Some(PageType::CoverPage),
                notes: Some(NOT_A_COVER_NOTE.to_string()),
                start_issue: next_issue.map(str::to_string),
            },
        }
    }

    /// True when `page` carries this correction's exact keys.
    pub fn matches(&self, page: &CorpusPageRow) -> bool {
        page.sequence == self.match_keys.sequence
            && page.start_issue == self.match_keys.start_issue
            && title_matches(&page.cleaned_magazine_title, &self.match_keys.title_key)
    }

    fn apply(&self, page: &mut CorpusPageRow) {
        let overrides = &self.overrides;
        if let Some(type_of_page) = &overrides.type_of_page {
            page.type_of_page = type_of_page.clone();
        }
        if let Some(notes) = &overrides.notes {
            page.notes = notes.clone();
        }
        if let Some(start_issue) = &overrides.start_issue {
            page.start_issue = start_issue.clone();
        }
    }
}

/// Corrections for pages known to be misclassified in the curated annotations.
pub fn known_corrections() -> Vec<Correction> {
    vec![
        Correction::relabel_cover("arab_observer", "1965-06-07", 328, Some("1965-06-14")),
        Correction::relabel_cover("afro_asian_bulletin", "1967-06-01", 2, None),
        Correction::relabel_cover("afro_asian_bulletin", "1967-09-01", 4, None),
    ]
}

/// Apply every correction to every page it matches; returns the number of pages changed.
///
/// Matching uses each page's values from before any correction ran, so a
/// correction that moves `start_issue` never triggers another one.
pub fn apply_corrections(pages: &mut [CorpusPageRow], corrections: &[Correction]) -> usize {
    let mut changed = 0;
    for page in pages.iter_mut() {
        let matched: Vec<&Correction> = corrections
            .iter()
            .filter(|correction| correction.matches(page))
            .collect();
        if matched.is_empty() {
            continue;
        }
        for correction in matched {
            correction.apply(page);
        }
        changed += 1;
    }
    if changed > 0 {
        info!("[serials:corpus] applied corrections to {} pages", changed);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn corpus_page(title: &str, start_issue: &str, sequence: Sequence) -> CorpusPageRow {
        CorpusPageRow {
            cleaned_magazine_title: title.into(),
            ht_generated_title: String::new(),
            volume_number: String::new(),
            volume_id: String::new(),
            hdl_link: String::new(),
            cleaned_volume: String::new(),
            dates: String::new(),
            issue_number: String::new(),
            start_issue: start_issue.into(),
            end_issue: String::new(),
            datetime: None,
            type_of_page: PageType::Content,
            sequence,
            notes: String::new(),
            tokens: Vec::new(),
            extra: IndexMap::new(),
        }
    }

    #[test]
    fn known_cover_correction_moves_page_to_next_issue() {
        let mut pages = vec![
            corpus_page("arab_observer", "1965-06-07", 328),
            corpus_page("arab_observer", "1965-06-07", 327),
            corpus_page("afro_asian_bulletin", "1965-06-07", 328),
        ];
        let changed = apply_corrections(&mut pages, &known_corrections());
        assert_eq!(changed, 1);
        assert_eq!(pages[0].type_of_page, PageType::CoverPage);
        assert_eq!(pages[0].start_issue, "1965-06-14");
        assert_eq!(pages[0].notes, NOT_A_COVER_NOTE);
        assert_eq!(pages[1].type_of_page, PageType::Content);
        assert_eq!(pages[2].start_issue, "1965-06-07");
    }

    #[test]
    fn relabel_without_next_issue_keeps_start_issue() {
        let mut pages = vec![corpus_page("afro_asian_bulletin", "1967-09-01", 4)];
        apply_corrections(&mut pages, &known_corrections());
        assert_eq!(pages[0].type_of_page, PageType::CoverPage);
        assert_eq!(pages[0].start_issue, "1967-09-01");
    }

    #[test]
    fn corrections_deserialize_from_json() {
        let correction: Correction = serde_json::from_str(
            r#"{
                "match": {"title_key": "tricontinental", "start_issue": "1968-01-01", "sequence": 9},
                "overrides": {"type_of_page": "toc"}
            }"#,
        )
        .unwrap();
        assert_eq!(correction.match_keys.sequence, 9);
        assert_eq!(correction.overrides.type_of_page, Some(PageType::Toc));
        assert_eq!(correction.overrides.notes, None);
    }
}
