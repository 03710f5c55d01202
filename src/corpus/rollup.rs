use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::info;

use crate::constants::corpus_columns::MISSING_VOLUME_NUMBER;
use crate::data::{CorpusPageRow, IssueRow, PageType};
use crate::errors::CorpusError;

/// Issue-level columns shared by every page of one issue.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IssueKey {
    /// Normalized title slug.
    pub cleaned_magazine_title: String,
    /// Title as generated by the catalog.
    pub ht_generated_title: String,
    /// Volume number; `0` when absent.
    pub volume_number: String,
    /// Repository volume identifier.
    pub volume_id: String,
    /// Persistent handle link.
    pub hdl_link: String,
    /// Annotated volume label.
    pub cleaned_volume: String,
    /// ISO start date.
    pub start_issue: String,
    /// ISO end date.
    pub end_issue: String,
    /// Parsed `start_issue`.
    pub datetime: Option<NaiveDate>,
    /// Free-text issue dates.
    pub dates: String,
    /// Issue number, when annotated.
    pub issue_number: String,
}

impl IssueKey {
    /// Grouping key of `page`; a blank volume number becomes the missing marker.
    pub fn of(page: &CorpusPageRow) -> Self {
        let volume_number = if page.volume_number.trim().is_empty() {
            MISSING_VOLUME_NUMBER.to_string()
        } else {
            page.volume_number.clone()
        };
        Self {
            cleaned_magazine_title: page.cleaned_magazine_title.clone(),
            ht_generated_title: page.ht_generated_title.clone(),
            volume_number,
            volume_id: page.volume_id.clone(),
            hdl_link: page.hdl_link.clone(),
            cleaned_volume: page.cleaned_volume.clone(),
            start_issue: page.start_issue.clone(),
            end_issue: page.end_issue.clone(),
            datetime: page.datetime,
            dates: page.dates.clone(),
            issue_number: page.issue_number.clone(),
        }
    }
}

struct IssueAccumulator {
    type_of_page: PageType,
    sequence: Vec<u32>,
    tokens: Vec<String>,
    part_of_speech: Vec<String>,
    count: Vec<u64>,
    section: Vec<String>,
}

impl IssueAccumulator {
    fn new(type_of_page: PageType) -> Self {
        Self {
            type_of_page,
            sequence: Vec::new(),
            tokens: Vec::new(),
            part_of_speech: Vec::new(),
            count: Vec::new(),
            section: Vec::new(),
        }
    }

    fn push_page(&mut self, page: &CorpusPageRow) {
        if page.tokens.is_empty() {
            self.sequence.push(page.sequence);
            self.part_of_speech.push(String::new());
            self.count.push(0);
            self.section.push(String::new());
            return;
        }
        for entry in &page.tokens {
            self.sequence.push(page.sequence);
            if !entry.token.is_empty() {
                self.tokens.push(entry.token.clone());
            }
            self.part_of_speech.push(entry.part_of_speech.clone());
            self.count.push(entry.count);
            self.section.push(entry.section.clone());
        }
    }

    fn finish(self, key: IssueKey) -> IssueRow {
        IssueRow {
            cleaned_magazine_title: key.cleaned_magazine_title,
            ht_generated_title: key.ht_generated_title,
            volume_number: key.volume_number,
            volume_id: key.volume_id,
            hdl_link: key.hdl_link,
            cleaned_volume: key.cleaned_volume,
            start_issue: key.start_issue,
            end_issue: key.end_issue,
            datetime: key.datetime,
            dates: key.dates,
            issue_number: key.issue_number,
            type_of_page: self.type_of_page,
            sequence: self.sequence,
            token: self.tokens.join(" "),
            part_of_speech: self.part_of_speech,
            count: self.count,
            section: self.section,
        }
    }
}

/// Roll corpus pages up into one row per issue, in first-seen page order.
///
/// `type_of_page` and `sequence` are the only page-level columns not part of
/// the grouping key. Issues whose `datetime` did not parse are kept.
pub fn rollup_issues(pages: &[CorpusPageRow]) -> Result<Vec<IssueRow>, CorpusError> {
    if pages.is_empty() {
        return Err(CorpusError::EmptyCorpus(
            "no corpus pages to roll up into issues".to_string(),
        ));
    }
    let mut issues: IndexMap<IssueKey, IssueAccumulator> = IndexMap::new();
    for page in pages {
        issues
            .entry(IssueKey::of(page))
            .or_insert_with(|| IssueAccumulator::new(page.type_of_page.clone()))
            .push_page(page);
    }
    let rows: Vec<IssueRow> = issues
        .into_iter()
        .map(|(key, accumulator)| accumulator.finish(key))
        .collect();
    info!(
        "[serials:rollup] rolled {} pages into {} issues",
        pages.len(),
        rows.len()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TokenEntry;

    fn entry(token: &str, count: u64) -> TokenEntry {
        TokenEntry {
            token: token.into(),
            part_of_speech: "NN".into(),
            count,
            section: "body".into(),
        }
    }

    fn page(start_issue: &str, sequence: u32, tokens: Vec<TokenEntry>) -> CorpusPageRow {
        CorpusPageRow {
            cleaned_magazine_title: "arab_observer".into(),
            ht_generated_title: "arab_observer_v.3".into(),
            volume_number: String::new(),
            volume_id: "mdp.1".into(),
            hdl_link: "https://hdl.handle.net/2027/mdp.1".into(),
            cleaned_volume: "v.3".into(),
            dates: String::new(),
            issue_number: String::new(),
            start_issue: start_issue.into(),
            end_issue: start_issue.into(),
            datetime: crate::corpus::derive_datetime(start_issue),
            type_of_page: if sequence == 1 {
                PageType::CoverPage
            } else {
                PageType::Content
            },
            sequence,
            notes: String::new(),
            tokens,
            extra: IndexMap::new(),
        }
    }

    #[test]
    fn pages_roll_up_per_issue_in_page_order() {
        let pages = vec![
            page("1965-06-07", 1, vec![entry("nasser", 1)]),
            page("1965-06-07", 2, vec![entry("cairo", 2), entry("", 0), entry("dam", 3)]),
            page("1965-06-14", 3, vec![entry("aswan", 1)]),
        ];
        let issues = rollup_issues(&pages).unwrap();
        assert_eq!(issues.len(), 2);
        let first = &issues[0];
        assert_eq!(first.token, "nasser cairo dam");
        assert_eq!(first.sequence, vec![1, 2, 2, 2]);
        assert_eq!(first.count, vec![1, 2, 0, 3]);
        assert_eq!(first.type_of_page, PageType::CoverPage);
        assert_eq!(first.volume_number, MISSING_VOLUME_NUMBER);
        assert_eq!(issues[1].type_of_page, PageType::Content);
    }

    #[test]
    fn token_less_pages_keep_placeholder_elements() {
        let issues = rollup_issues(&[page("1965-06-07", 1, Vec::new())]).unwrap();
        assert_eq!(issues[0].token, "");
        assert_eq!(issues[0].sequence, vec![1]);
        assert_eq!(issues[0].count, vec![0]);
    }

    #[test]
    fn undated_issues_are_kept() {
        let issues = rollup_issues(&[page("", 2, vec![entry("x", 1)])]).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].datetime, None);
    }

    #[test]
    fn empty_corpus_cannot_roll_up() {
        assert!(matches!(rollup_issues(&[]), Err(CorpusError::EmptyCorpus(_))));
    }
}
