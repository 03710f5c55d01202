use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::page_types::{
    CONTENT, COVER_PAGE, DUPLICATES, END_OF_ISSUE, SPLIT_ISSUE, TOC,
};
use crate::types::{ColumnName, HathiId, Sequence, VolumeId};
use crate::utils::{collapse_underscores, snake_case_header};

/// Annotated role of a physical page.
///
/// The label set is open-ended: unknown labels are preserved as `Other`, and a
/// blank label means ordinary content.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageType {
    /// Front cover of an issue.
    CoverPage,
    /// Table of contents.
    Toc,
    /// Last page of an issue.
    EndOfIssue,
    /// Start of a page range scanned twice; `notes` holds `<start>-<end>`.
    Duplicates,
    /// Page separating two issues bound together.
    SplitIssue,
    /// Ordinary page.
    #[default]
    Content,
    /// Any other annotator label, preserved verbatim.
    Other(String),
}

impl PageType {
    /// Parse an annotator label (case and surrounding whitespace are ignored).
    pub fn parse(label: &str) -> Self {
        let label = snake_case_header(label);
        match label.as_str() {
            COVER_PAGE => Self::CoverPage,
            TOC => Self::Toc,
            END_OF_ISSUE => Self::EndOfIssue,
            DUPLICATES => Self::Duplicates,
            SPLIT_ISSUE => Self::SplitIssue,
            "" | CONTENT => Self::Content,
            _ => Self::Other(label),
        }
    }

    /// Canonical label.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CoverPage => COVER_PAGE,
            Self::Toc => TOC,
            Self::EndOfIssue => END_OF_ISSUE,
            Self::Duplicates => DUPLICATES,
            Self::SplitIssue => SPLIT_ISSUE,
            Self::Content => CONTENT,
            Self::Other(label) => label,
        }
    }

    /// True for the labels that delimit issue content.
    pub fn is_boundary_marker(&self) -> bool {
        matches!(
            self,
            Self::CoverPage | Self::Toc | Self::EndOfIssue | Self::Duplicates | Self::SplitIssue
        )
    }
}

impl From<String> for PageType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<PageType> for String {
    fn from(value: PageType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One curated annotation row, describing a single physical page.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationRow {
    /// Volume join key.
    pub original_volume_id: VolumeId,
    /// 1-based physical page position (joins against token `sequence`).
    pub page_number: Sequence,
    /// Annotated page type; `None` when the annotator left it blank.
    pub type_of_page: Option<PageType>,
    /// Free-text issue date range shared by every page of the issue.
    pub dates: String,
    /// Annotator notes (empty when absent).
    pub notes: String,
    /// First day of the issue range.
    pub start_issue: NaiveDate,
    /// Last month of the issue range, on the same day as `start_issue`.
    pub end_issue: NaiveDate,
    /// Remaining issue-level columns (`volumes`, `issue_number`, ...).
    pub extra: IndexMap<ColumnName, Option<String>>,
}

/// One extracted (page, token) observation.
#[derive(Clone, Debug, PartialEq)]
pub struct PageTokenRow {
    /// Volume join key.
    pub original_volume_id: VolumeId,
    /// Page position within the volume.
    pub sequence: Sequence,
    /// Lowercased token.
    pub token: String,
    /// Part-of-speech tag.
    pub part_of_speech: String,
    /// Occurrences of `token` on the page.
    pub count: u64,
    /// Page section the token was extracted from.
    pub section: String,
    /// Repository volume identifier.
    pub volume_id: HathiId,
    /// Persistent handle link.
    pub link: String,
    /// Normalized title slug.
    pub magazine_title: String,
    /// Catalog title.
    pub title: String,
}

/// Catalog record for one scanned volume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeInfo {
    /// Repository volume identifier.
    pub volume_id: HathiId,
    /// Annotated volume label, the join key against annotations.
    pub original_volume_id: VolumeId,
    /// Persistent handle link.
    pub link: String,
    /// Title as published by the catalog (e.g. `Arab observer. : v.3 no.24`).
    pub catalog_title: String,
}

impl VolumeInfo {
    /// Slugged magazine title: text before `:`, lowercased, dots removed, words joined by `_`.
    pub fn magazine_title(&self) -> String {
        let head = self
            .catalog_title
            .split_once(':')
            .map(|(head, _)| head)
            .unwrap_or(&self.catalog_title);
        let slug = head
            .trim()
            .to_lowercase()
            .replace('.', "")
            .split(' ')
            .collect::<Vec<_>>()
            .join("_");
        collapse_underscores(&slug)
    }

    /// File stem for the volume's merged table: magazine title plus the volume label.
    pub fn file_stem(&self) -> String {
        let label = self.original_volume_id.split(' ').collect::<Vec<_>>().join("_");
        let stem = format!("{}_{}", self.magazine_title(), label).replace(',', "_");
        collapse_underscores(&stem)
    }

    /// Attach this volume's identity to a raw token observation.
    pub fn token_row(
        &self,
        sequence: Sequence,
        token: impl Into<String>,
        part_of_speech: impl Into<String>,
        count: u64,
        section: impl Into<String>,
    ) -> PageTokenRow {
        PageTokenRow {
            original_volume_id: self.original_volume_id.clone(),
            sequence,
            token: token.into(),
            part_of_speech: part_of_speech.into(),
            count,
            section: section.into(),
            volume_id: self.volume_id.clone(),
            link: self.link.clone(),
            magazine_title: self.magazine_title(),
            title: self.file_stem(),
        }
    }
}

/// Token observation attached to a merged page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Lowercased token; empty on placeholder rows.
    pub token: String,
    /// Part-of-speech tag.
    pub part_of_speech: String,
    /// Occurrences on the page.
    pub count: u64,
    /// Page section.
    pub section: String,
}

/// Issue-level metadata duplicated onto every page of a volume.
///
/// Every field is optional until the reconciler fills it from the nearest
/// annotated neighbor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IssueMeta {
    /// Repository volume identifier.
    pub volume_id: Option<HathiId>,
    /// Persistent handle link.
    pub link: Option<String>,
    /// Normalized title slug.
    pub magazine_title: Option<String>,
    /// Catalog title.
    pub title: Option<String>,
    /// Free-text issue dates.
    pub dates: Option<String>,
    /// First day of the issue.
    pub start_issue: Option<NaiveDate>,
    /// Last month of the issue.
    pub end_issue: Option<NaiveDate>,
    /// Remaining annotation columns, in header order.
    pub extra: IndexMap<ColumnName, Option<String>>,
}

/// One page after the annotation/token outer join.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedPageRow {
    /// Volume join key.
    pub original_volume_id: VolumeId,
    /// Page position within the volume.
    pub sequence: Sequence,
    /// Annotated page type; `content` for pages only the token side knows.
    pub type_of_page: PageType,
    /// Annotator notes.
    pub notes: String,
    /// Token observations in extraction order; empty for pages without tokens.
    pub tokens: Vec<TokenEntry>,
    /// Issue metadata after filling.
    pub meta: IssueMeta,
}

/// One page of the corpus-level table, under canonical corpus column names.
#[derive(Clone, Debug, PartialEq)]
pub struct CorpusPageRow {
    /// Normalized title slug.
    pub cleaned_magazine_title: String,
    /// Title as generated by the catalog.
    pub ht_generated_title: String,
    /// Volume number; empty when not annotated.
    pub volume_number: String,
    /// Repository volume identifier.
    pub volume_id: HathiId,
    /// Persistent handle link.
    pub hdl_link: String,
    /// Annotated volume label.
    pub cleaned_volume: VolumeId,
    /// Free-text issue dates.
    pub dates: String,
    /// Issue number; empty when not annotated.
    pub issue_number: String,
    /// ISO start date as recorded; may be empty or malformed in cached tables.
    pub start_issue: String,
    /// ISO end date as recorded.
    pub end_issue: String,
    /// Parsed `start_issue`; `None` when it does not parse.
    pub datetime: Option<NaiveDate>,
    /// Page type after corrections.
    pub type_of_page: PageType,
    /// Page position within the volume.
    pub sequence: Sequence,
    /// Annotator notes.
    pub notes: String,
    /// Token observations on the page.
    pub tokens: Vec<TokenEntry>,
    /// Remaining annotation columns.
    pub extra: IndexMap<ColumnName, String>,
}

impl CorpusPageRow {
    /// Page text: non-empty tokens joined with single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .filter(|entry| !entry.token.is_empty())
            .map(|entry| entry.token.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Sum of token counts on the page.
    pub fn word_count(&self) -> u64 {
        self.tokens.iter().map(|entry| entry.count).sum()
    }
}

/// One issue after rolling pages up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IssueRow {
    /// Normalized title slug.
    pub cleaned_magazine_title: String,
    /// Title as generated by the catalog.
    pub ht_generated_title: String,
    /// Volume number; `0` when absent.
    pub volume_number: String,
    /// Repository volume identifier.
    pub volume_id: HathiId,
    /// Persistent handle link.
    pub hdl_link: String,
    /// Annotated volume label.
    pub cleaned_volume: VolumeId,
    /// ISO start date.
    pub start_issue: String,
    /// ISO end date.
    pub end_issue: String,
    /// Parsed `start_issue`; `None` when it does not parse.
    pub datetime: Option<NaiveDate>,
    /// Free-text issue dates.
    pub dates: String,
    /// Issue number; empty when not annotated.
    pub issue_number: String,
    /// Page type of the first retained page.
    pub type_of_page: PageType,
    /// Page position of every element in `part_of_speech`/`count`/`section`.
    pub sequence: Vec<Sequence>,
    /// Tokens of every page, in page order, joined with single spaces.
    pub token: String,
    /// Part-of-speech tag per element.
    pub part_of_speech: Vec<String>,
    /// Token count per element; zero for pages without tokens.
    pub count: Vec<u64>,
    /// Page section per element.
    pub section: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(catalog_title: &str, original_volume_id: &str) -> VolumeInfo {
        VolumeInfo {
            volume_id: "mdp.39015004861985".to_string(),
            original_volume_id: original_volume_id.to_string(),
            link: "https://hdl.handle.net/2027/mdp.39015004861985".to_string(),
            catalog_title: catalog_title.to_string(),
        }
    }

    #[test]
    fn page_type_parses_known_and_open_labels() {
        assert_eq!(PageType::parse("Cover Page"), PageType::CoverPage);
        assert_eq!(PageType::parse(" toc "), PageType::Toc);
        assert_eq!(PageType::parse(""), PageType::Content);
        assert_eq!(
            PageType::parse("Advertisement"),
            PageType::Other("advertisement".to_string())
        );
        assert_eq!(PageType::Other("advertisement".into()).as_str(), "advertisement");
        assert!(PageType::SplitIssue.is_boundary_marker());
        assert!(!PageType::Content.is_boundary_marker());
    }

    #[test]
    fn page_type_serializes_as_label() {
        let encoded = serde_json::to_string(&PageType::EndOfIssue).unwrap();
        assert_eq!(encoded, "\"end_of_issue\"");
        let decoded: PageType = serde_json::from_str("\"duplicates\"").unwrap();
        assert_eq!(decoded, PageType::Duplicates);
    }

    #[test]
    fn volume_info_derives_magazine_title_and_file_stem() {
        let volume = info("Arab observer. : v.3 no.24", "v.3 no.24, 1965");
        assert_eq!(volume.magazine_title(), "arab_observer");
        assert_eq!(volume.file_stem(), "arab_observer_v.3_no.24_1965");
    }

    #[test]
    fn volume_info_without_subtitle_uses_full_title() {
        let volume = info("Afro-Asian Bulletin", "June 1967");
        assert_eq!(volume.magazine_title(), "afro-asian_bulletin");
        assert_eq!(volume.file_stem(), "afro-asian_bulletin_June_1967");
    }

    #[test]
    fn corpus_page_text_skips_empty_tokens() {
        let row = CorpusPageRow {
            cleaned_magazine_title: String::new(),
            ht_generated_title: String::new(),
            volume_number: String::new(),
            volume_id: String::new(),
            hdl_link: String::new(),
            cleaned_volume: String::new(),
            dates: String::new(),
            issue_number: String::new(),
            start_issue: String::new(),
            end_issue: String::new(),
            datetime: None,
            type_of_page: PageType::Content,
            sequence: 1,
            notes: String::new(),
            tokens: vec![
                TokenEntry {
                    token: "cairo".into(),
                    part_of_speech: "NNP".into(),
                    count: 2,
                    section: "body".into(),
                },
                TokenEntry {
                    token: String::new(),
                    part_of_speech: String::new(),
                    count: 0,
                    section: String::new(),
                },
                TokenEntry {
                    token: "conference".into(),
                    part_of_speech: "NN".into(),
                    count: 1,
                    section: "body".into(),
                },
            ],
            extra: IndexMap::new(),
        };
        assert_eq!(row.text(), "cairo conference");
        assert_eq!(row.word_count(), 3);
    }
}
