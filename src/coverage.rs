//! Term-frequency and coverage metrics over the corpus page table.
//!
//! Pages whose `datetime` did not parse are excluded from every metric.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::data::CorpusPageRow;
use crate::types::{Sequence, Term};

/// Frequency of one term within one `(magazine, datetime)` group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TermCoverage {
    /// Term being counted.
    pub term: Term,
    /// Normalized title slug of the group.
    pub magazine_title: String,
    /// Issue date of the group.
    pub datetime: NaiveDate,
    /// Word count of every page in the group.
    pub total_counts: u64,
    /// Occurrences of the term in the text of the group's pages.
    pub term_counts: u64,
    /// Word count of the group's pages that mention the term.
    pub page_counts: u64,
    /// Pages that mention the term, in corpus order.
    pub pages: Vec<Sequence>,
}

/// Share of words published on pages mentioning any of a set of terms.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoverageRate {
    /// Issue date.
    pub datetime: NaiveDate,
    /// Word count of every page published on the date.
    pub total_counts: u64,
    /// Word count of the pages mentioning any term.
    pub term_counts: u64,
    /// `term_counts / total_counts`; zero when nothing was published.
    pub rate: f64,
}

struct PageText<'a> {
    page: &'a CorpusPageRow,
    text: String,
    words: u64,
}

type GroupKey<'a> = (&'a str, NaiveDate);

fn dated_groups(pages: &[CorpusPageRow]) -> IndexMap<GroupKey<'_>, Vec<PageText<'_>>> {
    let mut groups: IndexMap<GroupKey<'_>, Vec<PageText<'_>>> = IndexMap::new();
    for page in pages {
        let Some(datetime) = page.datetime else {
            continue;
        };
        groups
            .entry((page.cleaned_magazine_title.as_str(), datetime))
            .or_default()
            .push(PageText {
                page,
                text: page.text(),
                words: page.word_count(),
            });
    }
    groups
}

/// Per term and `(magazine, datetime)` group: total words, term occurrences,
/// words on pages mentioning the term, and those pages.
///
/// Every group appears once per term; groups without the term report zero.
/// Matching is case-sensitive substring search over the page text, and
/// occurrences are counted without overlap.
pub fn compare_pub_counts(pages: &[CorpusPageRow], terms: &[Term]) -> Vec<TermCoverage> {
    let groups = dated_groups(pages);
    let mut rows = Vec::with_capacity(groups.len() * terms.len());
    for term in terms {
        for ((magazine_title, datetime), group) in &groups {
            let mut row = TermCoverage {
                term: term.clone(),
                magazine_title: magazine_title.to_string(),
                datetime: *datetime,
                total_counts: group.iter().map(|page| page.words).sum(),
                term_counts: 0,
                page_counts: 0,
                pages: Vec::new(),
            };
            if !term.is_empty() {
                for page in group.iter().filter(|page| page.text.contains(term.as_str())) {
                    row.term_counts += page.text.matches(term.as_str()).count() as u64;
                    row.page_counts += page.words;
                    row.pages.push(page.page.sequence);
                }
            }
            rows.push(row);
        }
    }
    debug!(
        "[serials:coverage] {} terms over {} dated groups",
        terms.len(),
        groups.len()
    );
    rows
}

/// Per `datetime`: total words against words on pages mentioning any of `terms`.
pub fn coverage_rate(pages: &[CorpusPageRow], terms: &[Term]) -> Vec<CoverageRate> {
    let mut totals: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for page in pages {
        let Some(datetime) = page.datetime else {
            continue;
        };
        let words = page.word_count();
        let text = page.text();
        let entry = totals.entry(datetime).or_default();
        entry.0 += words;
        if terms
            .iter()
            .any(|term| !term.is_empty() && text.contains(term.as_str()))
        {
            entry.1 += words;
        }
    }
    totals
        .into_iter()
        .map(|(datetime, (total_counts, term_counts))| CoverageRate {
            datetime,
            total_counts,
            term_counts,
            rate: if total_counts == 0 {
                0.0
            } else {
                term_counts as f64 / total_counts as f64
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PageType, TokenEntry};

    fn page(title: &str, date: Option<(i32, u32)>, sequence: Sequence, words: &[(&str, u64)]) -> CorpusPageRow {
        CorpusPageRow {
            cleaned_magazine_title: title.into(),
            ht_generated_title: String::new(),
            volume_number: String::new(),
            volume_id: String::new(),
            hdl_link: String::new(),
            cleaned_volume: String::new(),
            dates: String::new(),
            issue_number: String::new(),
            start_issue: String::new(),
            end_issue: String::new(),
            datetime: date.and_then(|(year, month)| NaiveDate::from_ymd_opt(year, month, 1)),
            type_of_page: PageType::Content,
            sequence,
            notes: String::new(),
            tokens: words
                .iter()
                .map(|(token, count)| TokenEntry {
                    token: token.to_string(),
                    part_of_speech: "NN".into(),
                    count: *count,
                    section: "body".into(),
                })
                .collect(),
            extra: IndexMap::new(),
        }
    }

    fn corpus() -> Vec<CorpusPageRow> {
        vec![
            page("arab_observer", Some((1965, 6)), 1, &[("nasser", 2), ("cairo", 3)]),
            page("arab_observer", Some((1965, 6)), 2, &[("dam", 4)]),
            page("arab_observer", Some((1965, 7)), 1, &[("nasser", 1), ("nasser", 1)]),
            page("afro_asian_bulletin", Some((1965, 6)), 1, &[("bandung", 5)]),
            page("afro_asian_bulletin", None, 9, &[("nasser", 100)]),
        ]
    }

    #[test]
    fn term_counts_per_title_and_date() {
        let rows = compare_pub_counts(&corpus(), &["nasser".to_string()]);
        assert_eq!(rows.len(), 3);

        let june = &rows[0];
        assert_eq!(june.magazine_title, "arab_observer");
        assert_eq!(june.total_counts, 9);
        assert_eq!(june.term_counts, 1);
        assert_eq!(june.page_counts, 5);
        assert_eq!(june.pages, vec![1]);

        let july = &rows[1];
        assert_eq!(july.term_counts, 2);
        assert_eq!(july.page_counts, 2);

        let bulletin = &rows[2];
        assert_eq!(bulletin.magazine_title, "afro_asian_bulletin");
        assert_eq!(bulletin.total_counts, 5);
        assert_eq!(bulletin.term_counts, 0);
        assert!(bulletin.pages.is_empty());
    }

    #[test]
    fn coverage_rate_per_date_ignores_undated_pages() {
        let rates = coverage_rate(&corpus(), &["nasser".to_string(), "bandung".to_string()]);
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].total_counts, 14);
        assert_eq!(rates[0].term_counts, 10);
        assert!((rates[0].rate - 10.0 / 14.0).abs() < 1e-9);
        assert_eq!(rates[1].rate, 1.0);
    }

    #[test]
    fn no_words_means_zero_rate() {
        let rates = coverage_rate(&[page("x", Some((1966, 1)), 1, &[])], &["nasser".to_string()]);
        assert_eq!(rates[0].rate, 0.0);
    }
}
