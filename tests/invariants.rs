use std::collections::HashSet;

use chrono::NaiveDate;

use serials::codec::encode_merged;
use serials::{
    AnnotationRow, BoundaryVariant, CorpusConfig, MergedPageRow, PageTokenRow, PageType, RawTable,
    Sequence, VolumeInfo, cut_issue, normalize_annotations, reconcile,
};

const VOLUME: &str = "v.3 no.24 1965";

fn volume() -> VolumeInfo {
    VolumeInfo {
        volume_id: "mdp.39015004861985".into(),
        original_volume_id: VOLUME.into(),
        link: "https://hdl.handle.net/2027/mdp.39015004861985".into(),
        catalog_title: "Arab observer. : v.3 no.24".into(),
    }
}

/// Annotation rows from `(page, type_of_page, dates, notes)` tuples, run through the normalizer.
fn annotations(rows: &[(Sequence, &str, &str, &str)]) -> Vec<AnnotationRow> {
    let mut records = vec![vec![
        "Original Volume ID".to_string(),
        "Page Number".to_string(),
        "Type of Page".to_string(),
        "Dates".to_string(),
        "Notes".to_string(),
    ]];
    for (page, type_of_page, dates, notes) in rows {
        records.push(vec![
            VOLUME.to_string(),
            page.to_string(),
            type_of_page.to_string(),
            dates.to_string(),
            notes.to_string(),
        ]);
    }
    normalize_annotations(
        RawTable::from_records("annotations.csv", records),
        &CorpusConfig::default().date_replacements,
    )
    .unwrap()
}

fn tokens(pages: impl IntoIterator<Item = Sequence>) -> Vec<PageTokenRow> {
    let info = volume();
    pages
        .into_iter()
        .map(|page| info.token_row(page, format!("word{page}"), "NN", 1, "body"))
        .collect()
}

fn sequences(pages: &[MergedPageRow]) -> Vec<Sequence> {
    pages.iter().map(|page| page.sequence).collect()
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn reconciliation_is_idempotent() {
    let annotated = annotations(&[
        (2, "cover_page", "June-July 1965", ""),
        (9, "end_of_issue", "", ""),
    ]);
    let token_rows = tokens(1..=12);
    let first = encode_merged(&reconcile(&annotated, &token_rows).pages);
    let second = encode_merged(&reconcile(&annotated, &token_rows).pages);
    assert_eq!(first, second);
}

#[test]
fn every_page_from_either_side_appears_exactly_once() {
    let annotated = annotations(&[
        (1, "cover_page", "May 1966", ""),
        (4, "", "", ""),
        (50, "end_of_issue", "", ""),
    ]);
    let token_rows = tokens((2..=10).chain(4..=6));
    let merged = reconcile(&annotated, &token_rows).pages;

    let expected: HashSet<Sequence> = [1, 50].into_iter().chain(2..=10).collect();
    let seen = sequences(&merged);
    assert_eq!(seen.len(), expected.len());
    assert_eq!(seen.iter().copied().collect::<HashSet<_>>(), expected);
    let page_four = merged.iter().find(|page| page.sequence == 4).unwrap();
    assert_eq!(page_four.tokens.len(), 2);
}

#[test]
fn fill_takes_nearest_preceding_then_following_annotation() {
    let annotated = annotations(&[
        (3, "cover_page", "May 1966", ""),
        (8, "cover_page", "June 1966", ""),
    ]);
    let merged = reconcile(&annotated, &tokens(1..=10)).pages;
    for page in &merged {
        let expected = if page.sequence < 8 {
            ("May 1966", ymd(1966, 5, 1))
        } else {
            ("June 1966", ymd(1966, 6, 1))
        };
        assert_eq!(page.meta.dates.as_deref(), Some(expected.0), "page {}", page.sequence);
        assert_eq!(page.meta.start_issue, Some(expected.1), "page {}", page.sequence);
        assert_eq!(page.meta.end_issue, Some(expected.1), "page {}", page.sequence);
    }
}

#[test]
fn token_only_page_matches_nearest_annotated_neighbor() {
    let annotated = annotations(&[(1, "cover_page", "June-July 1965", "front")]);
    let merged = reconcile(&annotated, &tokens(1..=3)).pages;
    let cover = &merged[0];
    let token_only = &merged[2];
    assert_eq!(token_only.type_of_page, PageType::Content);
    assert_eq!(token_only.notes, "");
    assert_eq!(token_only.meta, cover.meta);
    assert_eq!(token_only.meta.magazine_title.as_deref(), Some("arab_observer"));
}

#[test]
fn cover_toc_cut_matches_worked_example() {
    let annotated = annotations(&[
        (5, "cover_page", "June 1965", ""),
        (20, "duplicates", "", "10-12"),
        (40, "end_of_issue", "", ""),
    ]);
    let merged = reconcile(&annotated, &tokens(1..=45)).pages;
    assert_eq!(merged.len(), 45);

    let cut = cut_issue(VOLUME, merged, BoundaryVariant::CoverToc).unwrap();
    let expected: Vec<Sequence> = (4..=9).chain(13..=40).collect();
    assert_eq!(sequences(&cut), expected);
}

#[test]
fn forward_filled_duplicates_rows_use_the_marked_range() {
    let annotated = annotations(&[
        (5, "cover_page", "June 1965", ""),
        (6, "content", "", ""),
        (10, "duplicates", "", "10-12"),
        (11, "", "", ""),
        (12, "", "", ""),
        (13, "content", "", ""),
        (40, "end_of_issue", "", ""),
    ]);
    let filled = annotated.iter().find(|row| row.page_number == 11).unwrap();
    assert_eq!(filled.type_of_page, Some(PageType::Duplicates));
    assert_eq!(filled.notes, "");

    let cut = cut_issue(
        VOLUME,
        reconcile(&annotated, &tokens(1..=45)).pages,
        BoundaryVariant::CoverToc,
    )
    .unwrap();
    let expected: Vec<Sequence> = (4..=9).chain(13..=40).collect();
    assert_eq!(sequences(&cut), expected);
}

#[test]
fn cut_bounds_follow_markers_and_drop_duplicate_ranges() {
    let annotated = annotations(&[
        (3, "toc", "August 1965", ""),
        (6, "cover_page", "", ""),
        (7, "duplicates", "", "8-9"),
        (12, "end_of_issue", "", ""),
        (15, "duplicates", "", "16-17"),
        (18, "end_of_issue", "", ""),
    ]);
    let cut = cut_issue(
        VOLUME,
        reconcile(&annotated, &tokens(1..=25)).pages,
        BoundaryVariant::CoverToc,
    )
    .unwrap();
    let kept = sequences(&cut);
    assert_eq!(kept.first(), Some(&5));
    assert_eq!(kept.last(), Some(&18));
    for removed in [8, 9, 16, 17] {
        assert!(!kept.contains(&removed), "page {removed} should be cut");
    }
}

#[test]
fn date_ranges_and_seasons_normalize() {
    let annotated = annotations(&[
        (1, "cover_page", "June-July 1965", ""),
        (2, "cover_page", "Summer 1967", ""),
        (3, "cover_page", "7 June 1965", ""),
        (4, "cover_page", "Decmeber 1966", ""),
    ]);
    assert_eq!(annotated[0].start_issue, ymd(1965, 6, 1));
    assert_eq!(annotated[0].end_issue, ymd(1965, 7, 1));
    assert_eq!(annotated[1].start_issue, ymd(1967, 7, 1));
    assert_eq!(annotated[1].end_issue, ymd(1967, 7, 1));
    assert_eq!(annotated[2].start_issue, ymd(1965, 6, 7));
    assert_eq!(annotated[3].start_issue, ymd(1966, 12, 1));
}

#[test]
fn pages_sharing_dates_share_issue_dates() {
    let annotated = annotations(&[
        (1, "cover_page", "June-July 1965", ""),
        (2, "", "", ""),
        (3, "", "June-July 1965", ""),
    ]);
    assert!(annotated.iter().all(|row| row.start_issue == annotated[0].start_issue));
    assert!(annotated.iter().all(|row| row.end_issue == annotated[0].end_issue));
}
