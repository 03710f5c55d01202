//! Typed rows to and from CSV tables.
//!
//! Page tables are written one row per token entry, so a page's issue-level
//! and page-level columns repeat on every token row. A page without tokens is
//! written as a single placeholder row (empty token, zero count) and is read
//! back as a page with no token entries.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};

use crate::constants::columns::{
    CATALOG_TITLE_ALIASES, COUNT, DATES, END_ISSUE, ISSUE_NUMBER, LINK, MAGAZINE_TITLE, NOTES,
    ORIGINAL_VOLUME_ID, ORIGINAL_VOLUME_ID_ALIASES, PART_OF_SPEECH, PART_OF_SPEECH_ALIASES,
    SECTION, SEQUENCE, SEQUENCE_ALIASES, START_ISSUE, TITLE, TOKEN, TOKEN_ALIASES, TOKENS_FILE,
    TYPE_OF_PAGE, VOLUME_ID, VOLUME_ID_ALIASES,
};
use crate::constants::corpus_columns::{
    CLEANED_MAGAZINE_TITLE, CLEANED_VOLUME, DATETIME, HDL_LINK, HT_GENERATED_TITLE, VOLUME_NUMBER,
};
use crate::constants::dates::ISO_DATE;
use crate::constants::files::CSV_EXTENSION;
use crate::corpus::derive_datetime;
use crate::data::{
    CorpusPageRow, IssueMeta, IssueRow, MergedPageRow, PageTokenRow, PageType, TokenEntry,
    VolumeInfo,
};
use crate::errors::CorpusError;
use crate::pipeline::VolumeJob;
use crate::table::RawTable;
use crate::transport::csv::records_to_string;
use crate::types::{Sequence, VolumeId};

/// Fixed leading columns of a merged per-volume table; extra annotation columns follow.
pub const MERGED_COLUMNS: &[&str] = &[
    ORIGINAL_VOLUME_ID,
    SEQUENCE,
    TYPE_OF_PAGE,
    NOTES,
    TOKEN,
    PART_OF_SPEECH,
    COUNT,
    SECTION,
    VOLUME_ID,
    LINK,
    MAGAZINE_TITLE,
    TITLE,
    DATES,
    START_ISSUE,
    END_ISSUE,
];

/// Fixed leading columns of the corpus page table; extra annotation columns follow.
pub const CORPUS_COLUMNS: &[&str] = &[
    CLEANED_MAGAZINE_TITLE,
    HT_GENERATED_TITLE,
    VOLUME_NUMBER,
    VOLUME_ID,
    HDL_LINK,
    CLEANED_VOLUME,
    DATES,
    ISSUE_NUMBER,
    START_ISSUE,
    END_ISSUE,
    DATETIME,
    TYPE_OF_PAGE,
    SEQUENCE,
    NOTES,
    TOKEN,
    PART_OF_SPEECH,
    COUNT,
    SECTION,
];

/// Columns of the issue rollup table. List-valued cells hold JSON arrays.
pub const ISSUE_COLUMNS: &[&str] = &[
    CLEANED_MAGAZINE_TITLE,
    HT_GENERATED_TITLE,
    VOLUME_NUMBER,
    VOLUME_ID,
    HDL_LINK,
    CLEANED_VOLUME,
    START_ISSUE,
    END_ISSUE,
    DATETIME,
    DATES,
    ISSUE_NUMBER,
    TYPE_OF_PAGE,
    SEQUENCE,
    TOKEN,
    PART_OF_SPEECH,
    COUNT,
    SECTION,
];

/* ---------------- Token tables ---------------- */

/// Decode one volume's extracted token table.
///
/// Requires page position, token, and count columns; part of speech and
/// section are optional. Volume identity comes from `info`.
pub fn decode_token_rows(
    mut table: RawTable,
    info: &VolumeInfo,
) -> Result<Vec<PageTokenRow>, CorpusError> {
    table.normalize_headers();
    let sequence_col = table.require_column(SEQUENCE_ALIASES)?;
    let token_col = table.require_column(TOKEN_ALIASES)?;
    let count_col = table.require_column(&[COUNT])?;
    let pos_col = table.column_index_any(PART_OF_SPEECH_ALIASES);
    let section_col = table.column_index_any(&[SECTION]);

    let mut rows = Vec::with_capacity(table.rows.len());
    for idx in 0..table.rows.len() {
        rows.push(info.token_row(
            table.parse_u32(idx, sequence_col)?,
            text(&table, idx, Some(token_col)),
            text(&table, idx, pos_col),
            table.parse_count(idx, count_col)?,
            text(&table, idx, section_col),
        ));
    }
    Ok(rows)
}

/// Decode the volume manifest into processing jobs.
///
/// Relative `tokens_file` paths resolve against `base_dir`; a missing
/// `tokens_file` defaults to `<file stem>.csv` there.
pub fn decode_manifest(mut table: RawTable, base_dir: &Path) -> Result<Vec<VolumeJob>, CorpusError> {
    table.normalize_headers();
    let volume_id_col = table.require_column(VOLUME_ID_ALIASES)?;
    let original_col = table.require_column(ORIGINAL_VOLUME_ID_ALIASES)?;
    let title_col = table.require_column(CATALOG_TITLE_ALIASES)?;
    let link_col = table.column_index_any(&[LINK]);
    let tokens_col = table.column_index_any(&[TOKENS_FILE]);

    let mut jobs = Vec::with_capacity(table.rows.len());
    for idx in 0..table.rows.len() {
        let original_volume_id = text(&table, idx, Some(original_col));
        if original_volume_id.is_empty() {
            return Err(CorpusError::InvalidField {
                table: table.name.clone(),
                column: table.headers[original_col].clone(),
                row: idx,
                value: String::new(),
            });
        }
        let info = VolumeInfo {
            volume_id: text(&table, idx, Some(volume_id_col)),
            original_volume_id,
            link: text(&table, idx, link_col),
            catalog_title: text(&table, idx, Some(title_col)),
        };
        let tokens_file = optional_text(&table, idx, tokens_col)
            .unwrap_or_else(|| format!("{}.{}", info.file_stem(), CSV_EXTENSION));
        jobs.push(VolumeJob {
            tokens_path: base_dir.join(tokens_file),
            info,
        });
    }
    Ok(jobs)
}

/* ---------------- Merged per-volume tables ---------------- */

/// Encode merged pages as a per-volume table.
pub fn encode_merged(pages: &[MergedPageRow]) -> String {
    let extras: IndexSet<&str> = pages
        .iter()
        .flat_map(|page| page.meta.extra.keys().map(String::as_str))
        .collect();
    let header = header_with(MERGED_COLUMNS, &extras);

    let mut records = Vec::new();
    for page in pages {
        for [token, part_of_speech, count, section] in token_cells(&page.tokens) {
            let meta = &page.meta;
            let mut record = vec![
                page.original_volume_id.clone(),
                page.sequence.to_string(),
                page.type_of_page.to_string(),
                page.notes.clone(),
                token,
                part_of_speech,
                count,
                section,
                meta.volume_id.clone().unwrap_or_default(),
                meta.link.clone().unwrap_or_default(),
                meta.magazine_title.clone().unwrap_or_default(),
                meta.title.clone().unwrap_or_default(),
                meta.dates.clone().unwrap_or_default(),
                format_date(meta.start_issue),
                format_date(meta.end_issue),
            ];
            record.extend(
                extras
                    .iter()
                    .map(|column| meta.extra.get(*column).cloned().flatten().unwrap_or_default()),
            );
            records.push(record);
        }
    }
    records_to_string(&header, &records)
}

/// Decode a per-volume table back into merged pages, in table order.
pub fn decode_merged(mut table: RawTable) -> Result<Vec<MergedPageRow>, CorpusError> {
    table.normalize_headers();
    let volume_col = table.require_column(ORIGINAL_VOLUME_ID_ALIASES)?;
    let sequence_col = table.require_column(&[SEQUENCE])?;
    let cols = ColumnMap::new(&table, MERGED_COLUMNS);
    let extra_cols = cols.unknown(&table, &[volume_col, sequence_col]);

    let mut pages: IndexMap<(VolumeId, Sequence), MergedPageRow> = IndexMap::new();
    for idx in 0..table.rows.len() {
        let volume = text(&table, idx, Some(volume_col));
        let sequence = table.parse_u32(idx, sequence_col)?;
        let entry = token_entry(&table, idx, &cols)?;
        let page = pages.entry((volume.clone(), sequence)).or_insert_with(|| MergedPageRow {
            original_volume_id: volume,
            sequence,
            type_of_page: page_type(&table, idx, &cols),
            notes: text(&table, idx, cols.get(NOTES)),
            tokens: Vec::new(),
            meta: IssueMeta {
                volume_id: optional_text(&table, idx, cols.get(VOLUME_ID)),
                link: optional_text(&table, idx, cols.get(LINK)),
                magazine_title: optional_text(&table, idx, cols.get(MAGAZINE_TITLE)),
                title: optional_text(&table, idx, cols.get(TITLE)),
                dates: optional_text(&table, idx, cols.get(DATES)),
                start_issue: derive_datetime(&text(&table, idx, cols.get(START_ISSUE))),
                end_issue: derive_datetime(&text(&table, idx, cols.get(END_ISSUE))),
                extra: extra_cols
                    .iter()
                    .map(|&col| (table.headers[col].clone(), optional_text(&table, idx, Some(col))))
                    .collect(),
            },
        });
        if !is_placeholder(&entry) {
            page.tokens.push(entry);
        }
    }
    Ok(pages.into_values().collect())
}

/* ---------------- Corpus page table ---------------- */

/// Encode corpus pages under canonical corpus column names.
pub fn encode_corpus(pages: &[CorpusPageRow]) -> String {
    let extras: IndexSet<&str> = pages
        .iter()
        .flat_map(|page| page.extra.keys().map(String::as_str))
        .collect();
    let header = header_with(CORPUS_COLUMNS, &extras);

    let mut records = Vec::new();
    for page in pages {
        for [token, part_of_speech, count, section] in token_cells(&page.tokens) {
            let mut record = vec![
                page.cleaned_magazine_title.clone(),
                page.ht_generated_title.clone(),
                page.volume_number.clone(),
                page.volume_id.clone(),
                page.hdl_link.clone(),
                page.cleaned_volume.clone(),
                page.dates.clone(),
                page.issue_number.clone(),
                page.start_issue.clone(),
                page.end_issue.clone(),
                format_date(page.datetime),
                page.type_of_page.to_string(),
                page.sequence.to_string(),
                page.notes.clone(),
                token,
                part_of_speech,
                count,
                section,
            ];
            record.extend(
                extras
                    .iter()
                    .map(|column| page.extra.get(*column).cloned().unwrap_or_default()),
            );
            records.push(record);
        }
    }
    records_to_string(&header, &records)
}

/// Decode a corpus page table, grouping token rows back into pages.
pub fn decode_corpus(mut table: RawTable) -> Result<Vec<CorpusPageRow>, CorpusError> {
    table.normalize_headers();
    let volume_col = table.require_column(&[CLEANED_VOLUME])?;
    let sequence_col = table.require_column(&[SEQUENCE])?;
    let cols = ColumnMap::new(&table, CORPUS_COLUMNS);
    let extra_cols = cols.unknown(&table, &[volume_col, sequence_col]);

    let mut pages: IndexMap<(String, VolumeId, Sequence), CorpusPageRow> = IndexMap::new();
    for idx in 0..table.rows.len() {
        let title = text(&table, idx, cols.get(CLEANED_MAGAZINE_TITLE));
        let volume = text(&table, idx, Some(volume_col));
        let sequence = table.parse_u32(idx, sequence_col)?;
        let entry = token_entry(&table, idx, &cols)?;
        let field = |name: &str| text(&table, idx, cols.get(name));
        let page = pages
            .entry((title.clone(), volume.clone(), sequence))
            .or_insert_with(|| CorpusPageRow {
                cleaned_magazine_title: title,
                ht_generated_title: field(HT_GENERATED_TITLE),
                volume_number: field(VOLUME_NUMBER),
                volume_id: field(VOLUME_ID),
                hdl_link: field(HDL_LINK),
                cleaned_volume: volume,
                dates: field(DATES),
                issue_number: field(ISSUE_NUMBER),
                start_issue: field(START_ISSUE),
                end_issue: field(END_ISSUE),
                datetime: derive_datetime(&field(DATETIME)),
                type_of_page: page_type(&table, idx, &cols),
                sequence,
                notes: field(NOTES),
                tokens: Vec::new(),
                extra: extra_cols
                    .iter()
                    .map(|&col| (table.headers[col].clone(), text(&table, idx, Some(col))))
                    .collect(),
            });
        if !is_placeholder(&entry) {
            page.tokens.push(entry);
        }
    }
    Ok(pages.into_values().collect())
}

/* ---------------- Issue table ---------------- */

/// Encode issue rows; list-valued columns are written as JSON arrays.
pub fn encode_issues(issues: &[IssueRow]) -> Result<String, CorpusError> {
    let mut records = Vec::with_capacity(issues.len());
    for issue in issues {
        records.push(vec![
            issue.cleaned_magazine_title.clone(),
            issue.ht_generated_title.clone(),
            issue.volume_number.clone(),
            issue.volume_id.clone(),
            issue.hdl_link.clone(),
            issue.cleaned_volume.clone(),
            issue.start_issue.clone(),
            issue.end_issue.clone(),
            format_date(issue.datetime),
            issue.dates.clone(),
            issue.issue_number.clone(),
            issue.type_of_page.to_string(),
            serde_json::to_string(&issue.sequence)?,
            issue.token.clone(),
            serde_json::to_string(&issue.part_of_speech)?,
            serde_json::to_string(&issue.count)?,
            serde_json::to_string(&issue.section)?,
        ]);
    }
    Ok(records_to_string(ISSUE_COLUMNS, &records))
}

/// Decode an issue table written by [`encode_issues`].
pub fn decode_issues(mut table: RawTable) -> Result<Vec<IssueRow>, CorpusError> {
    table.normalize_headers();
    table.require_column(&[CLEANED_VOLUME])?;
    let cols = ColumnMap::new(&table, ISSUE_COLUMNS);
    let mut issues = Vec::with_capacity(table.rows.len());
    for idx in 0..table.rows.len() {
        let field = |name: &str| text(&table, idx, cols.get(name));
        issues.push(IssueRow {
            cleaned_magazine_title: field(CLEANED_MAGAZINE_TITLE),
            ht_generated_title: field(HT_GENERATED_TITLE),
            volume_number: field(VOLUME_NUMBER),
            volume_id: field(VOLUME_ID),
            hdl_link: field(HDL_LINK),
            cleaned_volume: field(CLEANED_VOLUME),
            start_issue: field(START_ISSUE),
            end_issue: field(END_ISSUE),
            datetime: derive_datetime(&field(DATETIME)),
            dates: field(DATES),
            issue_number: field(ISSUE_NUMBER),
            type_of_page: page_type(&table, idx, &cols),
            sequence: json_list(&field(SEQUENCE))?,
            token: field(TOKEN),
            part_of_speech: json_list(&field(PART_OF_SPEECH))?,
            count: json_list(&field(COUNT))?,
            section: json_list(&field(SECTION))?,
        });
    }
    Ok(issues)
}

/* ---------------- Helpers ---------------- */

/// Positions of the known columns present in a table.
struct ColumnMap {
    positions: IndexMap<&'static str, usize>,
}

impl ColumnMap {
    fn new(table: &RawTable, known: &[&'static str]) -> Self {
        let positions = known
            .iter()
            .filter_map(|&name| table.column_index_any(&[name]).map(|col| (name, col)))
            .collect();
        Self { positions }
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Columns that are neither known nor listed in `also_known`.
    fn unknown(&self, table: &RawTable, also_known: &[usize]) -> Vec<usize> {
        (0..table.headers.len())
            .filter(|col| !also_known.contains(col))
            .filter(|col| !self.positions.values().any(|known| known == col))
            .collect()
    }
}

fn header_with(fixed: &[&str], extras: &IndexSet<&str>) -> Vec<String> {
    fixed
        .iter()
        .chain(extras.iter().filter(|column| !fixed.contains(*column)))
        .map(|column| column.to_string())
        .collect()
}

fn text(table: &RawTable, row: usize, col: Option<usize>) -> String {
    optional_text(table, row, col).unwrap_or_default()
}

fn optional_text(table: &RawTable, row: usize, col: Option<usize>) -> Option<String> {
    col.and_then(|col| table.cell(row, col))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn page_type(table: &RawTable, row: usize, cols: &ColumnMap) -> PageType {
    PageType::parse(&text(table, row, cols.get(TYPE_OF_PAGE)))
}

fn token_entry(table: &RawTable, row: usize, cols: &ColumnMap) -> Result<TokenEntry, CorpusError> {
    let count = match cols.get(COUNT) {
        Some(col) => table.parse_count(row, col)?,
        None => 0,
    };
    Ok(TokenEntry {
        token: text(table, row, cols.get(TOKEN)),
        part_of_speech: text(table, row, cols.get(PART_OF_SPEECH)),
        count,
        section: text(table, row, cols.get(SECTION)),
    })
}

fn token_cells(tokens: &[TokenEntry]) -> Vec<[String; 4]> {
    if tokens.is_empty() {
        return vec![[String::new(), String::new(), "0".to_string(), String::new()]];
    }
    tokens
        .iter()
        .map(|entry| {
            [
                entry.token.clone(),
                entry.part_of_speech.clone(),
                entry.count.to_string(),
                entry.section.clone(),
            ]
        })
        .collect()
}

fn is_placeholder(entry: &TokenEntry) -> bool {
    entry.token.is_empty()
        && entry.part_of_speech.is_empty()
        && entry.section.is_empty()
        && entry.count == 0
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|date| date.format(ISO_DATE).to_string())
        .unwrap_or_default()
}

fn json_list<T: serde::de::DeserializeOwned>(cell: &str) -> Result<Vec<T>, CorpusError> {
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(cell)?)
}
