/// Page-type labels used by annotators.
pub mod page_types {
    /// Front cover of an issue.
    pub const COVER_PAGE: &str = "cover_page";
    /// Table of contents.
    pub const TOC: &str = "toc";
    /// Last page belonging to the issue.
    pub const END_OF_ISSUE: &str = "end_of_issue";
    /// Page whose `notes` carry a `<start>-<end>` range of rescanned pages.
    pub const DUPLICATES: &str = "duplicates";
    /// Cut point between consecutive issues bound into one scan.
    pub const SPLIT_ISSUE: &str = "split_issue";
    /// Ordinary content page; implied when a page has no annotation.
    pub const CONTENT: &str = "content";
}

/// Column names shared by annotation, token, and merged tables.
pub mod columns {
    /// Volume join key.
    pub const ORIGINAL_VOLUME_ID: &str = "original_volume_id";
    /// Annotation page position (renamed to `sequence` before merging).
    pub const PAGE_NUMBER: &str = "page_number";
    /// Page position within a volume.
    pub const SEQUENCE: &str = "sequence";
    /// Annotated page type.
    pub const TYPE_OF_PAGE: &str = "type_of_page";
    /// Free-text issue date range.
    pub const DATES: &str = "dates";
    /// Free-text annotator notes.
    pub const NOTES: &str = "notes";
    /// Normalized issue start date.
    pub const START_ISSUE: &str = "start_issue";
    /// Normalized issue end date.
    pub const END_ISSUE: &str = "end_issue";
    /// Token text.
    pub const TOKEN: &str = "token";
    /// Part-of-speech tag.
    pub const PART_OF_SPEECH: &str = "part_of_speech";
    /// Token occurrences on a page.
    pub const COUNT: &str = "count";
    /// Page section reported by feature extraction (header, body, footer).
    pub const SECTION: &str = "section";
    /// Repository volume identifier.
    pub const VOLUME_ID: &str = "volume_id";
    /// Catalog link for the volume.
    pub const LINK: &str = "link";
    /// Slugged magazine title.
    pub const MAGAZINE_TITLE: &str = "magazine_title";
    /// Slugged magazine title plus volume label.
    pub const TITLE: &str = "title";
    /// Annotated volume number.
    pub const VOLUMES: &str = "volumes";
    /// Annotated issue number.
    pub const ISSUE_NUMBER: &str = "issue_number";
    /// Catalog title as published by the repository.
    pub const CATALOG_TITLE: &str = "catalog_title";
    /// Token file path in the volume manifest.
    pub const TOKENS_FILE: &str = "tokens_file";

    /// Accepted spellings for the volume join key.
    pub const ORIGINAL_VOLUME_ID_ALIASES: &[&str] = &[ORIGINAL_VOLUME_ID, "original_volumes"];
    /// Accepted spellings for the annotation page position.
    pub const PAGE_NUMBER_ALIASES: &[&str] = &[PAGE_NUMBER, SEQUENCE];
    /// Accepted spellings for the token-table page position.
    pub const SEQUENCE_ALIASES: &[&str] = &[SEQUENCE, "page"];
    /// Accepted spellings for token text.
    pub const TOKEN_ALIASES: &[&str] = &[TOKEN, "lowercase"];
    /// Accepted spellings for part-of-speech tags.
    pub const PART_OF_SPEECH_ALIASES: &[&str] = &[PART_OF_SPEECH, "pos"];
    /// Accepted spellings for the repository volume identifier.
    pub const VOLUME_ID_ALIASES: &[&str] = &[VOLUME_ID, "htid", "vol_id"];
    /// Accepted spellings for the catalog title.
    pub const CATALOG_TITLE_ALIASES: &[&str] = &[CATALOG_TITLE, TITLE];
}

/// Canonical column names written to corpus-level tables.
pub mod corpus_columns {
    /// Renamed from `magazine_title`.
    pub const CLEANED_MAGAZINE_TITLE: &str = "cleaned_magazine_title";
    /// Renamed from `title`.
    pub const HT_GENERATED_TITLE: &str = "ht_generated_title";
    /// Renamed from `volumes`.
    pub const VOLUME_NUMBER: &str = "volume_number";
    /// Renamed from `link`.
    pub const HDL_LINK: &str = "hdl_link";
    /// Renamed from `original_volume_id`.
    pub const CLEANED_VOLUME: &str = "cleaned_volume";
    /// Parsed issue start date.
    pub const DATETIME: &str = "datetime";
    /// Placeholder written when an issue has no annotated volume number.
    pub const MISSING_VOLUME_NUMBER: &str = "0";
}

/// Output file layout.
pub mod files {
    /// Subdirectory holding one merged CSV per volume.
    pub const VOLUMES_SUBDIR: &str = "volumes";
    /// Corpus-level page table.
    pub const CORPUS_FILE: &str = "combined_corpus.csv";
    /// Issue-level rollup table.
    pub const ISSUES_FILE: &str = "combined_issues.csv";
    /// Manifest describing the token tables of each volume.
    pub const MANIFEST_FILE: &str = "volumes.csv";
    /// Extension used for every table file.
    pub const CSV_EXTENSION: &str = "csv";
}

/// Constants used by the built-in annotation corrections.
pub mod corrections {
    /// Note written onto pages re-labelled as covers.
    pub const NOT_A_COVER_NOTE: &str = "Not actually a cover";
}

/// Date formats used when writing and reading normalized issue dates.
pub mod dates {
    /// ISO calendar date.
    pub const ISO_DATE: &str = "%Y-%m-%d";
    /// Date plus midnight time, as emitted by some spreadsheet exports.
    pub const ISO_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
    /// Default day used when a date range omits the day of month.
    pub const DEFAULT_DAY: u32 = 1;
}
