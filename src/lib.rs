#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// CLI runner used by the `build_corpus` binary.
pub mod app;
/// Issue boundary cutting.
pub mod boundary;
/// Typed rows to and from CSV tables.
pub mod codec;
/// Build configuration types.
pub mod config;
/// Centralized column names, page-type labels, and file layout.
pub mod constants;
/// Corpus assembly, corrections, and issue rollup.
pub mod corpus;
/// Term-frequency and coverage metrics.
pub mod coverage;
/// Annotation, token, page, and issue row types.
pub mod data;
/// Annotation normalization and issue date parsing.
pub mod normalize;
/// Batch orchestration with per-volume caching and failure isolation.
pub mod pipeline;
/// Annotation/token outer join and metadata fill.
pub mod reconcile;
/// In-memory tabular view between CSV text and typed rows.
pub mod table;
/// Table transports (CSV text and filesystem).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Text normalization helpers.
pub mod utils;

mod errors;

pub use boundary::{cut_issue, remove_duplicates};
pub use config::{BoundaryVariant, CorpusConfig, DateReplacement, TitleConfig};
pub use corpus::{Correction, assemble_corpus, rollup_issues};
pub use data::{
    AnnotationRow, CorpusPageRow, IssueMeta, IssueRow, MergedPageRow, PageTokenRow, PageType,
    TokenEntry, VolumeInfo,
};
pub use errors::{CorpusError, JoinConflict};
pub use normalize::{normalize_annotations, parse_issue_dates};
pub use pipeline::{CorpusBuild, CorpusPipeline, PipelineReport, VolumeJob, VolumeOutcome};
pub use reconcile::{Reconciliation, reconcile};
pub use table::RawTable;
pub use types::{CellValue, ColumnName, HathiId, Sequence, Term, TitleKey, VolumeId};
