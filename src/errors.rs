use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ColumnName, Sequence, VolumeId};

/// Error type for annotation normalization, page reconciliation, and corpus persistence.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot parse issue dates '{dates}': {reason}")]
    DateFormat { dates: String, reason: String },
    #[error("volume '{volume}' has no {variant} boundary marker")]
    MissingBoundary { volume: VolumeId, variant: String },
    #[error("volume '{volume}' has a duplicates page with malformed range '{notes}'")]
    MalformedDuplicateRange { volume: VolumeId, notes: String },
    #[error("table '{table}' is missing column '{column}'")]
    MissingColumn { table: String, column: ColumnName },
    #[error("table '{table}' row {row}: invalid {column} value '{value}'")]
    InvalidField {
        table: String,
        column: ColumnName,
        row: usize,
        value: String,
    },
    #[error("corpus assembly has no input: {0}")]
    EmptyCorpus(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("malformed table at {path}: {reason}")]
    Csv { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A page where both join sides define different values for the same field.
///
/// The annotation value is kept; the conflict is reported so the data owner can
/// confirm which side is authoritative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinConflict {
    /// Volume of the conflicting page.
    pub volume: VolumeId,
    /// Page position within the volume.
    pub sequence: Sequence,
    /// Column both sides define.
    pub field: ColumnName,
    /// Value kept from the annotation table.
    pub annotation_value: String,
    /// Value dropped from the token table.
    pub token_value: String,
}
