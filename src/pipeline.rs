//! Batch orchestration over volumes.
//!
//! Each volume is merged, cached, and cut independently; a failing volume is
//! reported in the [`PipelineReport`] and the batch continues. The merged
//! per-volume tables, the corpus table, and the issue table are each
//! recomputed only when their file does not exist yet, so recovering from a
//! bad run means deleting the stale file and running again.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::boundary::cut_issue;
use crate::codec::{
    decode_corpus, decode_issues, decode_merged, decode_token_rows, encode_corpus, encode_issues,
    encode_merged,
};
use crate::config::CorpusConfig;
use crate::constants::files::{CORPUS_FILE, CSV_EXTENSION, ISSUES_FILE, VOLUMES_SUBDIR};
use crate::corpus::{assemble_corpus, rollup_issues};
use crate::data::{AnnotationRow, CorpusPageRow, IssueRow, MergedPageRow, VolumeInfo};
use crate::errors::CorpusError;
use crate::normalize::normalize_annotations;
use crate::reconcile::reconcile;
use crate::transport::fs::{csv_files_under, read_table, write_atomic};
use crate::types::VolumeId;

/// One volume to process: its catalog record and extracted token table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeJob {
    /// Catalog record of the volume.
    pub info: VolumeInfo,
    /// Extracted token table.
    pub tokens_path: PathBuf,
}

/// Result of processing one volume.
#[derive(Debug)]
pub enum VolumeOutcome {
    /// The volume was merged and cut.
    Completed {
        /// Annotated volume label.
        volume: VolumeId,
        /// Merged table was read from the cache instead of recomputed.
        cached: bool,
        /// Pages after reconciliation.
        merged_pages: usize,
        /// Pages kept by boundary cutting.
        retained_pages: usize,
        /// Join conflicts resolved in favor of the annotation (zero when cached).
        conflicts: usize,
    },
    /// The volume was skipped; other volumes are unaffected.
    Failed {
        /// Annotated volume label.
        volume: VolumeId,
        /// Why the volume was skipped.
        error: CorpusError,
    },
}

impl VolumeOutcome {
    /// Volume this outcome belongs to.
    pub fn volume(&self) -> &str {
        match self {
            Self::Completed { volume, .. } | Self::Failed { volume, .. } => volume,
        }
    }

    /// True when the volume could not be processed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Per-volume outcomes in job order; empty when the corpus table was cached.
    pub volumes: Vec<VolumeOutcome>,
    /// The corpus table was read from its existing file.
    pub corpus_cached: bool,
    /// The issue table was read from its existing file.
    pub issues_cached: bool,
}

impl PipelineReport {
    /// Outcomes of volumes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &VolumeOutcome> {
        self.volumes.iter().filter(|outcome| outcome.is_failed())
    }
}

/// Corpus tables produced (or loaded) by a run.
#[derive(Debug)]
pub struct CorpusBuild {
    /// Corpus page table.
    pub corpus: Vec<CorpusPageRow>,
    /// Issue table rolled up from `corpus`.
    pub issues: Vec<IssueRow>,
    /// What the run did.
    pub report: PipelineReport,
}

/// A merged volume before boundary cutting.
#[derive(Debug)]
pub struct MergedVolume {
    /// Reconciled pages, sorted by sequence.
    pub pages: Vec<MergedPageRow>,
    /// Read from the merged-table cache.
    pub cached: bool,
    /// Join conflicts reported by reconciliation.
    pub conflicts: usize,
}

struct CutVolume {
    pages: Vec<MergedPageRow>,
    outcome: VolumeOutcome,
}

/// Corpus build over an output directory.
pub struct CorpusPipeline {
    config: CorpusConfig,
    output_dir: PathBuf,
}

impl CorpusPipeline {
    /// Create a pipeline writing under `output_dir`.
    pub fn new(config: CorpusConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    /// Options this pipeline runs with.
    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// Directory holding one merged table per volume.
    pub fn volumes_dir(&self) -> PathBuf {
        self.output_dir.join(VOLUMES_SUBDIR)
    }

    /// Cache path of a volume's merged table.
    pub fn merged_path(&self, info: &VolumeInfo) -> PathBuf {
        self.volumes_dir()
            .join(format!("{}.{}", info.file_stem(), CSV_EXTENSION))
    }

    /// Path of the combined corpus table.
    pub fn corpus_path(&self) -> PathBuf {
        self.output_dir.join(CORPUS_FILE)
    }

    /// Path of the combined issue table.
    pub fn issues_path(&self) -> PathBuf {
        self.output_dir.join(ISSUES_FILE)
    }

    /// Read and normalize the annotation table with the configured date replacements.
    pub fn load_annotations(&self, path: &Path) -> Result<Vec<AnnotationRow>, CorpusError> {
        let rows = normalize_annotations(read_table(path)?, &self.config.date_replacements)?;
        info!(
            "[serials:pipeline] loaded {} annotation rows from {}",
            rows.len(),
            path.display()
        );
        Ok(rows)
    }

    /// Merge one volume, reading the cached merged table when it exists.
    ///
    /// Only annotation rows of the job's volume take part in the join.
    pub fn merge_volume(
        &self,
        job: &VolumeJob,
        annotations: &[AnnotationRow],
    ) -> Result<MergedVolume, CorpusError> {
        let path = self.merged_path(&job.info);
        if path.exists() {
            debug!(
                "[serials:pipeline] volume '{}' merged table cached at {}",
                job.info.original_volume_id,
                path.display()
            );
            return Ok(MergedVolume {
                pages: decode_merged(read_table(&path)?)?,
                cached: true,
                conflicts: 0,
            });
        }

        let tokens = decode_token_rows(read_table(&job.tokens_path)?, &job.info)?;
        let subset: Vec<AnnotationRow> = annotations
            .iter()
            .filter(|row| row.original_volume_id == job.info.original_volume_id)
            .cloned()
            .collect();
        if subset.is_empty() {
            warn!(
                "[serials:pipeline] volume '{}' has no annotation rows",
                job.info.original_volume_id
            );
        }
        let reconciliation = reconcile(&subset, &tokens);
        write_atomic(&path, &encode_merged(&reconciliation.pages))?;
        Ok(MergedVolume {
            pages: reconciliation.pages,
            cached: false,
            conflicts: reconciliation.conflicts.len(),
        })
    }

    /// Merge and cut one volume with the boundary variant configured for its title.
    pub fn process_volume(
        &self,
        job: &VolumeJob,
        annotations: &[AnnotationRow],
    ) -> Result<Vec<MergedPageRow>, CorpusError> {
        self.cut_job(job, annotations).map(|cut| cut.pages)
    }

    fn cut_job(&self, job: &VolumeJob, annotations: &[AnnotationRow]) -> Result<CutVolume, CorpusError> {
        let merged = self.merge_volume(job, annotations)?;
        let volume = job.info.original_volume_id.clone();
        let merged_pages = merged.pages.len();
        let variant = self.config.boundary_for(&job.info.magazine_title());
        let pages = cut_issue(&volume, merged.pages, variant)?;
        Ok(CutVolume {
            outcome: VolumeOutcome::Completed {
                volume,
                cached: merged.cached,
                merged_pages,
                retained_pages: pages.len(),
                conflicts: merged.conflicts,
            },
            pages,
        })
    }

    /// Build the corpus and issue tables from annotations and token tables.
    pub fn run(
        &self,
        annotations: &[AnnotationRow],
        jobs: &[VolumeJob],
    ) -> Result<CorpusBuild, CorpusError> {
        self.build(|| {
            let results: Vec<Result<CutVolume, CorpusError>> = if self.config.parallel {
                jobs.par_iter()
                    .map(|job| self.cut_job(job, annotations))
                    .collect()
            } else {
                jobs.iter()
                    .map(|job| self.cut_job(job, annotations))
                    .collect()
            };
            jobs.iter()
                .map(|job| job.info.original_volume_id.clone())
                .zip(results)
                .collect()
        })
    }

    /// Build the corpus and issue tables from the cached merged tables alone.
    ///
    /// Volume identity and title come from the cached rows themselves.
    pub fn assemble_from_cache(&self) -> Result<CorpusBuild, CorpusError> {
        let files = csv_files_under(&self.volumes_dir());
        info!(
            "[serials:pipeline] assembling from {} cached volumes in {}",
            files.len(),
            self.volumes_dir().display()
        );
        self.build(|| {
            files
                .iter()
                .map(|path| {
                    let label = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    (label, self.cut_cached(path))
                })
                .collect()
        })
    }

    fn cut_cached(&self, path: &Path) -> Result<CutVolume, CorpusError> {
        let pages = decode_merged(read_table(path)?)?;
        let (volume, title) = pages
            .first()
            .map(|page| {
                (
                    page.original_volume_id.clone(),
                    page.meta.magazine_title.clone().unwrap_or_default(),
                )
            })
            .unwrap_or_default();
        let merged_pages = pages.len();
        let pages = cut_issue(&volume, pages, self.config.boundary_for(&title))?;
        Ok(CutVolume {
            outcome: VolumeOutcome::Completed {
                volume,
                cached: true,
                merged_pages,
                retained_pages: pages.len(),
                conflicts: 0,
            },
            pages,
        })
    }

    fn build<F>(&self, cut_volumes: F) -> Result<CorpusBuild, CorpusError>
    where
        F: FnOnce() -> Vec<(VolumeId, Result<CutVolume, CorpusError>)>,
    {
        let mut report = PipelineReport::default();
        let corpus_path = self.corpus_path();
        let corpus = if corpus_path.exists() {
            info!(
                "[serials:pipeline] corpus table cached at {}; skipping volumes",
                corpus_path.display()
            );
            report.corpus_cached = true;
            decode_corpus(read_table(&corpus_path)?)?
        } else {
            let mut volumes = Vec::new();
            for (volume, result) in cut_volumes() {
                match result {
                    Ok(cut) => {
                        volumes.push(cut.pages);
                        report.volumes.push(cut.outcome);
                    }
                    Err(error) => {
                        warn!("[serials:pipeline] volume '{}' failed: {}", volume, error);
                        report.volumes.push(VolumeOutcome::Failed { volume, error });
                    }
                }
            }
            let corpus = assemble_corpus(volumes, &self.config.corrections)?;
            write_atomic(&corpus_path, &encode_corpus(&corpus))?;
            info!(
                "[serials:pipeline] wrote {} corpus pages to {}",
                corpus.len(),
                corpus_path.display()
            );
            corpus
        };

        let issues_path = self.issues_path();
        let issues = if issues_path.exists() {
            info!(
                "[serials:pipeline] issue table cached at {}",
                issues_path.display()
            );
            report.issues_cached = true;
            decode_issues(read_table(&issues_path)?)?
        } else {
            let issues = rollup_issues(&corpus)?;
            write_atomic(&issues_path, &encode_issues(&issues)?)?;
            info!(
                "[serials:pipeline] wrote {} issues to {}",
                issues.len(),
                issues_path.display()
            );
            issues
        };

        let failed = report.failures().count();
        if failed > 0 {
            warn!(
                "[serials:pipeline] {} of {} volumes failed",
                failed,
                report.volumes.len()
            );
        }
        Ok(CorpusBuild {
            corpus,
            issues,
            report,
        })
    }
}
