use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::corpus::corrections::{Correction, known_corrections};
use crate::errors::CorpusError;
use crate::types::TitleKey;
use crate::utils::title_matches;

/// Literal text replacement applied to raw annotation dates before parsing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DateReplacement {
    /// Literal text to find.
    pub from: String,
    /// Replacement text.
    pub to: String,
}

impl DateReplacement {
    /// Replace `from` with `to`.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// How issue boundaries are determined for a title's volumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryVariant {
    /// Keep from one page before the first cover (or TOC) through the last
    /// `end_of_issue`, minus `duplicates` ranges.
    #[default]
    CoverToc,
    /// Per issue, keep only pages after the first `split_issue` marker.
    SplitMarker,
}

impl BoundaryVariant {
    /// Short label used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CoverToc => "cover/toc",
            Self::SplitMarker => "split_issue",
        }
    }
}

/// Per-title processing options.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TitleConfig {
    /// Matched against a volume's magazine title (case- and separator-insensitive).
    pub title_key: TitleKey,
    /// Cutting rule for the title's volumes.
    #[serde(default)]
    pub boundary: BoundaryVariant,
}

impl TitleConfig {
    /// Create a title entry with an explicit boundary variant.
    pub fn new(title_key: impl Into<TitleKey>, boundary: BoundaryVariant) -> Self {
        Self {
            title_key: title_key.into(),
            boundary,
        }
    }
}

/// Top-level corpus build configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Replacements applied to raw annotation dates, in order.
    pub date_replacements: Vec<DateReplacement>,
    /// Per-title options; titles without an entry use [`BoundaryVariant::default`].
    pub titles: Vec<TitleConfig>,
    /// Corrections applied to the assembled corpus.
    pub corrections: Vec<Correction>,
    /// Reconcile volumes on the rayon thread pool.
    pub parallel: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            date_replacements: vec![
                DateReplacement::new("Decmeber", "December"),
                DateReplacement::new("Summer", "July"),
            ],
            titles: Vec::new(),
            corrections: known_corrections(),
            parallel: true,
        }
    }
}

impl CorpusConfig {
    /// Parse a JSON configuration; omitted fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, CorpusError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_path(path: &Path) -> Result<Self, CorpusError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Add a per-title entry.
    pub fn with_title(mut self, title: TitleConfig) -> Self {
        self.titles.push(title);
        self
    }

    /// Add a corpus correction.
    pub fn with_correction(mut self, correction: Correction) -> Self {
        self.corrections.push(correction);
        self
    }

    /// Enable or disable parallel volume reconciliation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Boundary variant for a magazine title; the first matching entry wins.
    pub fn boundary_for(&self, magazine_title: &str) -> BoundaryVariant {
        self.titles
            .iter()
            .find(|title| title_matches(magazine_title, &title.title_key))
            .map(|title| title.boundary)
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<(), CorpusError> {
        if let Some(title) = self.titles.iter().find(|title| title.title_key.trim().is_empty()) {
            return Err(CorpusError::Configuration(format!(
                "title entry with empty title_key (boundary {})",
                title.boundary.label()
            )));
        }
        if let Some(replacement) = self
            .date_replacements
            .iter()
            .find(|replacement| replacement.from.is_empty())
        {
            return Err(CorpusError::Configuration(format!(
                "date replacement with empty 'from' (to '{}')",
                replacement.to
            )));
        }
        Ok(())
    }
}
