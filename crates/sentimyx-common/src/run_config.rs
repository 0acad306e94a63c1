//! Run configuration: which terms to analyse, which sources to query,
//! how to summarise and how to render the result.
//!
//! Can be built from CLI flags or loaded from a YAML/JSON run file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, SentimyxError};
use crate::sources::{SourceKind, DEFAULT_SOURCE};

/// Complete description of one sentiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Search keywords, processed in order
    #[serde(default)]
    pub terms: Vec<String>,

    /// Source ids to query for every term, in order
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    /// Optional per-metric summary statistic
    #[serde(default)]
    pub summary: Option<Reducer>,

    /// Output shape
    #[serde(default)]
    pub output: OutputMode,
}

fn default_sources() -> Vec<String> {
    vec![DEFAULT_SOURCE.id().to_string()]
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            terms: vec![],
            sources: default_sources(),
            summary: None,
            output: OutputMode::default(),
        }
    }
}

// ── Summary reducer ──────────────────────────────────────────────────────────

/// Summary statistic applied to each metric of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Mean,
    Median,
}

impl Reducer {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Reducer {
    type Err = SentimyxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            other => Err(SentimyxError::Config(format!(
                "unknown summary function '{other}' (expected mean or median)"
            ))),
        }
    }
}

// ── Output mode ──────────────────────────────────────────────────────────────

/// Shape of the rendered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Nested JSON object keyed by term
    Raw,
    /// JSON array of rows, header first
    #[default]
    RowTable,
    /// `|`-delimited lines, header first
    PipeTable,
}

impl OutputMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::RowTable => "row-table",
            Self::PipeTable => "pipe-table",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputMode {
    type Err = SentimyxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "raw" => Ok(Self::Raw),
            "row-table" => Ok(Self::RowTable),
            "pipe-table" => Ok(Self::PipeTable),
            other => Err(SentimyxError::Config(format!(
                "unknown output mode '{other}' (expected raw, row-table or pipe-table)"
            ))),
        }
    }
}

// ── Helper Methods ───────────────────────────────────────────────────────────

impl RunConfig {
    /// Load from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load a run file, picking the format from its extension.
    /// Anything other than `.json` is read as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            _ => Self::from_yaml(path),
        }
    }

    /// Check the run can start. Nothing is queried when this fails.
    pub fn validate(&self) -> Result<()> {
        if self.terms.is_empty() {
            return Err(SentimyxError::Config("search term required".into()));
        }
        if let Some(blank) = self.terms.iter().position(|t| t.trim().is_empty()) {
            return Err(SentimyxError::Config(format!(
                "search term #{} is blank",
                blank + 1
            )));
        }
        if self.sources.is_empty() {
            return Err(SentimyxError::Config(
                "at least one source must be requested".into(),
            ));
        }
        self.source_kinds()?;
        Ok(())
    }

    /// Resolve the requested source ids against the catalog.
    pub fn source_kinds(&self) -> Result<Vec<SourceKind>> {
        self.sources.iter().map(|s| s.parse()).collect()
    }

    /// Requested sources that need a credentials file.
    pub fn credentialed_sources(&self) -> Vec<SourceKind> {
        self.sources
            .iter()
            .filter_map(|s| s.parse::<SourceKind>().ok())
            .filter(|k| k.requires_credentials())
            .collect()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
