//! Trait for scoring provider access.
//!
//! A scoring provider runs one web query for a (source, term) pair, scores
//! the returned documents and hands back a map of metric → readings. The
//! engine never talks to a search backend directly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use sentimyx_common::SourceKind;
use serde_json::Value;
use thiserror::Error;

use crate::record::{SourceResult, META_ID_KEY};

/// Why a single provider query could not be completed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("source '{0}' requires a credentials file")]
    MissingCredentials(String),

    #[error("failed to launch scoring provider: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("scoring provider exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("malformed provider output: {0}")]
    Malformed(String),
}

/// Access to the external scoring process.
///
/// Implementations usually wrap one stateful session (a loaded corpus, an
/// interpreter, an authenticated client), so queries take `&mut self` and
/// are issued one at a time.
pub trait ScoringProvider {
    /// Run `term` against `source` and return the scored metrics.
    fn run_query(&mut self, source: &str, term: &str) -> Result<SourceResult, ProviderError>;
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Mock provider with canned responses, for unit tests.
///
/// Unknown (source, term) pairs fail with [`ProviderError::Query`].
#[derive(Debug, Default)]
pub struct MockScoringProvider {
    responses: HashMap<(String, String), Result<SourceResult, String>>,
    calls: Vec<(String, String)>,
}

impl MockScoringProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `(source, term)` with the given metric vectors.
    pub fn with(mut self, source: &str, term: &str, metrics: &[(&str, &[f64])]) -> Self {
        let result = metrics
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect();
        self.responses
            .insert((source.to_string(), term.to_string()), Ok(result));
        self
    }

    /// Fail `(source, term)` with `reason`.
    pub fn failing(mut self, source: &str, term: &str, reason: &str) -> Self {
        self.responses.insert(
            (source.to_string(), term.to_string()),
            Err(reason.to_string()),
        );
        self
    }

    /// Every query received so far, in order.
    pub fn calls(&self) -> &[(String, String)] {
        &self.calls
    }
}

impl ScoringProvider for MockScoringProvider {
    fn run_query(&mut self, source: &str, term: &str) -> Result<SourceResult, ProviderError> {
        self.calls.push((source.to_string(), term.to_string()));
        match self.responses.get(&(source.to_string(), term.to_string())) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(reason)) => Err(ProviderError::Query(reason.clone())),
            None => Err(ProviderError::Query(format!(
                "no canned response for {source}/{term}"
            ))),
        }
    }
}

// ── External process adapter ────────────────────────────────────────────────

/// Provider backed by an external scoring program.
///
/// The program is started once per query as
/// `<program> <args...> <source_id> <term>` and must print a JSON object
/// mapping metric names to a number, `null`, or an array of those. `null`
/// (and the strings `"NaN"` / `"NA"`) stand for a not-a-number reading.
///
/// Environment passed to the program:
/// - `SENTIMYX_QUERY`: query expression for catalogued sources
/// - `SENTIMYX_CREDENTIALS`: credentials file, if configured
/// - `SENTIMYX_PROVIDER_HOME`: provider installation directory, if configured
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: PathBuf,
    args: Vec<String>,
    credentials_file: Option<PathBuf>,
    home_dir: Option<PathBuf>,
}

impl CommandProvider {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            credentials_file: None,
            home_dir: None,
        }
    }

    /// Arguments placed before the source id and term.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    pub fn with_home_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(path.into());
        self
    }

    fn command(&self, source: &str, term: &str) -> Result<Command, ProviderError> {
        let kind = source.parse::<SourceKind>().ok();
        if kind.is_some_and(|k| k.requires_credentials()) && self.credentials_file.is_none() {
            return Err(ProviderError::MissingCredentials(source.to_string()));
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(source).arg(term);
        if let Some(kind) = kind {
            cmd.env("SENTIMYX_QUERY", kind.query_expression(term));
        }
        if let Some(ref creds) = self.credentials_file {
            cmd.env("SENTIMYX_CREDENTIALS", creds);
        }
        if let Some(ref home) = self.home_dir {
            cmd.env("SENTIMYX_PROVIDER_HOME", home);
        }
        Ok(cmd)
    }
}

impl ScoringProvider for CommandProvider {
    fn run_query(&mut self, source: &str, term: &str) -> Result<SourceResult, ProviderError> {
        let mut cmd = self.command(source, term)?;
        tracing::debug!(program = %self.program.display(), source, term, "invoking scoring provider");

        let output = cmd.output()?;
        if !output.status.success() {
            return Err(ProviderError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_scores(&output.stdout)
    }
}

/// Parse the JSON printed by a scoring program.
///
/// A `MetaID` entry that is not numeric is dropped instead of rejected.
pub fn parse_scores(bytes: &[u8]) -> Result<SourceResult, ProviderError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(ProviderError::Malformed("expected a JSON object".into()));
    };

    let mut result = SourceResult::new();
    for (metric, value) in map {
        match parse_readings(&value) {
            Ok(readings) => {
                result.insert(metric, readings);
            }
            Err(_) if metric == META_ID_KEY => continue,
            Err(detail) => {
                return Err(ProviderError::Malformed(format!("metric '{metric}': {detail}")))
            }
        }
    }
    Ok(result)
}

fn parse_readings(value: &Value) -> Result<Vec<f64>, String> {
    match value {
        Value::Array(items) => items.iter().map(parse_reading).collect(),
        scalar => Ok(vec![parse_reading(scalar)?]),
    }
}

fn parse_reading(value: &Value) -> Result<f64, String> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("unrepresentable number {n}")),
        Value::String(s) if s == "NaN" || s == "NA" => Ok(f64::NAN),
        other => Err(format!("expected a number, got {other}")),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
