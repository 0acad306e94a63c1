//! Render aggregated records as raw JSON or as a rectangular table.
//!
//! Table modes share one header for the whole run: `keyword`, `engine`,
//! then every metric seen in any non-empty record, sorted. Row `i` of a
//! term pairs `engines[i]` with the value that engine contributed to each
//! metric series (missing if it contributed none), or with the term's scalar
//! when the metric is summarized.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use thiserror::Error;

use sentimyx_common::{OutputMode, SentimyxError};

use crate::record::{MetricValues, Reading, TermRecord, TermRecords, ENGINE_KEY, KEYWORD_KEY};

pub const PIPE_DELIMITER: &str = "|";

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error(
        "metric '{metric}' for term '{term}' has {values} values that cannot be aligned \
         one per engine across {engines} engines; use a summary function or raw output"
    )]
    MisalignedMetric {
        term: String,
        metric: String,
        values: usize,
        engines: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ProjectionError> for SentimyxError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::Serialization(e) => SentimyxError::Serialization(e),
            other => SentimyxError::Projection(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    /// Text used in pipe-delimited output. Numbers are formatted as in JSON;
    /// a missing value is an empty cell.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(|n| n.to_string())
                .unwrap_or_default(),
            Self::Missing => String::new(),
        }
    }
}

impl From<Reading> for Cell {
    fn from(reading: Reading) -> Self {
        reading.map_or(Cell::Missing, Cell::Number)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

/// Rectangular view of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Header and rows joined by `|`, one line each.
    pub fn to_pipe_lines(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.header.join(PIPE_DELIMITER));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(Cell::render).collect();
            lines.push(cells.join(PIPE_DELIMITER));
        }
        lines.join("\n")
    }

    /// Pretty JSON array with the header as first row.
    pub fn to_json_rows(&self) -> Result<String> {
        let mut all: Vec<Vec<Cell>> = Vec::with_capacity(self.rows.len() + 1);
        all.push(self.header.iter().cloned().map(Cell::Text).collect());
        all.extend(self.rows.iter().cloned());
        Ok(serde_json::to_string_pretty(&all)?)
    }
}

/// Sorted union of metric names over all non-empty records.
pub fn metric_columns(records: &TermRecords) -> Vec<String> {
    let names: BTreeSet<&String> = records
        .values()
        .filter(|record| !record.is_empty())
        .flat_map(|record| record.metrics.keys())
        .filter(|name| name.as_str() != ENGINE_KEY && name.as_str() != KEYWORD_KEY)
        .collect();
    names.into_iter().cloned().collect()
}

/// Build the shared table. Empty records produce no rows.
pub fn build_table(records: &TermRecords) -> Result<Table> {
    let metrics = metric_columns(records);

    let mut header = Vec::with_capacity(metrics.len() + 2);
    header.push(KEYWORD_KEY.to_string());
    header.push(ENGINE_KEY.to_string());
    header.extend(metrics.iter().cloned());

    let mut rows = Vec::new();
    for (term, record) in records {
        if record.is_empty() {
            continue;
        }
        check_alignment(term, record)?;

        for (i, engine) in record.engines.iter().enumerate() {
            let mut row = Vec::with_capacity(header.len());
            row.push(Cell::Text(term.clone()));
            row.push(Cell::Text(engine.clone()));
            row.extend(metrics.iter().map(|m| cell_at(record, m, i)));
            rows.push(row);
        }
    }

    Ok(Table { header, rows })
}

/// Every engine may contribute at most one element to a metric series.
/// Fewer is fine; the gaps become missing cells.
fn check_alignment(term: &str, record: &TermRecord) -> Result<()> {
    let engines = record.engines.len();
    for (metric, values) in &record.metrics {
        let MetricValues::Series(series) = values else {
            continue;
        };
        let contributions = record.contributions(metric);
        let misaligned = contributions
            .iter()
            .find(|c| c.len > 1 || c.engine >= engines);
        if let Some(contribution) = misaligned {
            let source = record
                .engines
                .get(contribution.engine)
                .map_or("<none>", String::as_str);
            tracing::warn!(
                term,
                metric = %metric,
                source,
                values = series.len(),
                engines,
                "metric series cannot be aligned one value per engine"
            );
            return Err(ProjectionError::MisalignedMetric {
                term: term.to_string(),
                metric: metric.clone(),
                values: series.len(),
                engines,
            });
        }
    }
    Ok(())
}

/// Value of `metric` contributed by the engine at `row`.
fn cell_at(record: &TermRecord, metric: &str, row: usize) -> Cell {
    let series = match record.metrics.get(metric) {
        Some(MetricValues::Series(series)) => series,
        Some(MetricValues::Summary(value)) => return (*value).into(),
        None => return Cell::Missing,
    };

    let mut offset = 0;
    for contribution in record.contributions(metric) {
        if contribution.engine == row {
            return match contribution.len {
                0 => Cell::Missing,
                _ => series.get(offset).copied().flatten().into(),
            };
        }
        offset += contribution.len;
    }
    Cell::Missing
}

/// Render `records` in the requested mode.
///
/// Raw output keeps every term, including ones no source answered for
/// (`{"engine": []}`). Table output skips them.
pub fn project(records: &TermRecords, mode: OutputMode) -> Result<String> {
    match mode {
        OutputMode::Raw => Ok(serde_json::to_string_pretty(records)?),
        OutputMode::RowTable => build_table(records)?.to_json_rows(),
        OutputMode::PipeTable => Ok(build_table(records)?.to_pipe_lines()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(engines: &[&str], metrics: &[(&str, MetricValues)]) -> TermRecord {
        TermRecord {
            engines: engines.iter().map(|e| e.to_string()).collect(),
            metrics: metrics
                .iter()
                .map(|(name, values)| (name.to_string(), values.clone()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cell_render() {
        assert_eq!(Cell::Number(0.5).render(), "0.5");
        assert_eq!(Cell::Number(1.0).render(), "1.0");
        assert_eq!(Cell::Number(f64::INFINITY).render(), "");
        assert_eq!(Cell::Missing.render(), "");
        assert_eq!(Cell::Text("acme".into()).render(), "acme");
    }

    #[test]
    fn test_header_is_sorted_union() {
        let mut records = TermRecords::new();
        records.insert(
            "acme".into(),
            record(&["s1"], &[("subjectivity", MetricValues::Series(vec![Some(0.1)]))]),
        );
        records.insert(
            "globex".into(),
            record(&["s1"], &[("polarity", MetricValues::Series(vec![Some(0.2)]))]),
        );
        records.insert("initech".into(), TermRecord::new());

        let table = build_table(&records).unwrap();
        assert_eq!(table.header, vec!["keyword", "engine", "polarity", "subjectivity"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], Cell::Missing);
        assert_eq!(table.rows[1][3], Cell::Missing);
    }

    #[test]
    fn test_short_series_without_provenance_pads_at_end() {
        let mut records = TermRecords::new();
        records.insert(
            "acme".into(),
            record(&["s1", "s2"], &[("polarity", MetricValues::Series(vec![Some(0.4)]))]),
        );

        let table = build_table(&records).unwrap();
        assert_eq!(table.rows[0][2], Cell::Number(0.4));
        assert_eq!(table.rows[1][2], Cell::Missing);
    }

    #[test]
    fn test_value_stays_with_contributing_engine() {
        let mut acme = TermRecord::new();
        acme.engines = vec!["s1".into(), "s2".into()];
        acme.extend_metric("subjectivity", 0, [Some(0.1)]);
        acme.extend_metric("polarity", 1, [Some(0.9)]);
        acme.extend_metric("subjectivity", 1, [Some(0.2)]);

        let mut records = TermRecords::new();
        records.insert("acme".into(), acme);

        let lines = project(&records, OutputMode::PipeTable).unwrap();
        assert_eq!(
            lines,
            "keyword|engine|polarity|subjectivity\nacme|s1||0.1\nacme|s2|0.9|0.2"
        );
    }

    #[test]
    fn test_empty_contribution_is_missing_cell() {
        let mut acme = TermRecord::new();
        acme.engines = vec!["s1".into(), "s2".into()];
        acme.extend_metric("polarity", 0, Vec::<Reading>::new());
        acme.extend_metric("polarity", 1, [Some(0.3)]);

        let mut records = TermRecords::new();
        records.insert("acme".into(), acme);

        let table = build_table(&records).unwrap();
        assert_eq!(table.rows[0][2], Cell::Missing);
        assert_eq!(table.rows[1][2], Cell::Number(0.3));
    }

    #[test]
    fn test_multi_valued_engine_rejected_even_when_lengths_match() {
        let mut acme = TermRecord::new();
        acme.engines = vec!["s1".into(), "s2".into()];
        acme.extend_metric("polarity", 0, [Some(0.1), Some(0.2)]);
        acme.extend_metric("subjectivity", 1, [Some(0.5)]);

        let mut records = TermRecords::new();
        records.insert("acme".into(), acme);

        let err = build_table(&records).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::MisalignedMetric { ref metric, values: 2, engines: 2, .. }
                if metric == "polarity"
        ));
    }

    #[test]
    fn test_long_series_is_rejected() {
        let mut records = TermRecords::new();
        records.insert(
            "acme".into(),
            record(
                &["s1"],
                &[("polarity", MetricValues::Series(vec![Some(0.1), Some(0.2)]))],
            ),
        );

        let err = build_table(&records).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::MisalignedMetric { values: 2, engines: 1, .. }
        ));
        // Raw output is still available.
        assert!(project(&records, OutputMode::Raw).is_ok());
    }

    #[test]
    fn test_summary_repeats_on_every_engine_row() {
        let mut records = TermRecords::new();
        records.insert(
            "acme".into(),
            record(&["s1", "s2"], &[("polarity", MetricValues::Summary(Some(0.5)))]),
        );

        let lines = project(&records, OutputMode::PipeTable).unwrap();
        assert_eq!(lines, "keyword|engine|polarity\nacme|s1|0.5\nacme|s2|0.5");
    }

    #[test]
    fn test_no_rows_keeps_header() {
        let mut records = TermRecords::new();
        records.insert("acme".into(), TermRecord::new());

        assert_eq!(project(&records, OutputMode::PipeTable).unwrap(), "keyword|engine");
        let raw = project(&records, OutputMode::Raw).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, serde_json::json!({"acme": {"engine": []}}));
    }

    #[test]
    fn test_projection_error_converts() {
        let err: SentimyxError = ProjectionError::MisalignedMetric {
            term: "acme".into(),
            metric: "polarity".into(),
            values: 3,
            engines: 1,
        }
        .into();
        assert!(matches!(err, SentimyxError::Projection(_)));
        assert!(err.to_string().contains("polarity"));
    }
}
