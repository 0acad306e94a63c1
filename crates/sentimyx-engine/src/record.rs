//! Per-term aggregation records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider key carrying document ids rather than sentiment; never merged.
pub const META_ID_KEY: &str = "MetaID";
/// Column / raw-output key holding the contributing source ids.
pub const ENGINE_KEY: &str = "engine";
/// Column holding the search term in table output.
pub const KEYWORD_KEY: &str = "keyword";

/// A single metric reading. `None` is a screened-out NaN.
pub type Reading = Option<f64>;

/// Raw output of one provider call: metric name → readings, NaN included.
pub type SourceResult = BTreeMap<String, Vec<f64>>;

/// All records of a run, keyed by term in processing order.
pub type TermRecords = IndexMap<String, TermRecord>;

/// Values collected for one metric of one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValues {
    /// Concatenated readings, in the order of `TermRecord::engines`
    Series(Vec<Reading>),
    /// Term-level summary statistic; `None` when no reading was usable
    Summary(Reading),
}

/// The run of series elements one source contributed to one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    /// Index into `TermRecord::engines`
    pub engine: usize,
    /// Number of elements appended by that source
    pub len: usize,
}

/// Merged provider results for one term.
///
/// Serializes as `{"engine": [...], "<metric>": [...] | <number> | null, ...}`
/// with metric keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermRecord {
    /// Sources whose query succeeded, in invocation order
    #[serde(rename = "engine", default)]
    pub engines: Vec<String>,

    #[serde(flatten)]
    pub metrics: BTreeMap<String, MetricValues>,

    /// Which engine produced each part of a metric series, in merge order.
    /// Not serialized; records read back from raw output fall back to
    /// one element per engine.
    #[serde(skip)]
    pub provenance: BTreeMap<String, Vec<Contribution>>,
}

impl TermRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no source contributed to this term.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty() && self.metrics.is_empty()
    }

    /// Append the readings engine `engine` returned for `metric`.
    ///
    /// Appending to a summarized metric turns it back into a series holding
    /// only the new values; summaries are only produced once a term is final.
    pub fn extend_metric(
        &mut self,
        metric: &str,
        engine: usize,
        values: impl IntoIterator<Item = Reading>,
    ) {
        let values: Vec<Reading> = values.into_iter().collect();
        let contribution = Contribution { engine, len: values.len() };

        let entry = self
            .metrics
            .entry(metric.to_string())
            .or_insert_with(|| MetricValues::Series(Vec::new()));
        let provenance = self.provenance.entry(metric.to_string()).or_default();
        match entry {
            MetricValues::Series(series) => series.extend(values),
            summary => {
                *summary = MetricValues::Series(values);
                provenance.clear();
            }
        }
        provenance.push(contribution);
    }

    /// Contributions making up the series of `metric`.
    ///
    /// Without recorded provenance every element is attributed to the engine
    /// at the same position. Summarized or absent metrics have none.
    pub fn contributions(&self, metric: &str) -> Vec<Contribution> {
        let Some(MetricValues::Series(series)) = self.metrics.get(metric) else {
            return Vec::new();
        };
        match self.provenance.get(metric) {
            Some(recorded) => recorded.clone(),
            None => (0..series.len())
                .map(|engine| Contribution { engine, len: 1 })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_serializes_engine_only() {
        let json = serde_json::to_string(&TermRecord::new()).unwrap();
        assert_eq!(json, r#"{"engine":[]}"#);
    }

    #[test]
    fn test_record_serialization_shape() {
        let mut record = TermRecord::new();
        record.engines = vec!["s1".into(), "s2".into()];
        record.extend_metric("subjectivity", 0, [Some(0.25)]);
        record.extend_metric("subjectivity", 1, [None]);
        record
            .metrics
            .insert("polarity".into(), MetricValues::Summary(Some(0.5)));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"engine":["s1","s2"],"polarity":0.5,"subjectivity":[0.25,null]}"#
        );
    }

    #[test]
    fn test_raw_shape_parses_back() {
        let json = r#"{"engine":["s1"],"polarity":[0.5],"sentiment":null}"#;
        let record: TermRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.engines, vec!["s1"]);
        assert_eq!(
            record.metrics["polarity"],
            MetricValues::Series(vec![Some(0.5)])
        );
        assert_eq!(record.metrics["sentiment"], MetricValues::Summary(None));
    }

    #[test]
    fn test_extend_metric_concatenates() {
        let mut record = TermRecord::new();
        record.extend_metric("polarity", 0, [Some(0.1)]);
        record.extend_metric("polarity", 1, [Some(0.2), None]);
        assert_eq!(
            record.metrics["polarity"],
            MetricValues::Series(vec![Some(0.1), Some(0.2), None])
        );
        assert_eq!(
            record.contributions("polarity"),
            vec![
                Contribution { engine: 0, len: 1 },
                Contribution { engine: 1, len: 2 },
            ]
        );
        assert!(!record.is_empty());
    }

    #[test]
    fn test_contributions_fall_back_to_positions() {
        let json = r#"{"engine":["s1","s2"],"polarity":[0.5,null],"sentiment":0.1}"#;
        let record: TermRecord = serde_json::from_str(json).unwrap();

        assert!(record.provenance.is_empty());
        assert_eq!(
            record.contributions("polarity"),
            vec![
                Contribution { engine: 0, len: 1 },
                Contribution { engine: 1, len: 1 },
            ]
        );
        assert!(record.contributions("sentiment").is_empty());
        assert!(record.contributions("absent").is_empty());
    }
}
