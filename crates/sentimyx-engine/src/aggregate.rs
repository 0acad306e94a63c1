//! Merge per-source provider results into one record per term.
//!
//! Queries run strictly in term-major, source-minor order. A failed query is
//! logged and recorded, and contributes neither an engine nor any values.

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use sentimyx_common::Reducer;

use crate::provider::ScoringProvider;
use crate::record::{
    SourceResult, TermRecord, TermRecords, ENGINE_KEY, KEYWORD_KEY, META_ID_KEY,
};
use crate::summary::summarize;

/// A provider query that could not be completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    pub term: String,
    pub source: String,
    pub reason: String,
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub records: TermRecords,
    pub failures: Vec<QueryFailure>,
}

impl Aggregation {
    /// Terms for which every query failed.
    pub fn exhausted_terms(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|(_, record)| record.is_empty())
            .map(|(term, _)| term.as_str())
            .collect()
    }
}

/// Query every (term, source) pair and merge the results.
///
/// Terms keep their first-seen order; a repeated term is queried once.
/// When `reducer` is set, each metric of a term is collapsed to one scalar
/// after all of that term's sources have answered.
pub fn aggregate(
    terms: &[String],
    sources: &[String],
    provider: &mut dyn ScoringProvider,
    reducer: Option<Reducer>,
) -> Aggregation {
    let span = info_span!("aggregate", terms = terms.len(), sources = sources.len());
    let _guard = span.enter();

    let mut aggregation = Aggregation::default();

    for term in terms {
        if aggregation.records.contains_key(term) {
            warn!(term = %term, "duplicate search term ignored");
            continue;
        }

        let mut record = TermRecord::new();
        for source in sources {
            match provider.run_query(source, term) {
                Ok(result) => {
                    debug!(term = %term, source = %source, metrics = result.len(), "query scored");
                    merge_result(&mut record, source, result);
                }
                Err(err) => {
                    warn!(term = %term, source = %source, error = %err, "scoring query failed");
                    aggregation.failures.push(QueryFailure {
                        term: term.clone(),
                        source: source.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        if let Some(reducer) = reducer {
            summarize(&mut record, reducer);
        }
        aggregation.records.insert(term.clone(), record);
    }

    info!(
        terms = aggregation.records.len(),
        failures = aggregation.failures.len(),
        "aggregation finished"
    );
    aggregation
}

/// Fold one successful provider result into `record`.
///
/// NaN readings become missing values, and every appended run is tagged with
/// the source's position in `engines`. `MetaID` is dropped; a metric named
/// like a table column is dropped with a warning.
pub fn merge_result(record: &mut TermRecord, source: &str, result: SourceResult) {
    let engine = record.engines.len();
    record.engines.push(source.to_string());

    for (metric, values) in result {
        if metric == META_ID_KEY {
            continue;
        }
        if metric == ENGINE_KEY || metric == KEYWORD_KEY {
            warn!(source, metric = %metric, "provider returned a reserved metric name; dropped");
            continue;
        }
        record.extend_metric(&metric, engine, values.into_iter().map(screen));
    }
}

fn screen(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}
