//! sentimyx-engine: Aggregation and projection of per-source sentiment scores.
//!
//! ## Pipeline
//!
//! 1. [`aggregate`] queries a [`ScoringProvider`] once per (term, source) pair,
//!    sequentially, and merges the metric vectors into one [`TermRecord`] per term
//! 2. optionally [`summary::summarize`] collapses each metric to a mean or median
//! 3. [`project`] renders the records as raw JSON, a JSON row table or a
//!    pipe-delimited table
//!
//! Provider failures are logged and recorded on the [`Aggregation`]; they
//! never abort the run.

pub mod aggregate;
pub mod projection;
pub mod provider;
pub mod record;
pub mod summary;

pub use aggregate::{aggregate, Aggregation, QueryFailure};
pub use projection::{build_table, project, Cell, ProjectionError, Table};
pub use provider::{CommandProvider, MockScoringProvider, ProviderError, ScoringProvider};
pub use record::{Contribution, MetricValues, Reading, SourceResult, TermRecord, TermRecords};

use sentimyx_common::{Result, RunConfig};

/// Result of a complete run: the merged records and their rendering.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub aggregation: Aggregation,
    pub rendered: String,
}

/// Validate `config`, aggregate every term and render the result.
///
/// # Errors
///
/// Returns a configuration error before any query is issued if the config is
/// invalid, or a projection error if a table cannot be built from the
/// aggregated records.
pub fn run(config: &RunConfig, provider: &mut dyn ScoringProvider) -> Result<RunOutput> {
    config.validate()?;
    let aggregation = aggregate(&config.terms, &config.sources, provider, config.summary);
    let rendered = project(&aggregation.records, config.output)?;
    Ok(RunOutput {
        aggregation,
        rendered,
    })
}
