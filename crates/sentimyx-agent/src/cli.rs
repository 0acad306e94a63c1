//! Command-line surface.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use sentimyx_common::{OutputMode, Reducer, RunConfig, SourceKind};

use crate::config::Config;

/// Perform sentiment analysis on web search results for one or more keywords.
#[derive(Debug, Parser)]
#[command(name = "sentimyx", version)]
pub struct Cli {
    /// Search terms to analyse
    #[arg(value_name = "TERM")]
    pub terms: Vec<String>,

    /// Include Google Blog search
    #[arg(short = 'b', long, help_heading = "Google engines")]
    pub google_blog: bool,
    /// Include Google Finance search
    #[arg(short = 'f', long, help_heading = "Google engines")]
    pub google_finance: bool,
    /// Include Google News search
    #[arg(short = 'n', long, help_heading = "Google engines")]
    pub google_news: bool,

    /// Include Yahoo Finance search
    #[arg(short = 'F', long, help_heading = "Yahoo engines")]
    pub yahoo_finance: bool,
    /// Include Yahoo InPlay search
    #[arg(short = 'I', long, help_heading = "Yahoo engines")]
    pub yahoo_inplay: bool,
    /// Include Yahoo News search
    #[arg(short = 'N', long, help_heading = "Yahoo engines")]
    pub yahoo_news: bool,

    /// Include Twitter search (requires --id)
    #[arg(short = 't', long, help_heading = "Other engines")]
    pub twitter: bool,
    /// Include a source by id (repeatable)
    #[arg(long = "source", value_name = "ID", help_heading = "Other engines")]
    pub sources: Vec<String>,

    /// Calculate the median of each metric
    #[arg(short = 'm', long, conflicts_with = "mean", help_heading = "Summary")]
    pub median: bool,
    /// Calculate the mean of each metric
    #[arg(short = 'M', long, help_heading = "Summary")]
    pub mean: bool,

    /// Print a pipe-delimited table
    #[arg(short = 'p', long = "pipe-delim", conflicts_with = "raw", help_heading = "Output")]
    pub pipe_delim: bool,
    /// Serialize output as a nested object rather than a table
    #[arg(short = 'r', long, help_heading = "Output")]
    pub raw: bool,

    /// Print debug output
    #[arg(short = 'd', long)]
    pub debug: bool,
    /// Credentials file forwarded to the scoring provider (e.g. twitter.RData)
    #[arg(long = "id", value_name = "FILE")]
    pub credentials: Option<PathBuf>,
    /// Installation directory of the scoring provider
    #[arg(long, value_name = "DIR")]
    pub provider_home: Option<PathBuf>,
    /// YAML or JSON file with terms, sources, summary and output
    #[arg(long, value_name = "FILE")]
    pub run_file: Option<PathBuf>,
    /// Config file (default: $SENTIMYX_CONFIG or ./sentimyx.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Sources selected by flags, in catalog order, followed by `--source` ids.
    pub fn requested_sources(&self) -> Vec<String> {
        let flags = [
            (self.google_blog, SourceKind::GoogleBlog),
            (self.google_finance, SourceKind::GoogleFinance),
            (self.google_news, SourceKind::GoogleNews),
            (self.yahoo_finance, SourceKind::YahooFinance),
            (self.yahoo_inplay, SourceKind::YahooInplay),
            (self.yahoo_news, SourceKind::YahooNews),
            (self.twitter, SourceKind::Twitter),
        ];
        flags
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, kind)| kind.id().to_string())
            .chain(self.sources.iter().cloned())
            .collect()
    }

    pub fn summary(&self) -> Option<Reducer> {
        if self.median {
            Some(Reducer::Median)
        } else if self.mean {
            Some(Reducer::Mean)
        } else {
            None
        }
    }

    pub fn output(&self) -> Option<OutputMode> {
        if self.pipe_delim {
            Some(OutputMode::PipeTable)
        } else if self.raw {
            Some(OutputMode::Raw)
        } else {
            None
        }
    }

    /// Merge CLI flags over the run file and the config-file defaults.
    pub fn build_run_config(&self, config: &Config) -> anyhow::Result<RunConfig> {
        let mut run = match self.run_file {
            Some(ref path) => RunConfig::from_path(path)
                .with_context(|| format!("Failed to load run file {}", path.display()))?,
            None => RunConfig {
                terms: vec![],
                sources: config.defaults.sources.clone(),
                summary: config.defaults.summary,
                output: config.defaults.output,
            },
        };

        if !self.terms.is_empty() {
            run.terms = self.terms.clone();
        }
        let sources = self.requested_sources();
        if !sources.is_empty() {
            run.sources = sources;
        }
        if let Some(summary) = self.summary() {
            run.summary = Some(summary);
        }
        if let Some(output) = self.output() {
            run.output = output;
        }
        Ok(run)
    }
}
