//! Sentimyx: sentiment analysis of web search results.
//! Entry point for the command-line binary.

mod cli;
mod config;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sentimyx_engine::CommandProvider;

use crate::cli::Cli;
use crate::config::Config;

fn build_provider(cli: &Cli, config: &Config) -> CommandProvider {
    let mut provider =
        CommandProvider::new(&config.provider.command).with_args(config.provider.args.clone());

    let credentials = cli
        .credentials
        .clone()
        .or_else(|| config.provider.credentials_file.clone());
    if let Some(path) = credentials {
        info!("Forwarding credentials file '{}'", path.display());
        provider = provider.with_credentials_file(path);
    }

    let home = cli
        .provider_home
        .clone()
        .or_else(|| config.provider.home_dir.clone());
    if let Some(dir) = home {
        provider = provider.with_home_dir(dir);
    }

    provider
}

fn init_logging(debug: bool, config: &Config) {
    // --debug beats RUST_LOG; RUST_LOG beats the config file.
    let filter = if debug {
        EnvFilter::new(config::debug_log_filter())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(cli.debug, &config);

    info!("Sentimyx {}", env!("CARGO_PKG_VERSION"));

    let run_config = cli.build_run_config(&config)?;
    run_config.validate()?;

    let has_credentials = cli.credentials.is_some() || config.provider.credentials_file.is_some();
    if !has_credentials {
        for source in run_config.credentialed_sources() {
            warn!("Source '{source}' needs a credentials file (--id); its queries will fail");
        }
    }

    info!(
        "Querying {} term(s) against {} source(s): {}",
        run_config.terms.len(),
        run_config.sources.len(),
        run_config.sources.join(", ")
    );

    let mut provider = build_provider(&cli, &config);
    let output = sentimyx_engine::run(&run_config, &mut provider)?;

    let failures = &output.aggregation.failures;
    if !failures.is_empty() {
        let total = output.aggregation.records.len() * run_config.sources.len();
        warn!("{} of {} queries failed", failures.len(), total);
    }
    for term in output.aggregation.exhausted_terms() {
        warn!("No source returned scores for '{term}'; it produces no table rows");
    }

    println!("{}", output.rendered);
    Ok(())
}
