//! Configuration loading for Sentimyx.
//! Reads sentimyx.toml from the path given on the command line, the path in
//! SENTIMYX_CONFIG, or the current directory. A missing default file means
//! built-in defaults.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sentimyx_common::{OutputMode, Reducer, DEFAULT_SOURCE};

pub const DEFAULT_CONFIG_FILE: &str = "sentimyx.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Scoring program invoked once per (source, term) query
    #[serde(default = "default_provider_command")]
    pub command: String,
    /// Arguments placed before the source id and term
    #[serde(default)]
    pub args: Vec<String>,
    /// Credentials file forwarded to the provider (needed for twitter)
    pub credentials_file: Option<PathBuf>,
    /// Provider installation directory
    pub home_dir: Option<PathBuf>,
}

fn default_provider_command() -> String { "sentimyx-score".to_string() }

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            command: default_provider_command(),
            args: vec![],
            credentials_file: None,
            home_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    #[serde(default)]
    pub output: OutputMode,
    #[serde(default)]
    pub summary: Option<Reducer>,
}

fn default_sources() -> Vec<String> { vec![DEFAULT_SOURCE.id().to_string()] }

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            output: OutputMode::default(),
            summary: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter()   -> String { "sentimyx=info,warn".to_string() }
pub fn debug_log_filter() -> String { "sentimyx=debug,info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}


impl Config {
    /// Load configuration.
    /// An explicit path (argument or SENTIMYX_CONFIG) must exist; the default
    /// `sentimyx.toml` is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("SENTIMYX_CONFIG").map(PathBuf::from));

        match requested {
            Some(path) => Self::from_file(&path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
