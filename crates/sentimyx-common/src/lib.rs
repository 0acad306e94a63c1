//! sentimyx-common: Shared errors, run configuration and the source catalog
//! used across all Sentimyx crates.

pub mod error;
pub mod run_config;
pub mod sources;

// Re-export commonly used types
pub use error::{Result, SentimyxError};
pub use run_config::{OutputMode, Reducer, RunConfig};
pub use sources::{SourceKind, DEFAULT_SOURCE};
