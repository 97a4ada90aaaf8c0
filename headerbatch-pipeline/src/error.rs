//! Top-level pipeline error.

use thiserror::Error;

use crate::{ConfigError, IngestError, SourceError, StoreError};

/// Errors that end a pipeline run.
///
/// Rejected trees and failed header lookups are not errors; they are
/// logged and counted in the [`PipelineReport`](crate::PipelineReport).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("header subscription failed: {0}")]
    Subscribe(#[source] SourceError),
    #[error("failed to store accepted tree for batch {batch_index}: {source}")]
    StoreFailure {
        batch_index: u64,
        #[source]
        source: StoreError,
    },
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),
}
