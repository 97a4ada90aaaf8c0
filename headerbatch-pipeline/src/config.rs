//! Run configuration, fixed at startup.

use std::num::NonZeroUsize;

use headerbatch_merkle_tree::DigestKind;
use thiserror::Error;

/// Default number of headers per tree.
pub const DEFAULT_BATCH_SIZE: usize = 2;
/// Default number of accepted trees after which ingestion stops.
pub const DEFAULT_TREES_LIMIT: usize = 4;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("trees limit must be at least 1")]
    ZeroTreesLimit,
}

/// What to do when appending an accepted tree to the store fails.
///
/// Every policy ends in an error if the append never succeeds; an accepted
/// tree is not dropped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFailurePolicy {
    /// Stop ingestion on the first failed append.
    #[default]
    Halt,
    /// Retry the append up to `attempts` more times, then stop.
    Retry { attempts: u32 },
}

impl StoreFailurePolicy {
    /// Total number of append attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        match self {
            StoreFailurePolicy::Halt => 1,
            StoreFailurePolicy::Retry { attempts } => attempts.saturating_add(1),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Headers per tree.
    pub batch_size: NonZeroUsize,
    /// Accepted trees after which ingestion stops.
    pub trees_limit: NonZeroUsize,
    /// Digest used for leaves and tree nodes.
    pub digest: DigestKind,
    /// Behaviour on store append failure.
    pub store_failure: StoreFailurePolicy,
}

impl PipelineConfig {
    /// Validate and build a configuration.
    pub fn new(
        batch_size: usize,
        trees_limit: usize,
        digest: DigestKind,
    ) -> Result<Self, ConfigError> {
        let batch_size = NonZeroUsize::new(batch_size).ok_or(ConfigError::ZeroBatchSize)?;
        let trees_limit = NonZeroUsize::new(trees_limit).ok_or(ConfigError::ZeroTreesLimit)?;
        Ok(Self {
            batch_size,
            trees_limit,
            digest,
            store_failure: StoreFailurePolicy::default(),
        })
    }

    /// Replace the store failure policy.
    pub fn with_store_failure(mut self, policy: StoreFailurePolicy) -> Self {
        self.store_failure = policy;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            trees_limit: NonZeroUsize::new(DEFAULT_TREES_LIMIT).unwrap_or(NonZeroUsize::MIN),
            digest: DigestKind::Sha256,
            store_failure: StoreFailurePolicy::Halt,
        }
    }
}
