use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use headerbatch_pipeline::{
    DigestKind, PipelineConfig, StoreFailurePolicy,
    config::{DEFAULT_BATCH_SIZE, DEFAULT_TREES_LIMIT},
};
use tracing_subscriber::filter::LevelFilter;

/// Batch block headers into self-verified Merkle trees.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Headers per tree.
    #[clap(long, env = "HEADERBATCH_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Stop once the store holds this many trees.
    #[clap(long, env = "HEADERBATCH_TREES_LIMIT", default_value_t = DEFAULT_TREES_LIMIT)]
    pub trees_limit: usize,

    /// Digest for leaves and tree nodes: sha256 or blake3.
    #[clap(long, env = "HEADERBATCH_DIGEST", default_value_t = DigestKind::Sha256)]
    pub digest: DigestKind,

    /// Extra attempts for a failed store append. 0 halts on the first
    /// failure.
    #[clap(long, env = "HEADERBATCH_STORE_RETRIES", default_value_t = 0)]
    pub store_retries: u32,

    /// Newline-delimited JSON headers to replay.
    #[clap(long, env = "HEADERBATCH_HEADERS", conflicts_with = "synthetic")]
    pub headers: Option<PathBuf>,

    /// Generate this many synthetic headers instead of reading a file.
    #[clap(long, env = "HEADERBATCH_SYNTHETIC", default_value_t = 16)]
    pub synthetic: usize,

    /// Delay between delivered headers, in milliseconds.
    #[clap(long, env = "HEADERBATCH_INTERVAL_MS", default_value_t = 0)]
    pub interval_ms: u64,

    /// File to persist accepted trees in. Trees are kept in memory when
    /// omitted.
    #[clap(long, env = "HEADERBATCH_STORE")]
    pub store: Option<PathBuf>,

    /// Log level, overridden by `RUST_LOG` when set.
    #[clap(long, env = "HEADERBATCH_LOG_LEVEL", value_enum, default_value_t = Level::Info)]
    pub log_level: Level,
}

impl Cli {
    /// The pipeline configuration these flags describe.
    pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let policy = match self.store_retries {
            0 => StoreFailurePolicy::Halt,
            attempts => StoreFailurePolicy::Retry { attempts },
        };
        Ok(PipelineConfig::new(self.batch_size, self.trees_limit, self.digest)?
            .with_store_failure(policy))
    }
}

/// Logging level.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Level {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> LevelFilter {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = Cli::try_parse_from(["headerbatch"]).expect("parse");
        let config = cli.pipeline_config().expect("config");
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(cli.log_level, Level::Info);
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "headerbatch",
            "--batch-size",
            "4",
            "--trees-limit",
            "3",
            "--digest",
            "blake3",
            "--store-retries",
            "2",
            "--log-level",
            "debug",
        ])
        .expect("parse");
        let config = cli.pipeline_config().expect("config");
        assert_eq!(config.batch_size.get(), 4);
        assert_eq!(config.trees_limit.get(), 3);
        assert_eq!(config.digest, DigestKind::Blake3);
        assert_eq!(config.store_failure, StoreFailurePolicy::Retry { attempts: 2 });
        assert_eq!(LevelFilter::from(cli.log_level), LevelFilter::DEBUG);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let cli = Cli::try_parse_from(["headerbatch", "--batch-size", "0"]).expect("parse");
        assert!(cli.pipeline_config().is_err());
    }
}
