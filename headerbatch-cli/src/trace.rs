use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::Level;

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over
/// `level`.
pub fn start_tracing(level: Level) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::from(level).into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}
