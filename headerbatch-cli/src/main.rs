//! `headerbatch` replays headers through the batching pipeline and prints
//! the roots of the stored trees.

mod cli;
mod trace;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use headerbatch_pipeline::{
    FileTreeStore, MemHeaderSource, MemTreeStore, StoredTree, TreeStore, run_pipeline,
};
use tracing::info;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    trace::start_tracing(args.log_level)?;

    let config = args.pipeline_config()?;

    let mut source = match &args.headers {
        Some(path) => MemHeaderSource::open(path)
            .with_context(|| format!("reading headers from {}", path.display()))?,
        None => MemHeaderSource::synthetic(1, args.synthetic),
    };
    if args.interval_ms > 0 {
        source = source.with_interval(Duration::from_millis(args.interval_ms));
    }
    info!(headers = source.headers().len(), "header source ready");

    let trees = match &args.store {
        Some(path) => {
            let mut store = FileTreeStore::open(path)
                .with_context(|| format!("opening tree store {}", path.display()))?;
            run_pipeline(config, &source, &mut store).await?;
            store.list()?
        }
        None => {
            let mut store = MemTreeStore::new();
            run_pipeline(config, &source, &mut store).await?;
            store.list()?
        }
    };

    print_trees(&trees);
    Ok(())
}

fn print_trees(trees: &[StoredTree]) {
    for tree in trees {
        println!(
            "#{} blocks {}..={} {} {} leaves={}",
            tree.batch_index,
            tree.first_number,
            tree.last_number,
            tree.digest,
            tree.root_hex(),
            tree.leaves.len(),
        );
        for leaf in &tree.leaves {
            println!("    0x{}", hex::encode(leaf));
        }
    }
}
