use tracing::{debug, error, info, warn};

use super::{Effect, Ingestor};
use crate::{HeaderSource, PipelineConfig, PipelineError, StoredTree, TreeStore};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Headers taken in before the stop.
    pub headers_seen: u64,
    /// Batches turned into trees.
    pub batches_built: u64,
    /// Trees that passed the gate and were stored.
    pub trees_accepted: u64,
    /// Trees that failed the gate and were discarded.
    pub trees_rejected: u64,
    /// Post-batch header lookups that failed.
    pub lookups_failed: u64,
    /// Store size when the run ended.
    pub store_size: usize,
    /// Whether ingestion stopped on the tree limit rather than because the
    /// feed ended.
    pub stopped: bool,
}

/// Subscribe to `source` and batch headers into `store` until it holds
/// `trees_limit` trees or the feed ends.
///
/// A store already at the limit stops the run before subscribing. Rejected
/// trees and failed lookups are logged and counted; a store append that
/// fails under the configured policy ends the run with an error.
pub async fn run_pipeline<S, T>(
    config: PipelineConfig,
    source: &S,
    store: &mut T,
) -> Result<PipelineReport, PipelineError>
where
    S: HeaderSource + ?Sized,
    T: TreeStore,
{
    let mut ingestor = Ingestor::new(config);
    let mut report = PipelineReport::default();

    if ingestor.observe_store_size(store.size()) {
        report.store_size = store.size();
        report.stopped = true;
        return Ok(report);
    }

    let mut subscription = source.subscribe().await.map_err(PipelineError::Subscribe)?;
    info!(
        batch_size = config.batch_size.get(),
        trees_limit = config.trees_limit.get(),
        digest = %config.digest,
        "subscribed to new heads"
    );

    while let Some(header) = subscription.next().await {
        let effects = ingestor.on_header(&header)?;
        for effect in effects {
            if let Err(e) = apply_effect(&config, effect, source, store, &mut report).await {
                subscription.unsubscribe();
                return Err(e);
            }
        }
        if ingestor.observe_store_size(store.size()) {
            subscription.unsubscribe();
            break;
        }
    }

    if !ingestor.is_stopped() {
        debug!(pending = ingestor.pending(), "header feed ended before the tree limit");
    }

    report.headers_seen = ingestor.headers_seen();
    report.batches_built = ingestor.batches_built();
    report.store_size = store.size();
    report.stopped = ingestor.is_stopped();
    info!(
        headers = report.headers_seen,
        accepted = report.trees_accepted,
        rejected = report.trees_rejected,
        stored = report.store_size,
        "pipeline finished"
    );
    Ok(report)
}

/// Carry out one effect against the source and store.
pub(crate) async fn apply_effect<S, T>(
    config: &PipelineConfig,
    effect: Effect,
    source: &S,
    store: &mut T,
    report: &mut PipelineReport,
) -> Result<(), PipelineError>
where
    S: HeaderSource + ?Sized,
    T: TreeStore,
{
    match effect {
        Effect::Persist(tree) => {
            persist(config, tree, store)?;
            report.trees_accepted += 1;
        }
        Effect::Discard { tree, failure } => {
            debug!(batch_index = tree.batch_index, ?failure, "tree discarded");
            report.trees_rejected += 1;
        }
        Effect::Lookup { number } => {
            match source.header_by_number_or_hash(Some(number), None).await {
                Ok(header) => info!(
                    number = header.number,
                    hash = %header.hash_hex(),
                    parent = %hex::encode(header.parent_hash),
                    "retrieved header"
                ),
                Err(e) => {
                    warn!(number, error = %e, "header lookup failed");
                    report.lookups_failed += 1;
                }
            }
        }
    }
    Ok(())
}

fn persist<T: TreeStore>(
    config: &PipelineConfig,
    tree: StoredTree,
    store: &mut T,
) -> Result<(), PipelineError> {
    let max_attempts = config.store_failure.max_attempts();
    let batch_index = tree.batch_index;
    let mut attempt = 1;
    loop {
        match store.append(tree.clone()) {
            Ok(()) => {
                info!(
                    batch_index,
                    root = %tree.root_hex(),
                    trees = store.size(),
                    "stored tree"
                );
                return Ok(());
            }
            Err(source) if attempt >= max_attempts => {
                error!(batch_index, attempt, error = %source, "giving up on storing tree");
                return Err(PipelineError::StoreFailure {
                    batch_index,
                    source,
                });
            }
            Err(e) => {
                warn!(batch_index, attempt, error = %e, "store append failed, retrying");
                attempt += 1;
            }
        }
    }
}
