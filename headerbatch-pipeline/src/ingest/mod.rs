//! Per-header state machine.
//!
//! [`Ingestor::on_header`] is the whole transition for one header: push its
//! leaf, and when the batch is full build the tree, gate it, and return the
//! effects for the driver to apply. It performs no I/O, so it can be driven
//! by any delivery mechanism. [`run_pipeline`] drives it from a
//! [`HeaderSource`](crate::HeaderSource) into a [`TreeStore`](crate::TreeStore).

mod driver;


use headerbatch_merkle_tree::{Hash, MerkleTree, MerkleTreeError};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use driver::{PipelineReport, run_pipeline};

use crate::{
    AccumulatorError, BatchAccumulator, BlockHeader, GateFailure, GateVerdict, PipelineConfig,
    StoredTree, TreeVerificationGate,
};

/// Errors from the ingest state machine.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Accumulator(#[from] AccumulatorError),
    #[error("tree construction failed: {0}")]
    Tree(#[from] MerkleTreeError),
}

/// Ingestion state between headers.
///
/// Building and verifying happens inside a single
/// [`on_header`](Ingestor::on_header) call, so it is never observed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Accumulating,
    Stopped,
}

/// One buffered header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub number: u64,
    pub hash: Hash,
    pub leaf: Hash,
}

/// Work the driver must carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append this accepted tree to the store.
    Persist(StoredTree),
    /// The tree failed the gate and must not be stored.
    Discard {
        tree: StoredTree,
        failure: GateFailure,
    },
    /// Look up the header that completed the batch.
    Lookup { number: u64 },
}

/// Batching state machine.
#[derive(Debug)]
pub struct Ingestor {
    config: PipelineConfig,
    accumulator: BatchAccumulator<BatchEntry>,
    state: IngestState,
    batches_built: u64,
    headers_seen: u64,
}

impl Ingestor {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            accumulator: BatchAccumulator::new(config.batch_size),
            config,
            state: IngestState::Accumulating,
            batches_built: 0,
            headers_seen: 0,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == IngestState::Stopped
    }

    /// Headers buffered towards the next batch.
    pub fn pending(&self) -> usize {
        self.accumulator.len()
    }

    /// Batches built so far, accepted or not.
    pub fn batches_built(&self) -> u64 {
        self.batches_built
    }

    /// Headers taken in while accumulating.
    pub fn headers_seen(&self) -> u64 {
        self.headers_seen
    }

    /// Handle one header. Returns no effects once stopped.
    pub fn on_header(&mut self, header: &BlockHeader) -> Result<Vec<Effect>, IngestError> {
        if self.is_stopped() {
            debug!(number = header.number, "ignoring header after stop");
            return Ok(Vec::new());
        }

        info!(number = header.number, hash = %header.hash_hex(), "new header");
        self.headers_seen += 1;
        self.accumulator.push(BatchEntry {
            number: header.number,
            hash: header.hash,
            leaf: header.leaf(self.config.digest),
        })?;

        if !self.accumulator.is_full() {
            return Ok(Vec::new());
        }

        let entries = self.accumulator.drain();
        let leaves: Vec<Hash> = entries.iter().map(|e| e.leaf).collect();
        let tree = MerkleTree::build(leaves, self.config.digest)?;
        Ok(vec![
            self.seal_batch(&entries, &tree),
            Effect::Lookup {
                number: header.number,
            },
        ])
    }

    /// Gate a built tree and turn the verdict into a persist or discard
    /// effect.
    pub(crate) fn seal_batch(&mut self, entries: &[BatchEntry], tree: &MerkleTree) -> Effect {
        let batch_index = self.batches_built;
        self.batches_built += 1;

        let first_number = entries.first().map_or(0, |e| e.number);
        let last_number = entries.last().map_or(0, |e| e.number);
        let leaves: Vec<Hash> = entries.iter().map(|e| e.leaf).collect();
        let stored = StoredTree::from_tree(batch_index, first_number, last_number, tree);

        match TreeVerificationGate::check(tree, &leaves) {
            GateVerdict::Accepted => {
                debug!(
                    batch_index,
                    root = %stored.root_hex(),
                    leaves = leaves.len(),
                    "all leaf proofs verified"
                );
                Effect::Persist(stored)
            }
            GateVerdict::Rejected(failure) => {
                warn!(
                    batch_index,
                    first_number,
                    last_number,
                    root = %stored.root_hex(),
                    ?failure,
                    "bad leaves detected, discarding tree"
                );
                Effect::Discard {
                    tree: stored,
                    failure,
                }
            }
        }
    }

    /// Record the store size after the current header's effects. Moves to
    /// [`IngestState::Stopped`] once it reaches `trees_limit`; returns
    /// whether ingestion is stopped.
    pub fn observe_store_size(&mut self, size: usize) -> bool {
        if self.state == IngestState::Accumulating && size >= self.config.trees_limit.get() {
            info!(
                trees = size,
                limit = self.config.trees_limit.get(),
                "tree limit reached, stopping ingestion"
            );
            self.state = IngestState::Stopped;
        }
        self.is_stopped()
    }
}
