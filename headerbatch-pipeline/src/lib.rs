//! Header batching pipeline.
//!
//! Headers arrive one at a time from a [`HeaderSource`]. Their digests are
//! buffered by a [`BatchAccumulator`]; every full batch becomes a
//! [`MerkleTree`], which is stored only if the [`TreeVerificationGate`]
//! proves every leaf against the tree's own root. Ingestion stops once the
//! [`TreeStore`] holds `trees_limit` trees.

pub mod accumulator;
pub mod config;
mod error;
pub mod gate;
pub mod header;
pub mod ingest;
pub mod source;
pub mod store;

pub use accumulator::{AccumulatorError, BatchAccumulator};
pub use config::{ConfigError, PipelineConfig, StoreFailurePolicy};
pub use error::PipelineError;
pub use gate::{GateFailure, GateVerdict, TreeVerificationGate};
pub use header::BlockHeader;
pub use headerbatch_merkle_tree::{
    DigestKind, Hash, MerkleTree, MerkleTreeError, Proof, ProofStep, SiblingPosition,
};
pub use ingest::{
    BatchEntry, Effect, IngestError, IngestState, Ingestor, PipelineReport, run_pipeline,
};
pub use source::{HeaderSource, HeaderSubscription, MemHeaderSource, SourceError};
pub use store::{FileTreeStore, MemTreeStore, StoreError, StoredTree, TreeStore};
