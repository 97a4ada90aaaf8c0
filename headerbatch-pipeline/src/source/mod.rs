//! Header feed and point lookups.
//!
//! The chain client itself lives outside this crate; [`HeaderSource`] is
//! the boundary it implements. [`MemHeaderSource`] is a scripted source used
//! for tests and for replaying recorded headers.

mod mem;


use async_trait::async_trait;
use headerbatch_merkle_tree::Hash;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use mem::MemHeaderSource;

use crate::BlockHeader;

/// Errors from a header source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("header lookup needs a block number or a block hash")]
    MissingQuery,
    #[error("no block hash for block #{0}")]
    UnknownNumber(u64),
    #[error("no header for hash 0x{}", hex::encode(.0))]
    UnknownHash(Hash),
    #[error("header lookup failed: {0}")]
    LookupFailed(String),
    #[error("header feed closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed header on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A live header subscription.
///
/// Headers arrive in increasing block order. Dropping or unsubscribing
/// cancels the producer; headers already buffered are not recalled but
/// [`next`](Self::next) stops yielding them.
#[derive(Debug)]
pub struct HeaderSubscription {
    headers: mpsc::Receiver<BlockHeader>,
    cancel: CancellationToken,
}

impl HeaderSubscription {
    /// Wrap a receiving channel and the token its producer watches.
    pub fn new(headers: mpsc::Receiver<BlockHeader>, cancel: CancellationToken) -> Self {
        Self { headers, cancel }
    }

    /// Wait for the next header. `None` once the feed ends or the
    /// subscription is cancelled.
    pub async fn next(&mut self) -> Option<BlockHeader> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            header = self.headers.recv() => header,
        }
    }

    /// Stop delivery. Idempotent.
    pub fn unsubscribe(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!("unsubscribing from header feed");
        }
        self.cancel.cancel();
        self.headers.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for HeaderSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Supplier of block headers.
#[async_trait]
pub trait HeaderSource: Send + Sync {
    /// Start a new-head subscription.
    async fn subscribe(&self) -> Result<HeaderSubscription, SourceError>;

    /// Resolve a block number to its hash.
    async fn block_hash(&self, number: u64) -> Result<Hash, SourceError>;

    /// Fetch a header by hash.
    async fn header(&self, hash: &Hash) -> Result<BlockHeader, SourceError>;

    /// Fetch a header by hash, or by number when no hash is given (the
    /// number is resolved to a hash first).
    async fn header_by_number_or_hash(
        &self,
        number: Option<u64>,
        hash: Option<Hash>,
    ) -> Result<BlockHeader, SourceError> {
        let hash = match (hash, number) {
            (Some(hash), _) => hash,
            (None, Some(number)) => {
                debug!(number, "getting the block hash");
                self.block_hash(number).await?
            }
            (None, None) => return Err(SourceError::MissingQuery),
        };
        debug!(hash = %hex::encode(hash), "retrieving the header");
        self.header(&hash).await
    }
}
