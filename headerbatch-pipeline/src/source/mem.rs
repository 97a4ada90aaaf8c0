use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    time::Duration,
};

use async_trait::async_trait;
use headerbatch_merkle_tree::{DigestKind, Hash, ZERO_HASH};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::{HeaderSource, HeaderSubscription, SourceError};
use crate::BlockHeader;

/// Channel depth between the feed task and the subscriber.
const FEED_CAPACITY: usize = 16;

/// A scripted header source.
///
/// Every subscription replays the same headers in order, optionally spaced
/// by a fixed delay. Lookups are answered from the same list.
#[derive(Debug, Clone, Default)]
pub struct MemHeaderSource {
    headers: Vec<BlockHeader>,
    interval: Option<Duration>,
    fail_lookups: bool,
}

impl MemHeaderSource {
    pub fn new(headers: Vec<BlockHeader>) -> Self {
        Self {
            headers,
            interval: None,
            fail_lookups: false,
        }
    }

    /// A linked chain of `count` headers starting at block `first_number`.
    /// Field values are derived digests, stable across runs.
    pub fn synthetic(first_number: u64, count: usize) -> Self {
        let kind = DigestKind::Sha256;
        let mut parent_hash = ZERO_HASH;
        let headers = (first_number..)
            .take(count)
            .map(|number| {
                let seed = |tag: &[u8]| -> Hash {
                    let mut input = Vec::with_capacity(tag.len() + 8 + 32);
                    input.extend_from_slice(tag);
                    input.extend_from_slice(&number.to_be_bytes());
                    input.extend_from_slice(&parent_hash);
                    kind.digest(&input)
                };
                let header = BlockHeader {
                    number,
                    hash: seed(b"hash"),
                    parent_hash,
                    state_root: seed(b"state"),
                    extrinsics_root: seed(b"extrinsics"),
                };
                parent_hash = header.hash;
                header
            })
            .collect();
        Self::new(headers)
    }

    /// Parse newline-delimited JSON headers. Blank lines are skipped.
    pub fn from_json_lines<R: BufRead>(reader: R) -> Result<Self, SourceError> {
        let mut headers = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let header = serde_json::from_str(&line).map_err(|source| SourceError::Parse {
                line: index + 1,
                source,
            })?;
            headers.push(header);
        }
        Ok(Self::new(headers))
    }

    /// Load newline-delimited JSON headers from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Self::from_json_lines(BufReader::new(file))
    }

    /// Wait `interval` before delivering each header.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Make every lookup fail, to exercise lookup error handling.
    pub fn with_failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn headers(&self) -> &[BlockHeader] {
        &self.headers
    }
}

#[async_trait]
impl HeaderSource for MemHeaderSource {
    async fn subscribe(&self) -> Result<HeaderSubscription, SourceError> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let cancel = CancellationToken::new();
        let headers = self.headers.clone();
        let interval = self.interval;
        let token = cancel.clone();

        tokio::spawn(async move {
            for header in headers {
                if let Some(interval) = interval {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
                trace!(number = header.number, "delivering header");
                tokio::select! {
                    _ = token.cancelled() => return,
                    sent = tx.send(header) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(HeaderSubscription::new(rx, cancel))
    }

    async fn block_hash(&self, number: u64) -> Result<Hash, SourceError> {
        if self.fail_lookups {
            return Err(SourceError::LookupFailed(format!(
                "block hash for #{} unavailable",
                number
            )));
        }
        self.headers
            .iter()
            .find(|h| h.number == number)
            .map(|h| h.hash)
            .ok_or(SourceError::UnknownNumber(number))
    }

    async fn header(&self, hash: &Hash) -> Result<BlockHeader, SourceError> {
        if self.fail_lookups {
            return Err(SourceError::LookupFailed(format!(
                "header 0x{} unavailable",
                hex::encode(hash)
            )));
        }
        self.headers
            .iter()
            .find(|h| &h.hash == hash)
            .cloned()
            .ok_or(SourceError::UnknownHash(*hash))
    }
}
